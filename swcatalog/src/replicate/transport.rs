//! HTTP transport used by the replicator.
//!
//! The [`Transport`] trait is the seam between replication logic and the
//! network, so the replicator can be driven by an in-memory double in tests.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;

use super::error::ReplicationError;

/// An open response ready to be streamed.
pub struct TransportResponse {
    /// Declared body length, when the server sent one.
    pub content_length: Option<u64>,
    /// Response body.
    pub body: Box<dyn Read + Send>,
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Performs GET requests.
pub trait Transport: Send + Sync {
    /// Send a GET request; non-success statuses are errors.
    fn get(&self, url: &str) -> Result<TransportResponse, ReplicationError>;
}

/// Blocking reqwest transport.
///
/// Sends the configured User-Agent on every request. No request timeout is
/// set: large installer payloads can take a long time, so stalls are left to
/// the TCP stack.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport sending `user_agent`.
    pub fn new(user_agent: &str) -> Result<Self, ReplicationError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| ReplicationError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<TransportResponse, ReplicationError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ReplicationError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReplicationError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(TransportResponse {
            content_length: response.content_length(),
            body: Box::new(response),
        })
    }
}
