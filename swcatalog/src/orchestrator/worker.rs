//! Running the pipeline on a dedicated thread.

use std::io;
use std::thread::{self, JoinHandle};

use tracing::error;

use super::{ReplicationOrchestrator, RunError, RunOutcome};
use crate::context::RunContext;

/// Name of the worker thread.
const WORKER_THREAD_NAME: &str = "swcatalog-worker";

/// Run `orchestrator` on its own thread.
///
/// Errors are sent as a fatal-error event before the thread returns. The
/// context (and with it the event sender) is dropped when the thread ends,
/// which closes the channel for the consumer.
pub fn spawn_worker(
    ctx: RunContext,
    orchestrator: ReplicationOrchestrator,
) -> io::Result<JoinHandle<Result<RunOutcome, RunError>>> {
    thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || {
            let result = orchestrator.run(&ctx);
            if let Err(ref e) = result {
                error!(kind = %e.kind(), "{}", e);
                ctx.fatal_error(e.to_string());
            }
            result
        })
}
