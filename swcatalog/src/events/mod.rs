//! One-directional event channel from the worker to the progress sink.
//!
//! The worker never waits on the consumer: every notification is a
//! [`RunEvent`] pushed onto an unbounded `std::sync::mpsc` channel. The
//! consuming side (terminal UI, log sink, tests) drains the channel at a fixed
//! interval with [`drain_events`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use swcatalog::events::{drain_events, event_channel, RecordingSink, RunEvent};
//!
//! let (sender, receiver) = event_channel();
//! sender.send(RunEvent::OverallText("Parsing list...".to_string()));
//! drop(sender);
//!
//! let mut sink = RecordingSink::default();
//! drain_events(&receiver, &mut sink, Duration::from_millis(1));
//! assert_eq!(sink.events.len(), 1);
//! ```

mod drain;

pub use drain::{drain_events, drain_pending, DrainStatus, DEFAULT_POLL_INTERVAL};

use std::sync::mpsc::{self, Receiver, Sender};

use crate::progress::ProgressState;

/// Everything the worker can tell the sink.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// Replace the overall status line.
    OverallText(String),
    /// Replace the stage status line.
    StageText(String),
    /// Add a delta to the overall bar.
    OverallProgress(f64),
    /// Add a delta to the stage bar.
    StageProgress(f64),
    /// Zero the stage bar.
    ResetStageProgress,
    /// Show the resolved product label.
    VersionText(String),
    /// The run cannot continue; show the message.
    FatalError(String),
    /// Switch to an indeterminate indicator.
    ShowIndeterminate,
}

impl RunEvent {
    /// Apply the progress part of this event to `state`.
    ///
    /// Text events leave the state untouched.
    pub fn apply(&self, state: &mut ProgressState) {
        match self {
            RunEvent::OverallProgress(delta) => state.add_overall(*delta),
            RunEvent::StageProgress(delta) => state.add_stage(*delta),
            RunEvent::ResetStageProgress => state.reset_stage(),
            _ => {}
        }
    }
}

/// Consumer of run events.
pub trait EventSink {
    /// Handle one event, in the order it was sent.
    fn handle(&mut self, event: RunEvent);
}

/// Sending half of the event channel.
///
/// Cloneable; every clone feeds the same consumer.
#[derive(Debug, Clone)]
pub struct EventSender {
    inner: Sender<RunEvent>,
}

impl EventSender {
    /// Enqueue an event.
    ///
    /// A consumer that has gone away is not an error for the worker; the
    /// event is dropped.
    pub fn send(&self, event: RunEvent) {
        if self.inner.send(event).is_err() {
            tracing::trace!("Event receiver dropped, discarding event");
        }
    }
}

/// Create a connected sender/receiver pair.
pub fn event_channel() -> (EventSender, Receiver<RunEvent>) {
    let (tx, rx) = mpsc::channel();
    (EventSender { inner: tx }, rx)
}

/// Sink that stores every event, for tests and post-run inspection.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    /// Events in arrival order.
    pub events: Vec<RunEvent>,
}

impl RecordingSink {
    /// Replay all recorded events into a fresh progress state.
    pub fn progress(&self) -> ProgressState {
        let mut state = ProgressState::new();
        for event in &self.events {
            event.apply(&mut state);
        }
        state
    }

    /// Sum of all overall-progress deltas.
    pub fn overall_total(&self) -> f64 {
        self.events
            .iter()
            .filter_map(|e| match e {
                RunEvent::OverallProgress(delta) => Some(*delta),
                _ => None,
            })
            .sum()
    }

    /// The fatal error message, if one was sent.
    pub fn fatal_error(&self) -> Option<&str> {
        self.events.iter().find_map(|e| match e {
            RunEvent::FatalError(msg) => Some(msg.as_str()),
            _ => None,
        })
    }
}

impl EventSink for RecordingSink {
    fn handle(&mut self, event: RunEvent) {
        self.events.push(event);
    }
}

/// Sink that only writes events to the log.
#[derive(Debug, Default)]
pub struct LogSink {
    state: ProgressState,
}

impl LogSink {
    /// Create a log-only sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress accumulated so far.
    pub fn state(&self) -> ProgressState {
        self.state
    }
}

impl EventSink for LogSink {
    fn handle(&mut self, event: RunEvent) {
        event.apply(&mut self.state);
        match &event {
            RunEvent::VersionText(text) => tracing::info!(version = %text, "Selected product"),
            RunEvent::FatalError(msg) => tracing::error!("{}", msg),
            RunEvent::OverallProgress(_) | RunEvent::StageProgress(_) => {
                tracing::trace!(
                    overall = self.state.overall(),
                    stage = self.state.stage(),
                    "Progress"
                );
            }
            // Status text is already logged by the worker when it is sent.
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_progress_events() {
        let mut state = ProgressState::new();
        RunEvent::StageProgress(30.0).apply(&mut state);
        RunEvent::OverallProgress(5.0).apply(&mut state);
        RunEvent::OverallText("ignored".to_string()).apply(&mut state);

        assert_eq!(state.stage(), 30.0);
        assert_eq!(state.overall(), 5.0);

        RunEvent::ResetStageProgress.apply(&mut state);
        assert_eq!(state.stage(), 0.0);
    }

    #[test]
    fn test_send_after_receiver_dropped_is_silent() {
        let (sender, receiver) = event_channel();
        drop(receiver);
        sender.send(RunEvent::ShowIndeterminate);
    }

    #[test]
    fn test_multiple_producers_share_one_consumer() {
        let (sender, receiver) = event_channel();
        let other = sender.clone();

        sender.send(RunEvent::StageText("a".to_string()));
        other.send(RunEvent::StageText("b".to_string()));

        let received: Vec<_> = receiver.try_iter().collect();
        assert_eq!(received.len(), 2);
    }

    #[test]
    fn test_recording_sink_helpers() {
        let mut sink = RecordingSink::default();
        sink.handle(RunEvent::OverallProgress(2.0));
        sink.handle(RunEvent::OverallProgress(3.5));
        sink.handle(RunEvent::FatalError("boom".to_string()));

        assert_eq!(sink.overall_total(), 5.5);
        assert_eq!(sink.fatal_error(), Some("boom"));
        assert_eq!(sink.progress().overall(), 5.5);
    }
}
