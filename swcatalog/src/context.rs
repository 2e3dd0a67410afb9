//! Per-run context passed to every component.
//!
//! There are no process-wide singletons: configuration, the event channel and
//! the cancellation flag all live in one [`RunContext`] built by the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::RunConfig;
use crate::events::{EventSender, RunEvent};

/// Configuration, event channel and cancellation flag for one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    config: RunConfig,
    events: EventSender,
    running: Arc<AtomicBool>,
}

impl RunContext {
    /// Create a context in the running state.
    pub fn new(config: RunConfig, events: EventSender) -> Self {
        Self {
            config,
            events,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Share an existing running flag (e.g. one a signal handler clears).
    pub fn with_running_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    /// Run configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Handle to the event channel.
    pub fn events(&self) -> &EventSender {
        &self.events
    }

    /// Clone of the shared running flag.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Whether the run should continue.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request the run to stop at the next phase boundary.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Log and show the overall status line.
    pub fn overall_text(&self, text: impl Into<String>) {
        let text = text.into();
        info!("{}", text);
        self.events.send(RunEvent::OverallText(text));
    }

    /// Log and show the stage status line.
    pub fn stage_text(&self, text: impl Into<String>) {
        let text = text.into();
        debug!("{}", text);
        self.events.send(RunEvent::StageText(text));
    }

    /// Add to the overall bar.
    pub fn overall_progress(&self, delta: f64) {
        self.events.send(RunEvent::OverallProgress(delta));
    }

    /// Add to the stage bar.
    pub fn stage_progress(&self, delta: f64) {
        self.events.send(RunEvent::StageProgress(delta));
    }

    /// Zero the stage bar.
    pub fn reset_stage_progress(&self) {
        self.events.send(RunEvent::ResetStageProgress);
    }

    /// Show the selected product label.
    pub fn version_text(&self, text: impl Into<String>) {
        self.events.send(RunEvent::VersionText(text.into()));
    }

    /// Report a fatal error to the sink.
    pub fn fatal_error(&self, message: impl Into<String>) {
        self.events.send(RunEvent::FatalError(message.into()));
    }

    /// Switch the sink to an indeterminate indicator.
    pub fn show_indeterminate(&self) {
        self.events.send(RunEvent::ShowIndeterminate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::event_channel;

    #[test]
    fn test_helpers_enqueue_events_in_order() {
        let (sender, receiver) = event_channel();
        let ctx = RunContext::new(RunConfig::default(), sender);

        ctx.overall_text("Parsing list...");
        ctx.stage_progress(5.0);
        ctx.reset_stage_progress();
        ctx.fatal_error("boom");

        let events: Vec<_> = receiver.try_iter().collect();
        assert_eq!(
            events,
            vec![
                RunEvent::OverallText("Parsing list...".to_string()),
                RunEvent::StageProgress(5.0),
                RunEvent::ResetStageProgress,
                RunEvent::FatalError("boom".to_string()),
            ]
        );
    }

    #[test]
    fn test_stop_is_visible_through_shared_flag() {
        let (sender, _receiver) = event_channel();
        let flag = Arc::new(AtomicBool::new(true));
        let ctx = RunContext::new(RunConfig::default(), sender).with_running_flag(flag.clone());

        assert!(ctx.is_running());
        flag.store(false, Ordering::SeqCst);
        assert!(!ctx.is_running());

        let clone = ctx.clone();
        flag.store(true, Ordering::SeqCst);
        clone.stop();
        assert!(!ctx.is_running());
    }
}
