//! Two-bar terminal display for run events.

use std::time::Duration;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use swcatalog::events::{EventSink, RunEvent};
use swcatalog::progress::{ProgressState, PROGRESS_MAX};

/// Bar positions per progress unit; keeps fractional percents visible.
const BAR_SCALE: f64 = 100.0;

const BAR_TEMPLATE: &str = "{prefix:>8.bold} [{bar:40.cyan/blue}] {percent:>3}% {wide_msg}";
const SPINNER_TEMPLATE: &str = "{prefix:>8.bold} {spinner:.cyan} {wide_msg}";

/// Renders the overall and stage bars with `indicatif`.
pub struct ConsoleSink {
    multi: MultiProgress,
    overall: ProgressBar,
    stage: ProgressBar,
    state: ProgressState,
}

impl ConsoleSink {
    /// Draw to stderr (hidden automatically when it is not a terminal).
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Draw to `target`.
    pub fn with_target(target: ProgressDrawTarget) -> Self {
        let multi = MultiProgress::with_draw_target(target);
        let length = (PROGRESS_MAX * BAR_SCALE) as u64;

        let overall = multi.add(ProgressBar::new(length));
        overall.set_style(bar_style());
        overall.set_prefix("Overall");

        let stage = multi.add(ProgressBar::new(length));
        stage.set_style(bar_style());
        stage.set_prefix("Stage");

        Self {
            multi,
            overall,
            stage,
            state: ProgressState::new(),
        }
    }

    /// Current accumulated progress.
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Leave both bars at their final state.
    pub fn finish(&self) {
        self.stage.finish_and_clear();
        self.overall.finish();
    }

    /// Stop drawing after a failure, keeping the last messages visible.
    pub fn abandon(&self) {
        self.stage.abandon();
        self.overall.abandon();
    }

    fn sync_positions(&self) {
        self.overall
            .set_position((self.state.overall() * BAR_SCALE).round() as u64);
        self.stage
            .set_position((self.state.stage() * BAR_SCALE).round() as u64);
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for ConsoleSink {
    fn handle(&mut self, event: RunEvent) {
        event.apply(&mut self.state);

        match event {
            RunEvent::OverallText(text) => self.overall.set_message(text),
            RunEvent::StageText(text) => self.stage.set_message(text),
            RunEvent::VersionText(text) => {
                // Printing only fails when the terminal is gone.
                let _ = self
                    .multi
                    .println(format!("{} {}", style("Selected").green().bold(), text));
            }
            RunEvent::FatalError(message) => {
                self.overall
                    .set_message(format!("{} {}", style("Error:").red().bold(), message));
            }
            RunEvent::ShowIndeterminate => {
                self.stage.set_style(spinner_style());
                self.stage.enable_steady_tick(Duration::from_millis(100));
            }
            RunEvent::ResetStageProgress => {
                self.stage.disable_steady_tick();
                self.stage.set_style(bar_style());
            }
            RunEvent::OverallProgress(_) | RunEvent::StageProgress(_) => {}
        }

        self.sync_positions();
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(SPINNER_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden() -> ConsoleSink {
        ConsoleSink::with_target(ProgressDrawTarget::hidden())
    }

    #[test]
    fn test_bars_follow_events() {
        let mut sink = hidden();
        sink.handle(RunEvent::OverallProgress(2.0));
        sink.handle(RunEvent::StageProgress(50.0));
        sink.handle(RunEvent::StageText("Downloading x.pkg".to_string()));

        assert_eq!(sink.overall.position(), 200);
        assert_eq!(sink.stage.position(), 5000);
        assert_eq!(sink.stage.message(), "Downloading x.pkg");

        sink.handle(RunEvent::ResetStageProgress);
        assert_eq!(sink.stage.position(), 0);
        assert!((sink.state().overall() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut sink = hidden();
        sink.handle(RunEvent::OverallProgress(150.0));
        assert_eq!(sink.overall.position(), (PROGRESS_MAX * BAR_SCALE) as u64);
    }

    #[test]
    fn test_fatal_error_shown_on_overall_bar() {
        let mut sink = hidden();
        sink.handle(RunEvent::FatalError("unable to find target version: 10.16".to_string()));
        assert!(sink.overall.message().contains("unable to find target version: 10.16"));
    }
}
