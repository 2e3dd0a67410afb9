//! Per-download progress throttling.
//!
//! A download reports progress only once at least [`PROGRESS_STEP_FRACTION`]
//! of its declared size has been written since the previous report, and only
//! when the declared size is at least [`PROGRESS_SIZE_THRESHOLD`]. Smaller or
//! unsized downloads report nothing until [`DownloadProgress::finish`].

use super::{progress_increment, PROGRESS_MAX};

/// Minimum declared size for intermediate progress reports (~5 MB).
pub const PROGRESS_SIZE_THRESHOLD: u64 = 5_000_000;

/// Fraction of the declared size that must accumulate between reports.
pub const PROGRESS_STEP_FRACTION: f64 = 0.01;

/// A pair of deltas to apply to the stage and overall bars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressDelta {
    /// Delta for the stage bar.
    pub stage: f64,
    /// Delta for the overall bar, already scaled by the download weight.
    pub overall: f64,
}

/// Progress bookkeeping for one download.
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    total: Option<u64>,
    weight: f64,
    written: u64,
    since_report: u64,
    stage_emitted: f64,
    overall_emitted: f64,
}

impl DownloadProgress {
    /// Start tracking a download.
    ///
    /// `total` is the declared byte size (`None` when the server sent no
    /// length), `weight` the fraction of overall progress this download owns.
    pub fn new(total: Option<u64>, weight: f64) -> Self {
        Self {
            total,
            weight: weight.max(0.0),
            written: 0,
            since_report: 0,
            stage_emitted: 0.0,
            overall_emitted: 0.0,
        }
    }

    /// Bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Declared total size, if known.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Whether this download emits intermediate progress at all.
    pub fn is_reporting(&self) -> bool {
        matches!(self.total, Some(total) if total >= PROGRESS_SIZE_THRESHOLD)
    }

    /// Record a written chunk; returns the deltas to emit, if a report is due.
    pub fn record(&mut self, bytes: u64) -> Option<ProgressDelta> {
        self.written += bytes;

        let total = match self.total {
            Some(total) if total >= PROGRESS_SIZE_THRESHOLD => total,
            _ => return None,
        };

        self.since_report += bytes;
        if (self.since_report as f64) < PROGRESS_STEP_FRACTION * total as f64 {
            return None;
        }

        let fraction = self.since_report as f64 / total as f64;
        self.since_report = 0;

        // A server that sends more than it declared must not push either bar
        // past this download's share.
        let stage = progress_increment(fraction).min(PROGRESS_MAX - self.stage_emitted);
        let overall = progress_increment(fraction * self.weight).min(self.overall_cap() - self.overall_emitted);

        self.stage_emitted += stage.max(0.0);
        self.overall_emitted += overall.max(0.0);

        Some(ProgressDelta {
            stage: stage.max(0.0),
            overall: overall.max(0.0),
        })
    }

    /// Complete the download: the remaining deltas that bring the stage bar
    /// to exactly [`PROGRESS_MAX`] and the overall contribution to exactly
    /// `weight * PROGRESS_MAX`.
    pub fn finish(&mut self) -> ProgressDelta {
        let stage = (PROGRESS_MAX - self.stage_emitted).max(0.0);
        let overall = (self.overall_cap() - self.overall_emitted).max(0.0);

        self.stage_emitted = PROGRESS_MAX;
        self.overall_emitted = self.overall_cap();
        self.since_report = 0;

        ProgressDelta { stage, overall }
    }

    fn overall_cap(&self) -> f64 {
        progress_increment(self.weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_small_download_reports_only_on_finish() {
        let mut progress = DownloadProgress::new(Some(1_000_000), 0.5);

        for _ in 0..10 {
            assert!(progress.record(100_000).is_none());
        }

        let delta = progress.finish();
        assert_eq!(delta.stage, PROGRESS_MAX);
        assert!((delta.overall - 50.0).abs() < EPSILON);
    }

    #[test]
    fn test_unknown_size_never_reports_fraction() {
        let mut progress = DownloadProgress::new(None, 0.2);

        assert!(progress.record(50_000_000).is_none());
        assert!(!progress.is_reporting());
        assert_eq!(progress.bytes_written(), 50_000_000);

        let delta = progress.finish();
        assert_eq!(delta.stage, PROGRESS_MAX);
        assert!((delta.overall - 20.0).abs() < EPSILON);
    }

    #[test]
    fn test_large_download_reports_each_percent() {
        let total = 10_000_000;
        let mut progress = DownloadProgress::new(Some(total), 1.0);

        // 1% is 100,000 bytes; 60,000 is not enough on its own.
        assert!(progress.record(60_000).is_none());
        let delta = progress.record(60_000).expect("report due");
        assert!((delta.stage - 1.2).abs() < EPSILON);
        assert!((delta.overall - 1.2).abs() < EPSILON);

        // Counter reset after the report.
        assert!(progress.record(60_000).is_none());
    }

    #[test]
    fn test_overall_scaled_by_weight() {
        let mut progress = DownloadProgress::new(Some(10_000_000), 0.25);
        let delta = progress.record(1_000_000).expect("report due");

        assert!((delta.stage - 10.0).abs() < EPSILON);
        assert!((delta.overall - 2.5).abs() < EPSILON);
    }

    #[test]
    fn test_finish_totals_are_exact() {
        let total = 7_000_000u64;
        let mut progress = DownloadProgress::new(Some(total), 0.518);
        let mut stage = 0.0;
        let mut overall = 0.0;

        let mut remaining = total;
        while remaining > 0 {
            let chunk = remaining.min(65_536);
            remaining -= chunk;
            if let Some(delta) = progress.record(chunk) {
                stage += delta.stage;
                overall += delta.overall;
            }
        }
        let last = progress.finish();
        stage += last.stage;
        overall += last.overall;

        assert!((stage - PROGRESS_MAX).abs() < EPSILON);
        assert!((overall - 51.8).abs() < EPSILON);
    }

    #[test]
    fn test_oversized_body_is_capped() {
        let mut progress = DownloadProgress::new(Some(5_000_000), 1.0);
        let mut stage = 0.0;

        for _ in 0..4 {
            if let Some(delta) = progress.record(5_000_000) {
                stage += delta.stage;
            }
        }
        assert!(stage <= PROGRESS_MAX);

        let last = progress.finish();
        assert_eq!(last.stage, 0.0);
    }

    #[test]
    fn test_zero_weight_contributes_nothing_overall() {
        let mut progress = DownloadProgress::new(Some(20_000_000), 0.0);
        let delta = progress.record(2_000_000).expect("report due");
        assert_eq!(delta.overall, 0.0);
        assert_eq!(progress.finish().overall, 0.0);
    }
}
