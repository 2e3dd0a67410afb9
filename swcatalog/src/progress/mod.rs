//! Weighted two-level progress math.
//!
//! Progress is tracked on two independent 0..[`PROGRESS_MAX`] scales: the
//! *stage* bar (one logical phase, reset between phases) and the *overall* bar
//! (the whole run). Every emission is a delta; consumers accumulate them with
//! [`ProgressState`].
//!
//! Fixed stage weights split the overall bar between the phases of a run:
//!
//! | phase                        | weight |
//! |------------------------------|--------|
//! | catalog download             | 2%     |
//! | server metadata, per product | 1%     |
//! | distribution, per product    | 2%     |
//! | product packages (all)       | 74%    |

mod throttle;

pub use throttle::{DownloadProgress, ProgressDelta, PROGRESS_SIZE_THRESHOLD, PROGRESS_STEP_FRACTION};

/// Maximum value of both progress bars.
pub const PROGRESS_MAX: f64 = 100.0;

/// Overall weight of fetching one product's server metadata.
pub const METADATA_WEIGHT: f64 = 1.0 / 100.0;

/// Overall weight of fetching the root catalog.
pub const CATALOG_WEIGHT: f64 = 2.0 / 100.0;

/// Overall weight of fetching one product's distribution document.
pub const PRODUCT_INFO_WEIGHT: f64 = 2.0 / 100.0;

/// Overall weight shared by every package of the selected product.
pub const PRODUCT_WEIGHT: f64 = 74.0 / 100.0;

/// Convert a percentage (0-100) into a delta on the progress scale.
pub fn progress_percent(percent: f64) -> f64 {
    percent / 100.0 * PROGRESS_MAX
}

/// Convert a fraction (0.0-1.0) into a delta on the progress scale.
pub fn progress_increment(fraction: f64) -> f64 {
    fraction * PROGRESS_MAX
}

/// Accumulated state of both progress bars.
///
/// Deltas are added and clamped to `[0, PROGRESS_MAX]`, the same way a
/// progress indicator widget saturates at its maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressState {
    stage: f64,
    overall: f64,
}

impl ProgressState {
    /// Create a state with both bars at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stage value.
    pub fn stage(&self) -> f64 {
        self.stage
    }

    /// Current overall value.
    pub fn overall(&self) -> f64 {
        self.overall
    }

    /// Add a delta to the stage bar.
    pub fn add_stage(&mut self, delta: f64) {
        self.stage = clamp(self.stage + delta);
    }

    /// Add a delta to the overall bar.
    pub fn add_overall(&mut self, delta: f64) {
        self.overall = clamp(self.overall + delta);
    }

    /// Reset the stage bar for a new phase.
    pub fn reset_stage(&mut self) {
        self.stage = 0.0;
    }
}

fn clamp(value: f64) -> f64 {
    value.clamp(0.0, PROGRESS_MAX)
}

/// Format a byte count with binary units, e.g. `"4.5 MB"`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

    if bytes == 0 {
        return "0B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
