//! Progress reporting for deployment passes

use indicatif::{ProgressBar, ProgressStyle};

/// Receives unit counts and labels while a pass runs
pub trait ProgressSink {
    /// Start a phase with `max` units, resetting the current value
    fn set_max(&mut self, max: usize);

    /// Number of units processed so far in the current phase
    fn set_value(&mut self, value: usize);

    /// Describe what is happening right now
    fn write_label(&mut self, label: &str);
}

/// Progress bar display for deployment passes
pub struct ProgressDisplay {
    bar: ProgressBar,
}

impl ProgressDisplay {
    /// Create a progress bar on the terminal
    pub fn new() -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let bar = ProgressBar::new(0);
        bar.set_style(style);
        Self { bar }
    }

    /// Create a display that draws nothing
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Finish and clear the bar
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressDisplay {
    fn set_max(&mut self, max: usize) {
        self.bar.set_length(max as u64);
        self.bar.set_position(0);
    }

    fn set_value(&mut self, value: usize) {
        self.bar.set_position(value as u64);
    }

    fn write_label(&mut self, label: &str) {
        self.bar.set_message(label.to_string());
    }
}
