//! Progress display for batch evaluation
//!
//! Draws a spinner while releases are fetched and a bar while dependencies
//! are evaluated. Disabled in quiet and JSON modes.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg}";
const BAR_TEMPLATE: &str = "{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len}";

/// Progress reporter for an evaluation batch
pub struct Progress {
    /// Off in quiet and JSON modes
    enabled: bool,
    /// The spinner or bar currently drawn
    bar: Option<ProgressBar>,
}

impl Progress {
    /// Create a progress reporter, drawing only if `enabled`
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    /// Create a reporter that never draws
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Show a spinner for an operation of unknown length
    pub fn spinner(&mut self, message: &str) {
        if !self.enabled {
            return;
        }

        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let spinner = ProgressBar::new_spinner().with_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.bar = Some(spinner);
    }

    /// Start a bar over `total` dependencies
    pub fn start(&mut self, total: u64, message: &str) {
        if !self.enabled || total == 0 {
            return;
        }

        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .map(|style| style.progress_chars("█▓▒░"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        let bar = ProgressBar::new(total).with_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(bar);
    }

    /// Advance the bar by one dependency
    pub fn inc(&self) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    /// Check if a spinner or bar is being drawn
    pub fn is_active(&self) -> bool {
        self.bar.is_some()
    }

    /// Finish and remove the current spinner or bar
    pub fn finish_and_clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(true)
    }
}
