//! Output formatting for evaluation batches
//!
//! This module provides:
//! - Text output for human-readable display
//! - JSON output for machine processing

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::{TextFormatter, VersionChangeType};

use crate::domain::{DependencyReport, Outcome};
use std::io::{IsTerminal, Write};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Only dependencies with updates
    Quiet,
    #[default]
    Normal,
    /// Also requirement changes and dependencies without updates
    Verbose,
}

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbosity: Verbosity,
    /// Whether to use colors (when supported)
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            verbosity: Verbosity::default(),
            color: true,
        }
    }
}

impl OutputConfig {
    /// Create configuration from CLI arguments; colors only on a terminal
    pub fn from_cli(json: bool, verbose: bool, quiet: bool) -> Self {
        let format = if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };

        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Self {
            format,
            verbosity,
            color: std::io::stdout().is_terminal(),
        }
    }
}

/// Counts over a batch of reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct BatchSummary {
    /// Dependencies with at least one update
    pub updated: usize,
    /// Decided, but nothing to change
    pub up_to_date: usize,
    pub no_update: usize,
    pub undetermined: usize,
}

impl BatchSummary {
    pub fn from_reports(reports: &[DependencyReport]) -> Self {
        reports
            .iter()
            .fold(Self::default(), |mut summary, report| {
                match &report.outcome {
                    Outcome::Decided { decision } if decision.has_updates() => {
                        summary.updated += 1
                    }
                    Outcome::Decided { .. } => summary.up_to_date += 1,
                    Outcome::NoUpdate { .. } => summary.no_update += 1,
                    Outcome::Undetermined { .. } => summary.undetermined += 1,
                }
                summary
            })
    }

    pub fn total(&self) -> usize {
        self.updated + self.up_to_date + self.no_update + self.undetermined
    }
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format and write a batch of reports
    fn format(&self, reports: &[DependencyReport], writer: &mut dyn Write) -> std::io::Result<()>;

    /// Format and write just the summary
    fn format_summary(&self, summary: &BatchSummary, writer: &mut dyn Write) -> std::io::Result<()>;
}

/// Create an output formatter based on configuration
pub fn create_formatter(config: OutputConfig) -> Box<dyn OutputFormatter> {
    match config.format {
        OutputFormat::Text => Box::new(TextFormatter::with_color(config.verbosity, config.color)),
        OutputFormat::Json => Box::new(JsonFormatter::new(config.verbosity)),
    }
}
