//! JSON output formatter for machine processing

use crate::domain::{Dependency, DependencyReport, Outcome, PackageManager};
use crate::output::{BatchSummary, OutputFormatter, Verbosity};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbose output embeds the evaluated dependency in each report
    verbosity: Verbosity,
}

impl JsonFormatter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    fn report_to_json<'a>(&self, report: &'a DependencyReport) -> JsonReport<'a> {
        JsonReport {
            name: &report.dependency.name,
            package_manager: &report.dependency.package_manager,
            outcome: &report.outcome,
            dependency: (self.verbosity == Verbosity::Verbose).then_some(&report.dependency),
        }
    }

    fn write_json<T: Serialize>(value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
        writeln!(writer, "{}", json)
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    summary: BatchSummary,
    reports: Vec<JsonReport<'a>>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    name: &'a str,
    package_manager: &'a PackageManager,
    #[serde(flatten)]
    outcome: &'a Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    dependency: Option<&'a Dependency>,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, reports: &[DependencyReport], writer: &mut dyn Write) -> std::io::Result<()> {
        let output = JsonOutput {
            summary: BatchSummary::from_reports(reports),
            reports: reports.iter().map(|r| self.report_to_json(r)).collect(),
        };
        Self::write_json(&output, writer)
    }

    fn format_summary(&self, summary: &BatchSummary, writer: &mut dyn Write) -> std::io::Result<()> {
        Self::write_json(summary, writer)
    }
}
