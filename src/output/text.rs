//! Text output formatter for human-readable display
//!
//! This module provides:
//! - One line per updated dependency with the size of the change
//! - Requirement rewrites and coordinated siblings in verbose mode
//! - Reasons for dependencies that were not updated
//! - A summary of the batch

use crate::domain::{DependencyReport, Outcome, UpdateDecision};
use crate::output::{BatchSummary, OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Size of a version change, judged on the leading numeric components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionChangeType {
    Major,
    Minor,
    Patch,
    Unknown,
}

impl VersionChangeType {
    pub fn from_versions(old: &str, new: &str) -> Self {
        fn leading(version: &str) -> Option<[u64; 3]> {
            let version = version.trim_start_matches(['v', 'V']);
            let mut parts = version
                .split(['.', '-', '+'])
                .map_while(|part| part.parse::<u64>().ok());
            let major = parts.next()?;
            Some([major, parts.next().unwrap_or(0), parts.next().unwrap_or(0)])
        }

        match (leading(old), leading(new)) {
            (Some(old), Some(new)) if old[0] != new[0] => VersionChangeType::Major,
            (Some(old), Some(new)) if old[1] != new[1] => VersionChangeType::Minor,
            (Some(_), Some(_)) => VersionChangeType::Patch,
            _ => VersionChangeType::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VersionChangeType::Major => "major",
            VersionChangeType::Minor => "minor",
            VersionChangeType::Patch => "patch",
            VersionChangeType::Unknown => "?",
        }
    }

    pub fn colored_label(&self) -> String {
        match self {
            VersionChangeType::Major => self.label().red().bold().to_string(),
            VersionChangeType::Minor => self.label().yellow().to_string(),
            VersionChangeType::Patch => self.label().green().to_string(),
            VersionChangeType::Unknown => self.label().dimmed().to_string(),
        }
    }
}

/// Text formatter for human-readable output
pub struct TextFormatter {
    verbosity: Verbosity,
    color: bool,
}

impl TextFormatter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self::with_color(verbosity, true)
    }

    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn name_width(reports: &[DependencyReport]) -> usize {
        reports
            .iter()
            .map(|r| r.dependency.name.len())
            .max()
            .unwrap_or(0)
            .max(20)
    }

    fn format_decision(
        &self,
        decision: &UpdateDecision,
        width: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        for (position, updated) in decision.updated_dependencies.iter().enumerate() {
            let name = &updated.dependency.name;
            let old = updated.previous_version.as_deref().unwrap_or("-");
            let new = updated.dependency.version.as_deref().unwrap_or("-");
            let change = VersionChangeType::from_versions(old, new);
            // siblings moved by a coordinated update are indented under the primary
            let indent = if position == 0 { "  " } else { "    + " };
            let name_width = width.saturating_sub(indent.len() - 2);

            if self.color {
                let mut line = format!(
                    "{}{} {} {} {} [{}]",
                    indent,
                    format!("{:name_width$}", name).bold(),
                    old.dimmed(),
                    "→".dimmed(),
                    new.bright_white().bold(),
                    change.colored_label()
                );
                if position == 0 && decision.vulnerable {
                    line.push_str(&format!(" {}", "security fix".red()));
                }
                writeln!(writer, "{}", line)?;
            } else {
                let security = if position == 0 && decision.vulnerable {
                    " security fix"
                } else {
                    ""
                };
                writeln!(
                    writer,
                    "{}{:name_width$} {} -> {} [{}]{}",
                    indent,
                    name,
                    old,
                    new,
                    change.label(),
                    security
                )?;
            }

            if self.verbosity == Verbosity::Verbose {
                for (before, after) in updated.changed_requirements() {
                    let before_text = before.text().unwrap_or("-");
                    let after_text = after.text().unwrap_or("-");
                    if self.color {
                        writeln!(
                            writer,
                            "      {} {} {} {}",
                            after.file.dimmed(),
                            before_text.red(),
                            "→".dimmed(),
                            after_text.green()
                        )?;
                    } else {
                        writeln!(
                            writer,
                            "      {} {} -> {}",
                            after.file, before_text, after_text
                        )?;
                    }
                }
            }
        }

        if self.verbosity == Verbosity::Verbose {
            if let Some(unlock) = decision.unlock {
                let note = format!("      unlock: {}", unlock);
                if self.color {
                    writeln!(writer, "{}", note.dimmed())?;
                } else {
                    writeln!(writer, "{}", note)?;
                }
            }
        }
        Ok(())
    }

    fn format_reason(
        &self,
        name: &str,
        reason: &str,
        undetermined: bool,
        width: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if self.color {
            let name = format!("{:width$}", name);
            if undetermined {
                writeln!(writer, "  {} {}", name.yellow(), format!("({})", reason).yellow())
            } else {
                writeln!(writer, "  {} {}", name.dimmed(), format!("({})", reason).dimmed())
            }
        } else {
            writeln!(writer, "  {:width$} ({})", name, reason)
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, reports: &[DependencyReport], writer: &mut dyn Write) -> std::io::Result<()> {
        let summary = BatchSummary::from_reports(reports);
        if self.verbosity == Verbosity::Quiet {
            return self.format_summary(&summary, writer);
        }

        let width = Self::name_width(reports);
        for report in reports {
            match &report.outcome {
                Outcome::Decided { decision } if decision.has_updates() => {
                    self.format_decision(decision, width, writer)?;
                }
                Outcome::Decided { .. } => {
                    if self.verbosity == Verbosity::Verbose {
                        self.format_reason(&report.dependency.name, "up to date", false, width, writer)?;
                    }
                }
                Outcome::NoUpdate { reason } => {
                    if self.verbosity == Verbosity::Verbose {
                        self.format_reason(&report.dependency.name, reason, false, width, writer)?;
                    }
                }
                // always shown, the caller should retry these
                Outcome::Undetermined { reason } => {
                    self.format_reason(&report.dependency.name, reason, true, width, writer)?;
                }
            }
        }

        if !reports.is_empty() {
            writeln!(writer)?;
        }
        self.format_summary(&summary, writer)
    }

    fn format_summary(&self, summary: &BatchSummary, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return match (summary.updated, self.color) {
                (0, true) => writeln!(writer, "{}", "No updates".dimmed()),
                (0, false) => writeln!(writer, "No updates"),
                (n, true) => writeln!(writer, "{} updated", n.to_string().green()),
                (n, false) => writeln!(writer, "{} updated", n),
            };
        }

        if self.color {
            writeln!(writer, "{}:", "Summary".bold())?;
            if summary.updated > 0 {
                writeln!(
                    writer,
                    "  {} dependency(ies) can be updated",
                    summary.updated.to_string().green()
                )?;
            } else {
                writeln!(writer, "  {}", "No dependencies can be updated".dimmed())?;
            }
            writeln!(
                writer,
                "  {} up to date, {} not updatable",
                summary.up_to_date.to_string().dimmed(),
                summary.no_update.to_string().dimmed()
            )?;
            if summary.undetermined > 0 {
                writeln!(
                    writer,
                    "  {} undetermined",
                    summary.undetermined.to_string().yellow()
                )?;
            }
        } else {
            writeln!(writer, "Summary:")?;
            if summary.updated > 0 {
                writeln!(writer, "  {} dependency(ies) can be updated", summary.updated)?;
            } else {
                writeln!(writer, "  No dependencies can be updated")?;
            }
            writeln!(
                writer,
                "  {} up to date, {} not updatable",
                summary.up_to_date, summary.no_update
            )?;
            if summary.undetermined > 0 {
                writeln!(writer, "  {} undetermined", summary.undetermined)?;
            }
        }
        Ok(())
    }
}
