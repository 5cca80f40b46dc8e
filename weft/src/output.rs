//! Human-readable and JSON rendering of weave results.

use crate::plan::MergePlan;
use crate::weaver::WeaveReport;
use anyhow::Result;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use std::io::Write;

fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    table
}

/// Serializable view of a [`WeaveReport`].
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    /// True if nothing failed.
    pub success: bool,
    /// Fragments rejected during prepare.
    pub prepare_failures: Vec<FailureDocument>,
    /// Per-target outcomes.
    pub targets: Vec<TargetDocument<'a>>,
}

/// A failed fragment.
#[derive(Debug, Serialize)]
pub struct FailureDocument {
    /// Fragment name.
    pub fragment: String,
    /// Rendered error.
    pub error: String,
}

/// One target's outcome.
#[derive(Debug, Serialize)]
pub struct TargetDocument<'a> {
    /// Target name.
    pub target: &'a str,
    /// Rendered error, if the target failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Plans, empty on failure.
    pub plans: &'a [MergePlan],
}

impl<'a> From<&'a WeaveReport> for ReportDocument<'a> {
    fn from(report: &'a WeaveReport) -> Self {
        Self {
            success: report.is_success(),
            prepare_failures: report
                .prepare_failures
                .iter()
                .map(|f| FailureDocument {
                    fragment: f.fragment.clone(),
                    error: f.error.to_string(),
                })
                .collect(),
            targets: report
                .targets
                .iter()
                .map(|t| match &t.result {
                    Ok(plans) => TargetDocument {
                        target: &t.target,
                        error: None,
                        plans,
                    },
                    Err(e) => TargetDocument {
                        target: &t.target,
                        error: Some(e.to_string()),
                        plans: &[],
                    },
                })
                .collect(),
        }
    }
}

/// Renders a report as pretty JSON.
pub fn report_json(report: &WeaveReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ReportDocument::from(report))?)
}

/// Prints the per-target summary table and any failures.
pub fn print_report<W: Write>(writer: &mut W, report: &WeaveReport) -> Result<()> {
    writeln!(writer, "\n{}", "Weave Results".bold().underline())?;

    let mut table = create_table(vec![
        "Target", "Fragment", "Merged", "Shadows", "Overwrites", "Accessors", "Discarded",
        "Renames", "Rewrites",
    ]);
    for outcome in &report.targets {
        match &outcome.result {
            Ok(plans) => {
                for plan in plans {
                    table.add_row(vec![
                        Cell::new(&plan.target).add_attribute(Attribute::Bold),
                        Cell::new(&plan.fragment),
                        Cell::new(plan.merged_count()),
                        Cell::new(plan.shadow_methods.len() + plan.shadow_fields.len()),
                        Cell::new(plan.overwrites.len()),
                        Cell::new(plan.accessors.len()),
                        Cell::new(plan.discarded.len()).fg(if plan.discarded.is_empty() {
                            Color::White
                        } else {
                            Color::Yellow
                        }),
                        Cell::new(plan.renames.len()),
                        Cell::new(plan.rewrites.len()),
                    ]);
                }
            }
            Err(_) => {
                table.add_row(vec![
                    Cell::new(&outcome.target).add_attribute(Attribute::Bold),
                    Cell::new("FAILED").fg(Color::Red),
                ]);
            }
        }
    }
    writeln!(writer, "{table}")?;

    for failure in &report.prepare_failures {
        writeln!(
            writer,
            "{} {}: {}",
            "[PREPARE]".red().bold(),
            failure.fragment,
            failure.error
        )?;
    }
    for outcome in &report.targets {
        if let Err(e) = &outcome.result {
            writeln!(writer, "{} {}: {e}", "[TARGET]".red().bold(), outcome.target)?;
        }
    }

    let failed = report.failed_targets() + report.prepare_failures.len();
    if failed == 0 {
        writeln!(
            writer,
            "\n{} {} target(s) woven",
            "[OK]".green().bold(),
            report.targets.len()
        )?;
    } else {
        writeln!(writer, "\n{} {failed} failure(s)", "[FAILED]".red().bold())?;
    }
    Ok(())
}

/// One line of `weft check` output.
#[derive(Debug, Clone, Serialize)]
pub struct CheckRow {
    /// Fragment name.
    pub fragment: String,
    /// Error, if prepare failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// `declared -> current` for every member renamed during prepare.
    pub renames: Vec<String>,
}

/// Prints the `weft check` table.
pub fn print_check<W: Write>(writer: &mut W, rows: &[CheckRow]) -> Result<()> {
    let mut table = create_table(vec!["Fragment", "Status", "Prepare renames"]);
    for row in rows {
        let status = match &row.error {
            None => Cell::new("OK").fg(Color::Green),
            Some(e) => Cell::new(e).fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&row.fragment).add_attribute(Attribute::Bold),
            status,
            Cell::new(row.renames.join("\n")),
        ]);
    }
    writeln!(writer, "{table}")?;
    Ok(())
}
