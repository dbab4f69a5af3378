//! Markdown summary generation
//!
//! Renders a run report as a human-readable markdown document.

use crate::config::EngineKind;
use crate::crawler::{CrawlOutcome, ReportScope, RunReport};
use crate::extract::JobListing;
use crate::output::traits::{OutputResult, ResultSink};
use std::fs;
use std::path::PathBuf;

/// Writes the markdown summary of each report to a fixed path
#[derive(Debug, Clone)]
pub struct MarkdownSummary {
    path: PathBuf,
}

impl MarkdownSummary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultSink for MarkdownSummary {
    fn write_records(&self, _site: &str, _records: &[JobListing]) -> OutputResult<()> {
        Ok(())
    }

    fn append_records(&self, _site: &str, _records: &[JobListing]) -> OutputResult<()> {
        Ok(())
    }

    fn write_report(&self, report: &RunReport, scope: ReportScope) -> OutputResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format_markdown_report(report, scope))?;
        tracing::info!("Wrote summary to {}", self.path.display());
        Ok(())
    }
}

/// Formats a run report as markdown
///
/// # Arguments
///
/// * `report` - The report to render
/// * `scope` - Which engines the report covers, shown in the header
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_report(report: &RunReport, scope: ReportScope) -> String {
    let mut md = String::new();

    md.push_str("# Job-Trawler Run Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Timestamp**: {}\n", report.timestamp.to_rfc3339()));
    let scope = match scope {
        ReportScope::Full => "all engines".to_string(),
        ReportScope::Partial(engine) => format!("{} only", engine),
    };
    md.push_str(&format!("- **Scope**: {}\n", scope));
    md.push_str(&format!("- **Sites**: {}\n", report.results.len()));
    md.push_str(&format!("- **Succeeded**: {}\n", report.success_count()));
    md.push_str(&format!("- **Failed**: {}\n", report.error_count()));
    md.push_str(&format!(
        "- **Listings collected**: {}\n\n",
        report.total_listings()
    ));

    for (engine, title) in [
        (EngineKind::Browser, "Browser Sites"),
        (EngineKind::Subprocess, "Subprocess Sites"),
    ] {
        let outcomes = report.partition(engine);
        if outcomes.is_empty() {
            continue;
        }

        md.push_str(&format!("## {}\n\n", title));
        md.push_str("| Site | Status | Listings | Error |\n");
        md.push_str("|------|--------|----------|-------|\n");
        for outcome in &outcomes {
            md.push_str(&table_row(outcome));
        }
        md.push('\n');
    }

    md
}

fn table_row(outcome: &CrawlOutcome) -> String {
    let count = outcome
        .count
        .map(|c| c.to_string())
        .unwrap_or_else(|| "-".to_string());
    let error = outcome
        .error
        .as_deref()
        .map(|e| e.replace('|', "\\|"))
        .unwrap_or_default();
    format!(
        "| {} | {} | {} | {} |\n",
        outcome.site, outcome.status, count, error
    )
}
