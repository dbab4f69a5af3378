//! JSON files in the output directory
//!
//! Records go to `<site>_jobs.json`; reports go to fixed file names so
//! downstream tooling can find them.

use crate::config::{file_stem, EngineKind};
use crate::crawler::{CrawlOutcome, ReportScope, RunReport};
use crate::extract::JobListing;
use crate::output::traits::{OutputResult, ResultSink};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Report covering all engines
pub const FULL_REPORT_FILE: &str = "all_crawlers_summary.json";

/// Report of a browser-only run
pub const BROWSER_REPORT_FILE: &str = "crawlee_summary.json";

/// Report of a subprocess-only run
pub const SUBPROCESS_REPORT_FILE: &str = "scrapy_summary.json";

/// Full report document: engine partitions next to the combined list
#[derive(Serialize)]
struct FullReport<'a> {
    timestamp: &'a DateTime<Utc>,
    browser: Vec<CrawlOutcome>,
    subprocess: Vec<CrawlOutcome>,
    results: &'a [CrawlOutcome],
}

/// Writes pretty-printed JSON under one directory
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    output_dir: PathBuf,
}

impl JsonFileSink {
    /// Creates the sink, creating `output_dir` if needed
    pub fn new(output_dir: impl Into<PathBuf>) -> OutputResult<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn records_path(&self, site: &str) -> PathBuf {
        self.output_dir.join(format!("{}_jobs.json", file_stem(site)))
    }

    pub fn report_path(&self, scope: ReportScope) -> PathBuf {
        let name = match scope {
            ReportScope::Full => FULL_REPORT_FILE,
            ReportScope::Partial(EngineKind::Browser) => BROWSER_REPORT_FILE,
            ReportScope::Partial(EngineKind::Subprocess) => SUBPROCESS_REPORT_FILE,
        };
        self.output_dir.join(name)
    }
}

impl ResultSink for JsonFileSink {
    fn write_records(&self, site: &str, records: &[JobListing]) -> OutputResult<()> {
        let path = self.records_path(site);
        write_json(&path, &records)?;
        tracing::info!("Saved {} listings to {}", records.len(), path.display());
        Ok(())
    }

    fn append_records(&self, site: &str, records: &[JobListing]) -> OutputResult<()> {
        let path = self.records_path(site);
        let mut all: Vec<JobListing> = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        all.extend_from_slice(records);
        write_json(&path, &all)?;
        tracing::info!(
            "Added {} listings to {} ({} total)",
            records.len(),
            path.display(),
            all.len()
        );
        Ok(())
    }

    fn write_report(&self, report: &RunReport, scope: ReportScope) -> OutputResult<()> {
        let path = self.report_path(scope);
        match scope {
            ReportScope::Full => write_json(
                &path,
                &FullReport {
                    timestamp: &report.timestamp,
                    browser: report.partition(EngineKind::Browser),
                    subprocess: report.partition(EngineKind::Subprocess),
                    results: &report.results,
                },
            )?,
            ReportScope::Partial(_) => write_json(&path, report)?,
        }
        tracing::info!("Saved run report to {}", path.display());
        Ok(())
    }
}

/// Writes through a temporary file so readers never see a half-written document
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> OutputResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
