//! Result sink trait and output errors

use crate::crawler::{ReportScope, RunReport};
use crate::extract::JobListing;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for listing records and run reports
///
/// A crawl hands over one page batch at a time: the first batch of a site
/// goes to `write_records`, which replaces any earlier copy, and each later
/// batch goes to `append_records`. The sink assembles the site's full set.
pub trait ResultSink: Send + Sync {
    /// Starts a site's record set with `records`, replacing any earlier copy
    ///
    /// # Arguments
    ///
    /// * `site` - Name of the site the records came from
    /// * `records` - The first page batch, possibly empty
    fn write_records(&self, site: &str, records: &[JobListing]) -> OutputResult<()>;

    /// Adds a page batch to the set started by `write_records`
    fn append_records(&self, site: &str, records: &[JobListing]) -> OutputResult<()>;

    /// Stores a run report
    ///
    /// # Arguments
    ///
    /// * `report` - Outcomes in roster order
    /// * `scope` - Whether the report covers all engines or just one
    fn write_report(&self, report: &RunReport, scope: ReportScope) -> OutputResult<()>;
}

/// Sink that discards everything, used by dry runs
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn write_records(&self, site: &str, records: &[JobListing]) -> OutputResult<()> {
        tracing::debug!("Discarding {} records for {}", records.len(), site);
        Ok(())
    }

    fn append_records(&self, site: &str, records: &[JobListing]) -> OutputResult<()> {
        self.write_records(site, records)
    }

    fn write_report(&self, _report: &RunReport, _scope: ReportScope) -> OutputResult<()> {
        Ok(())
    }
}

/// Writes to several sinks in order; the first error stops the write
pub struct FanoutSink {
    sinks: Vec<Box<dyn ResultSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Box<dyn ResultSink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ResultSink for FanoutSink {
    fn write_records(&self, site: &str, records: &[JobListing]) -> OutputResult<()> {
        self.sinks
            .iter()
            .try_for_each(|sink| sink.write_records(site, records))
    }

    fn append_records(&self, site: &str, records: &[JobListing]) -> OutputResult<()> {
        self.sinks
            .iter()
            .try_for_each(|sink| sink.append_records(site, records))
    }

    fn write_report(&self, report: &RunReport, scope: ReportScope) -> OutputResult<()> {
        self.sinks
            .iter()
            .try_for_each(|sink| sink.write_report(report, scope))
    }
}
