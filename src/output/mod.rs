//! Output module for listing records and run reports
//!
//! This module handles:
//! - JSON record files and report documents
//! - An optional SQLite mirror of listings and outcomes
//! - An optional markdown summary and the console results table

mod json_sink;
mod markdown;
mod sqlite_sink;
mod summary;
mod traits;

pub use json_sink::{
    JsonFileSink, BROWSER_REPORT_FILE, FULL_REPORT_FILE, SUBPROCESS_REPORT_FILE,
};
pub use markdown::{format_markdown_report, MarkdownSummary};
pub use sqlite_sink::{initialize_schema, SqliteSink};
pub use summary::{format_report_table, print_report};
pub use traits::{FanoutSink, NullSink, OutputError, OutputResult, ResultSink};

use crate::config::OutputConfig;
use std::path::Path;

/// Builds the sink chain described by the output section
///
/// JSON files are always written; SQLite and markdown are added when their
/// paths are configured.
///
/// # Arguments
///
/// * `config` - The output configuration
/// * `config_hash` - Hash stored with the SQLite run row
pub fn build_sink(config: &OutputConfig, config_hash: &str) -> OutputResult<FanoutSink> {
    let mut sinks: Vec<Box<dyn ResultSink>> = vec![Box::new(JsonFileSink::new(&config.output_dir)?)];

    if let Some(database_path) = &config.database_path {
        sinks.push(Box::new(SqliteSink::open(Path::new(database_path), config_hash)?));
    }

    if let Some(summary_path) = &config.summary_path {
        sinks.push(Box::new(MarkdownSummary::new(summary_path)));
    }

    Ok(FanoutSink::new(sinks))
}
