//! Per-job outcomes and the aggregated run report

use crate::config::{EngineKind, SiteConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal status of one crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one site's job, produced exactly once per job
///
/// `count` is always set for browser jobs and never for subprocess jobs,
/// whose record count is opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlOutcome {
    pub site: String,
    pub engine: EngineKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrawlOutcome {
    /// Successful browser job with `count` records
    pub fn crawled(site: &SiteConfig, count: usize) -> Self {
        Self {
            site: site.name.clone(),
            engine: site.engine,
            count: Some(count),
            status: OutcomeStatus::Success,
            error: None,
        }
    }

    /// Successful subprocess job
    pub fn spider_finished(site: &SiteConfig) -> Self {
        Self {
            site: site.name.clone(),
            engine: site.engine,
            count: None,
            status: OutcomeStatus::Success,
            error: None,
        }
    }

    /// Failed job; browser jobs report a count of zero
    pub fn failed(site: &SiteConfig, error: impl fmt::Display) -> Self {
        Self {
            site: site.name.clone(),
            engine: site.engine,
            count: match site.engine {
                EngineKind::Browser => Some(0),
                EngineKind::Subprocess => None,
            },
            status: OutcomeStatus::Error,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Whether a report covers the whole roster or one engine's share of it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportScope {
    Full,
    Partial(EngineKind),
}

/// Aggregated outcomes of one run, in roster order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub timestamp: DateTime<Utc>,
    pub results: Vec<CrawlOutcome>,
}

impl RunReport {
    pub fn new(results: Vec<CrawlOutcome>) -> Self {
        Self {
            timestamp: Utc::now(),
            results,
        }
    }

    /// Outcomes of one engine, keeping their order
    pub fn partition(&self, engine: EngineKind) -> Vec<CrawlOutcome> {
        self.results
            .iter()
            .filter(|outcome| outcome.engine == engine)
            .cloned()
            .collect()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|o| o.is_success()).count()
    }

    pub fn error_count(&self) -> usize {
        self.results.len() - self.success_count()
    }

    /// Sum of record counts over browser jobs
    pub fn total_listings(&self) -> usize {
        self.results.iter().filter_map(|o| o.count).sum()
    }
}
