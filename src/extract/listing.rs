//! Normalized job listing records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used when the title selector matches nothing
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Company used when the company selector matches nothing
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// Location used when the location selector matches nothing
pub const DEFAULT_LOCATION: &str = "Remote";

/// Salary used when the salary selector matches nothing
pub const SALARY_NOT_SPECIFIED: &str = "Not specified";

/// One job listing as handed to the result sink
///
/// Every field is always populated; missing markup degrades to the sentinel
/// constants above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    pub title: String,
    pub company: String,
    pub url: String,
    pub description: String,
    pub location: String,
    pub salary: String,
    /// Name of the site the listing came from
    pub source: String,
    pub crawled_at: DateTime<Utc>,
}

/// Field values pulled from one listing node before sentinel substitution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawListing {
    pub title: Option<String>,
    pub company: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
}

impl RawListing {
    /// Applies sentinels and stamps source and crawl time
    ///
    /// A missing link falls back to the address of the page the listing was
    /// found on.
    pub fn finish(self, source: &str, page_url: &str) -> JobListing {
        JobListing {
            title: non_empty(self.title).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            company: non_empty(self.company).unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
            url: non_empty(self.url).unwrap_or_else(|| page_url.to_string()),
            description: self.description.unwrap_or_default(),
            location: non_empty(self.location).unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            salary: non_empty(self.salary).unwrap_or_else(|| SALARY_NOT_SPECIFIED.to_string()),
            source: source.to_string(),
            crawled_at: Utc::now(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
