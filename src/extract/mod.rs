//! Listing extraction
//!
//! Maps rendered result pages to [`JobListing`] records through a per-site
//! [`ExtractionContract`].

mod contract;
mod listing;
mod selectors;

pub use contract::{
    ExtractionContract, Extractor, GenericExtractor, PageExtraction, RemoteOkExtractor,
    WeWorkRemotelyExtractor,
};
pub use listing::{
    JobListing, RawListing, DEFAULT_LOCATION, SALARY_NOT_SPECIFIED, UNKNOWN_COMPANY,
    UNKNOWN_TITLE,
};
pub use selectors::{CompiledSelectors, SelectorDefaults};

use thiserror::Error;

/// Errors raised while preparing a site's extraction contract
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Missing required selector: {0}")]
    MissingSelector(&'static str),

    #[error("Unknown extractor: {0}")]
    UnknownExtractor(String),
}
