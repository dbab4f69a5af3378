//! Crawler module for job-board crawl orchestration
//!
//! This module contains the crawl engine, including:
//! - Per-site page crawls with retry, rotation and pagination guards
//! - External spider processes for subprocess sites
//! - The run coordinator that aggregates outcomes into a report

mod coordinator;
mod fetcher;
mod job;
mod outcome;
mod rotation;
mod spider;

pub use coordinator::Coordinator;
pub use fetcher::{
    build_http_client, contains_selector, FetchError, HttpFetcher, PageFetcher, PageRequest,
    RenderedPage,
};
pub use job::{JobContext, JobSettings, SiteCrawlJob};
pub use outcome::{CrawlOutcome, OutcomeStatus, ReportScope, RunReport};
pub use rotation::{FixedRotation, RandomRotation, RotationPolicy, DEFAULT_USER_AGENTS};
pub use spider::{ExternalSpider, ProcessSpider};
