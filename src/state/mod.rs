//! State module for tracking crawl job progress
//!
//! # Components
//!
//! - `JobState`: the lifecycle of one site crawl job (idle, fetching,
//!   waiting for content, extracting, deciding pagination, terminated)

mod job_state;

pub use job_state::JobState;
