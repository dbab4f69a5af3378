//! URL handling module for Job-Trawler
//!
//! This module resolves hrefs found in listing markup against the page they
//! came from and derives the keys used to detect already-visited pages.

mod normalize;
mod resolve;

// Re-export main functions
pub use normalize::visit_key;
pub use resolve::resolve_href;
