//! Per-host robots.txt cache with 24 hour expiry

use crate::robots::{fetch_robots, ParsedRobots};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use std::collections::HashMap;
use tokio::sync::Mutex;
use url::Url;

/// robots.txt rules together with when they were fetched
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub content: ParsedRobots,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(content: ParsedRobots) -> Self {
        Self {
            content,
            fetched_at: Utc::now(),
        }
    }

    /// Rules older than 24 hours are refetched
    pub fn is_stale(&self) -> bool {
        self.age() > Duration::hours(24)
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}

/// robots.txt rules keyed by origin (`scheme://host:port`)
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: Mutex<HashMap<String, CachedRobots>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks a page URL, fetching the host's robots.txt when missing or stale
    ///
    /// # Arguments
    ///
    /// * `client` - Client used for the robots.txt request
    /// * `url` - The page about to be navigated
    /// * `user_agent` - The agent the navigation will present
    pub async fn is_allowed(&self, client: &Client, url: &Url, user_agent: &str) -> bool {
        let origin = url.origin().ascii_serialization();

        // The lock is held across the fetch so one host is only fetched once
        let mut entries = self.entries.lock().await;
        let fresh = entries
            .get(&origin)
            .filter(|cached| !cached.is_stale())
            .map(|cached| cached.content.clone());

        let robots = match fresh {
            Some(robots) => robots,
            None => {
                tracing::debug!("Fetching robots.txt for {}", origin);
                let robots = fetch_robots(client, url).await;
                entries.insert(origin, CachedRobots::new(robots.clone()));
                robots
            }
        };

        robots.is_allowed(url.as_str(), user_agent)
    }

    /// Seeds an entry, replacing any cached rules for the origin
    pub async fn insert(&self, origin: &str, robots: CachedRobots) {
        self.entries.lock().await.insert(origin.to_string(), robots);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
