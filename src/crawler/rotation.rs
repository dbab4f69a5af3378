//! User agent and proxy rotation
//!
//! A policy is consulted once per outbound navigation. Policies do no I/O.

use crate::config::RotationConfig;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Desktop browser user agents used when the config lists none
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Supplies request identity for each navigation
pub trait RotationPolicy: Send + Sync {
    fn next_user_agent(&self) -> String;

    /// `None` means connect directly
    fn next_proxy(&self) -> Option<String>;
}

fn user_agent_pool(config: &RotationConfig) -> Vec<String> {
    if config.user_agents.is_empty() {
        DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect()
    } else {
        config.user_agents.clone()
    }
}

/// Uniform random choice over the configured pools
#[derive(Debug, Clone)]
pub struct RandomRotation {
    user_agents: Vec<String>,
    proxies: Vec<String>,
}

impl RandomRotation {
    pub fn new(config: &RotationConfig) -> Self {
        Self {
            user_agents: user_agent_pool(config),
            proxies: config.proxies.clone(),
        }
    }
}

impl RotationPolicy for RandomRotation {
    fn next_user_agent(&self) -> String {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| DEFAULT_USER_AGENTS[0].to_string())
    }

    fn next_proxy(&self) -> Option<String> {
        self.proxies.choose(&mut rand::thread_rng()).cloned()
    }
}

/// Cycles through fixed sequences in order
///
/// Used for reproducible runs and tests.
#[derive(Debug)]
pub struct FixedRotation {
    user_agents: Vec<String>,
    proxies: Vec<String>,
    ua_cursor: AtomicUsize,
    proxy_cursor: AtomicUsize,
}

impl FixedRotation {
    pub fn new(user_agents: Vec<String>, proxies: Vec<String>) -> Self {
        Self {
            user_agents,
            proxies,
            ua_cursor: AtomicUsize::new(0),
            proxy_cursor: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &RotationConfig) -> Self {
        Self::new(user_agent_pool(config), config.proxies.clone())
    }

    fn cycle(pool: &[String], cursor: &AtomicUsize) -> Option<String> {
        if pool.is_empty() {
            return None;
        }
        let index = cursor.fetch_add(1, Ordering::Relaxed) % pool.len();
        Some(pool[index].clone())
    }
}

impl RotationPolicy for FixedRotation {
    fn next_user_agent(&self) -> String {
        Self::cycle(&self.user_agents, &self.ua_cursor)
            .unwrap_or_else(|| DEFAULT_USER_AGENTS[0].to_string())
    }

    fn next_proxy(&self) -> Option<String> {
        Self::cycle(&self.proxies, &self.proxy_cursor)
    }
}
