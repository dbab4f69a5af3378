//! One site's crawl: navigate, wait, extract, paginate, retry
//!
//! A job walks its site page by page. Every navigation is preceded by a fresh
//! identity from the rotation policy and a random pause, every wait is
//! bounded, and pagination stops at the first already-visited page or at the
//! page ceiling, whichever comes first.

use crate::config::{CrawlerConfig, SiteConfig};
use crate::crawler::fetcher::{FetchError, PageFetcher, PageRequest};
use crate::crawler::rotation::RotationPolicy;
use crate::crawler::CrawlOutcome;
use crate::extract::{ExtractError, ExtractionContract, Extractor, JobListing, PageExtraction};
use crate::output::{OutputResult, ResultSink};
use crate::state::JobState;
use crate::url::visit_key;
use crate::TrawlError;
use rand::Rng;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Resolved limits for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSettings {
    /// Attempts per URL
    pub max_retries: u32,
    pub navigation_timeout: Duration,
    pub content_timeout: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Pages visited per site, including failed ones
    pub max_pages: u32,
}

impl JobSettings {
    /// Crawler-wide settings with the site's page ceiling override applied
    pub fn for_site(config: &CrawlerConfig, site: &SiteConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
            content_timeout: Duration::from_secs(config.content_timeout_secs),
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            max_pages: site.max_pages.unwrap_or(config.max_pages).max(1),
        }
    }

    fn random_delay(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

/// Collaborators a job borrows from the coordinator
#[derive(Clone, Copy)]
pub struct JobContext<'a> {
    pub fetcher: &'a dyn PageFetcher,
    pub rotation: &'a dyn RotationPolicy,
    pub sink: &'a dyn ResultSink,
    pub cancel: &'a CancellationToken,
}

/// A browser-engine crawl of one site
pub struct SiteCrawlJob<'a> {
    site: &'a SiteConfig,
    settings: JobSettings,
    ctx: JobContext<'a>,
    state: JobState,
}

impl<'a> SiteCrawlJob<'a> {
    pub fn new(site: &'a SiteConfig, settings: JobSettings, ctx: JobContext<'a>) -> Self {
        Self {
            site,
            settings,
            ctx,
            state: JobState::Idle,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Runs the job to completion and returns its single outcome
    pub async fn run(mut self) -> CrawlOutcome {
        self.transition(JobState::Initializing);
        tracing::info!("Starting crawl of {} at {}", self.site.name, self.site.url);

        let (extractor, start) = match self.initialize() {
            Ok(bound) => bound,
            Err(e) => {
                tracing::error!("Cannot crawl {}: {}", self.site.name, e);
                return self.terminate(CrawlOutcome::failed(self.site, e));
            }
        };

        let mut crawl = Crawl::new(start);
        while let Some(url) = crawl.queue.pop_front() {
            if self.ctx.cancel.is_cancelled() {
                tracing::info!("Run cancelled; stopping {} before {}", self.site.name, url);
                crawl.last_error = Some(TrawlError::CancelledMidCrawl.to_string());
                break;
            }

            crawl.pages_visited += 1;
            match self.crawl_page(&extractor, &url).await {
                Ok(extraction) => {
                    tracing::info!(
                        "{}: {} listings on page {} ({})",
                        self.site.name,
                        extraction.listings.len(),
                        crawl.pages_visited,
                        url
                    );
                    if let Err(e) = self.store_batch(&mut crawl, &extraction.listings) {
                        tracing::error!("Failed to store records for {}: {}", self.site.name, e);
                        self.transition(JobState::Done);
                        let outcome = CrawlOutcome::failed(self.site, TrawlError::Output(e));
                        return self.terminate(outcome);
                    }

                    self.transition(JobState::DecidingPagination);
                    if let Some(next) = extraction.next_page {
                        self.follow(&mut crawl, next);
                    }
                }
                Err(e) => {
                    tracing::warn!("{}: giving up on {}: {}", self.site.name, url, e);
                    crawl.last_error = Some(e.to_string());
                }
            }
        }

        self.transition(JobState::Done);
        let outcome = self.finish(crawl);
        self.terminate(outcome)
    }

    /// Hands one page's listings to the sink; the first batch restarts the site's set
    fn store_batch(&self, crawl: &mut Crawl, listings: &[JobListing]) -> OutputResult<()> {
        if crawl.pages_succeeded == 0 {
            self.ctx.sink.write_records(&self.site.name, listings)?;
        } else {
            self.ctx.sink.append_records(&self.site.name, listings)?;
        }
        crawl.pages_succeeded += 1;
        crawl.listings += listings.len();
        Ok(())
    }

    fn initialize(&self) -> Result<(Extractor, Url), TrawlError> {
        let extractor = Extractor::for_site(self.site)?;
        if !self.site.ready_selector().trim().is_empty() {
            scraper::Selector::parse(self.site.ready_selector()).map_err(|e| {
                ExtractError::InvalidSelector {
                    selector: self.site.ready_selector().to_string(),
                    message: format!("{:?}", e),
                }
            })?;
        }
        let start = Url::parse(&self.site.url)?;

        tracing::debug!(
            "{}: using {} extractor, ceiling {} pages",
            self.site.name,
            extractor.name(),
            self.settings.max_pages
        );
        Ok((extractor, start))
    }

    /// Queues the next page unless it was visited or the ceiling is reached
    fn follow(&self, crawl: &mut Crawl, next: String) {
        if crawl.pages_visited >= self.settings.max_pages {
            tracing::info!(
                "{}: page ceiling of {} reached",
                self.site.name,
                self.settings.max_pages
            );
            return;
        }

        let key = match visit_key(&next) {
            Ok(key) => key,
            Err(e) => {
                tracing::debug!("{}: ignoring next page {}: {}", self.site.name, next, e);
                return;
            }
        };

        if !crawl.visited.insert(key) {
            tracing::info!(
                "{}: next page {} already visited; pagination finished",
                self.site.name,
                next
            );
            return;
        }

        match Url::parse(&next) {
            Ok(url) => crawl.queue.push_back(url),
            Err(e) => tracing::debug!("{}: ignoring next page {}: {}", self.site.name, next, e),
        }
    }

    /// Tries one URL up to the retry budget
    async fn crawl_page(
        &mut self,
        extractor: &Extractor,
        url: &Url,
    ) -> Result<PageExtraction, FetchError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(extractor, url).await {
                Ok(extraction) => return Ok(extraction),
                Err(e) if e.is_retryable() && attempt < self.settings.max_retries => {
                    tracing::warn!(
                        "{}: attempt {}/{} for {} failed: {}",
                        self.site.name,
                        attempt,
                        self.settings.max_retries,
                        url,
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One attempt: navigation, content wait, extraction
    async fn attempt(
        &mut self,
        extractor: &Extractor,
        url: &Url,
    ) -> Result<PageExtraction, FetchError> {
        self.transition(JobState::Fetching);

        let request = PageRequest {
            url: url.clone(),
            user_agent: self.ctx.rotation.next_user_agent(),
            proxy: self.ctx.rotation.next_proxy(),
        };
        tracing::debug!(
            "{}: navigating to {} as {:?} via {:?}",
            self.site.name,
            url,
            request.user_agent,
            request.proxy
        );

        if !self.pause().await {
            return Err(FetchError::Cancelled);
        }

        let navigation_timeout = self.settings.navigation_timeout;
        let page = match timeout(navigation_timeout, self.ctx.fetcher.navigate(&request)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(FetchError::NavigationTimeout {
                    url: url.to_string(),
                    timeout: navigation_timeout,
                })
            }
        };

        self.transition(JobState::WaitingForContent);
        let site = self.site;
        let ready = site.ready_selector();
        if !ready.trim().is_empty() {
            let content_timeout = self.settings.content_timeout;
            match timeout(content_timeout, self.ctx.fetcher.wait_for_selector(&page, ready)).await
            {
                Ok(result) => result?,
                Err(_) => {
                    return Err(FetchError::ContentTimeout {
                        selector: ready.to_string(),
                        timeout: content_timeout,
                    })
                }
            }
        }

        self.transition(JobState::Extracting);
        Ok(extractor.extract(&page))
    }

    /// Random pre-navigation delay; false if the run was cancelled meanwhile
    async fn pause(&self) -> bool {
        let delay = self.settings.random_delay();
        tracing::debug!("{}: waiting {:?} before navigation", self.site.name, delay);

        tokio::select! {
            _ = self.ctx.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    fn finish(&self, crawl: Crawl) -> CrawlOutcome {
        if crawl.pages_succeeded == 0 {
            let reason = crawl
                .last_error
                .unwrap_or_else(|| "no page was crawled".to_string());
            let error = TrawlError::NoPagesCrawled {
                site: self.site.name.clone(),
                reason,
            };
            tracing::error!("{}", error);
            return CrawlOutcome::failed(self.site, error);
        }

        tracing::info!(
            "Finished {}: {} listings from {} of {} pages",
            self.site.name,
            crawl.listings,
            crawl.pages_succeeded,
            crawl.pages_visited
        );
        CrawlOutcome::crawled(self.site, crawl.listings)
    }

    fn terminate(&mut self, outcome: CrawlOutcome) -> CrawlOutcome {
        self.transition(JobState::Terminated(outcome.status));
        outcome
    }

    fn transition(&mut self, next: JobState) -> bool {
        if self.state.can_transition_to(next) {
            self.state = next;
            true
        } else {
            let rejected = TrawlError::InvalidTransition {
                from: self.state,
                to: next,
            };
            tracing::debug!("{}: {}", self.site.name, rejected);
            false
        }
    }
}

/// Mutable bookkeeping of one crawl
struct Crawl {
    queue: VecDeque<Url>,
    visited: HashSet<String>,
    /// Listings handed to the sink so far
    listings: usize,
    pages_visited: u32,
    pages_succeeded: u32,
    last_error: Option<String>,
}

impl Crawl {
    fn new(start: Url) -> Self {
        let mut visited = HashSet::new();
        if let Ok(key) = visit_key(start.as_str()) {
            visited.insert(key);
        }
        Self {
            queue: VecDeque::from([start]),
            visited,
            listings: 0,
            pages_visited: 0,
            pages_succeeded: 0,
            last_error: None,
        }
    }
}
