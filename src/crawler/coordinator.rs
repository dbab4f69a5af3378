//! Run coordinator - sequences site jobs and aggregates their outcomes
//!
//! Browser jobs run first, then subprocess jobs. Each job is isolated: an
//! error or a panic becomes that site's error outcome and the run carries on.
//! The finished report lists every configured site in roster order.

use crate::config::{Config, SiteConfig};
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::job::{JobContext, JobSettings, SiteCrawlJob};
use crate::crawler::rotation::{RandomRotation, RotationPolicy};
use crate::crawler::spider::{ExternalSpider, ProcessSpider};
use crate::crawler::{CrawlOutcome, ReportScope, RunReport};
use crate::output::ResultSink;
use crate::{EngineKind, TrawlError};
use futures::{stream, FutureExt, StreamExt};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Owns the roster and the collaborators every job borrows
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    rotation: Arc<dyn RotationPolicy>,
    spider: Arc<dyn ExternalSpider>,
    sink: Arc<dyn ResultSink>,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator from explicit collaborators
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration with the site roster
    /// * `fetcher` - Browser engine used by page crawls
    /// * `rotation` - User agent and proxy source
    /// * `spider` - Runner for subprocess sites
    /// * `sink` - Destination for records and reports
    pub fn new(
        mut config: Config,
        fetcher: Arc<dyn PageFetcher>,
        rotation: Arc<dyn RotationPolicy>,
        spider: Arc<dyn ExternalSpider>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        config.sites.stamp_engines();
        Self {
            config: Arc::new(config),
            fetcher,
            rotation,
            spider,
            sink,
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a coordinator with the HTTP fetcher, random rotation and
    /// process spider described by `config`
    pub fn from_config(config: Config, sink: Arc<dyn ResultSink>) -> Result<Self, TrawlError> {
        let mut fetcher =
            HttpFetcher::new(Duration::from_secs(config.crawler.request_timeout_secs))?;
        if config.crawler.respect_robots_txt {
            fetcher = fetcher.respect_robots();
        }
        let rotation = RandomRotation::new(&config.rotation);
        let spider = ProcessSpider::new(&config.spider, &config.output);

        Ok(Self::new(
            config,
            Arc::new(fetcher),
            Arc::new(rotation),
            Arc::new(spider),
            sink,
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Token that stops dispatching new jobs when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs every job and writes the combined report
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - One outcome per configured site, in roster order
    /// * `Err(TrawlError)` - The report could not be written
    pub async fn run_all(&self) -> Result<RunReport, TrawlError> {
        tracing::info!(
            "Starting run: {} browser sites, {} subprocess sites",
            self.config.sites.browser.len(),
            self.config.sites.subprocess.len()
        );

        let mut results = self.browser_outcomes().await;
        results.extend(self.subprocess_outcomes().await);

        let report = RunReport::new(results);
        self.sink.write_report(&report, ReportScope::Full)?;

        tracing::info!(
            "Run finished: {} succeeded, {} failed, {} listings",
            report.success_count(),
            report.error_count(),
            report.total_listings()
        );
        Ok(report)
    }

    /// Runs browser jobs only and writes their partial report
    pub async fn run_browser_jobs(&self) -> Result<RunReport, TrawlError> {
        let report = RunReport::new(self.browser_outcomes().await);
        self.sink
            .write_report(&report, ReportScope::Partial(EngineKind::Browser))?;
        Ok(report)
    }

    /// Runs subprocess jobs only and writes their partial report
    pub async fn run_subprocess_jobs(&self) -> Result<RunReport, TrawlError> {
        let report = RunReport::new(self.subprocess_outcomes().await);
        self.sink
            .write_report(&report, ReportScope::Partial(EngineKind::Subprocess))?;
        Ok(report)
    }

    async fn browser_outcomes(&self) -> Vec<CrawlOutcome> {
        self.dispatch(&self.config.sites.browser, |site| self.run_browser_job(site))
            .await
    }

    async fn subprocess_outcomes(&self) -> Vec<CrawlOutcome> {
        self.dispatch(&self.config.sites.subprocess, |site| {
            self.spider.run_external_spider(site)
        })
        .await
    }

    async fn run_browser_job(&self, site: &SiteConfig) -> CrawlOutcome {
        let settings = JobSettings::for_site(&self.config.crawler, site);
        let ctx = JobContext {
            fetcher: self.fetcher.as_ref(),
            rotation: self.rotation.as_ref(),
            sink: self.sink.as_ref(),
            cancel: &self.cancel,
        };
        SiteCrawlJob::new(site, settings, ctx).run().await
    }

    /// Runs one job per site through the concurrency limit, keeping roster order
    async fn dispatch<'s, F, Fut>(&'s self, sites: &'s [SiteConfig], run: F) -> Vec<CrawlOutcome>
    where
        F: Fn(&'s SiteConfig) -> Fut,
        Fut: Future<Output = CrawlOutcome> + 's,
    {
        let limit = self.config.crawler.max_concurrent_jobs.max(1) as usize;
        let cancel = &self.cancel;

        stream::iter(sites)
            .map(|site| {
                let job = run(site);
                async move {
                    if cancel.is_cancelled() {
                        tracing::warn!("Skipping {}: run cancelled", site.name);
                        return CrawlOutcome::failed(site, TrawlError::Cancelled);
                    }

                    match AssertUnwindSafe(job).catch_unwind().await {
                        Ok(outcome) => outcome,
                        Err(panic) => {
                            let error = TrawlError::JobPanicked {
                                site: site.name.clone(),
                                message: panic_message(panic.as_ref()),
                            };
                            tracing::error!("{}", error);
                            CrawlOutcome::failed(site, error)
                        }
                    }
                }
            })
            .buffered(limit)
            .collect::<Vec<_>>()
            .await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
