//! External spider processes
//!
//! Subprocess sites are crawled by an opaque spider project. The only contract
//! is the invocation and the exit code; output is neither captured nor parsed.

use crate::config::{OutputConfig, SiteConfig, SpiderConfig};
use crate::crawler::CrawlOutcome;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Runs one subprocess site to completion
#[async_trait]
pub trait ExternalSpider: Send + Sync {
    async fn run_external_spider(&self, site: &SiteConfig) -> CrawlOutcome;
}

/// Spawns `<command> <args..> crawl <spider> -o <output_dir>/<spider>_jobs.json`
#[derive(Debug, Clone)]
pub struct ProcessSpider {
    command: String,
    args: Vec<String>,
    project_dir: PathBuf,
    output_dir: PathBuf,
    timeout: Duration,
}

impl ProcessSpider {
    pub fn new(spider: &SpiderConfig, output: &OutputConfig) -> Self {
        Self {
            command: spider.command.clone(),
            args: spider.args.clone(),
            project_dir: PathBuf::from(&spider.project_dir),
            output_dir: absolute(Path::new(&output.output_dir)),
            timeout: Duration::from_secs(spider.timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Where the spider is told to write its listings
    pub fn output_path(&self, site: &SiteConfig) -> PathBuf {
        self.output_dir
            .join(format!("{}_jobs.json", site.spider_id()))
    }

    /// Full argument list after the program name
    pub fn arguments(&self, site: &SiteConfig) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("crawl".to_string());
        args.push(site.spider_id());
        args.push("-o".to_string());
        args.push(self.output_path(site).to_string_lossy().into_owned());
        args
    }
}

#[async_trait]
impl ExternalSpider for ProcessSpider {
    async fn run_external_spider(&self, site: &SiteConfig) -> CrawlOutcome {
        let args = self.arguments(site);
        tracing::info!(
            "Running spider for {}: {} {}",
            site.name,
            self.command,
            args.join(" ")
        );

        let mut child = match Command::new(&self.command)
            .args(&args)
            .current_dir(&self.project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                tracing::error!("Failed to start spider for {}: {}", site.name, e);
                return CrawlOutcome::failed(site, e);
            }
        };

        let status = match timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                tracing::error!("Failed to wait on spider for {}: {}", site.name, e);
                return CrawlOutcome::failed(site, e);
            }
            Err(_) => {
                tracing::error!(
                    "Spider for {} exceeded {:?}; killing it",
                    site.name,
                    self.timeout
                );
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill spider for {}: {}", site.name, e);
                }
                return CrawlOutcome::failed(
                    site,
                    format!("Spider timed out after {:?}", self.timeout),
                );
            }
        };

        if status.success() {
            tracing::info!("Spider for {} finished", site.name);
            return CrawlOutcome::spider_finished(site);
        }

        let message = match status.code() {
            Some(code) => format!("Process exited with code {}", code),
            None => "Process terminated by signal".to_string(),
        };
        tracing::error!("Spider for {} failed: {}", site.name, message);
        CrawlOutcome::failed(site, message)
    }
}

/// Anchors a relative output directory to our working directory, since the
/// spider runs inside its project directory
fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
