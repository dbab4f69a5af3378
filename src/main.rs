//! Job-Trawler main entry point
//!
//! This is the command-line interface for the Job-Trawler crawl orchestrator.

use anyhow::Context;
use clap::Parser;
use job_trawler::config::{load_config_with_hash, Config};
use job_trawler::crawler::{Coordinator, ProcessSpider, RunReport};
use job_trawler::extract::{ExtractionContract, Extractor};
use job_trawler::output::{build_sink, print_report};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Job-Trawler: a job-board crawl orchestrator
///
/// Job-Trawler crawls a roster of job boards, either page by page or through
/// an external spider, and writes normalized listings together with a report
/// of every site's outcome.
#[derive(Parser, Debug)]
#[command(name = "job-trawler")]
#[command(version = "1.0.0")]
#[command(about = "A job-board crawl orchestrator", long_about = None)]
struct Cli {
    /// Path to TOML roster and configuration file
    #[arg(value_name = "CONFIG", default_value = "job_boards.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run only the browser-engine sites
    #[arg(long, conflicts_with = "subprocess_only")]
    browser_only: bool,

    /// Run only the external spider sites
    #[arg(long, conflicts_with = "browser_only")]
    subprocess_only: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let report = handle_crawl(config, &config_hash, &cli).await?;
    if !cli.quiet {
        print_report(&report);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("job_trawler=info,warn"),
            1 => EnvFilter::new("job_trawler=debug,info"),
            2 => EnvFilter::new("job_trawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the jobs a run would start
fn handle_dry_run(config: &Config) {
    println!("=== Job-Trawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max retries per page: {}", config.crawler.max_retries);
    println!(
        "  Navigation / content timeout: {}s / {}s",
        config.crawler.navigation_timeout_secs, config.crawler.content_timeout_secs
    );
    println!(
        "  Delay before navigation: {}-{}ms",
        config.crawler.min_delay_ms, config.crawler.max_delay_ms
    );
    println!("  Max pages per site: {}", config.crawler.max_pages);
    println!("  Concurrent jobs: {}", config.crawler.max_concurrent_jobs);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots_txt);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.output_dir);
    if let Some(path) = &config.output.database_path {
        println!("  Database: {}", path);
    }
    if let Some(path) = &config.output.summary_path {
        println!("  Summary: {}", path);
    }

    println!("\nBrowser Sites ({}):", config.sites.browser.len());
    for site in &config.sites.browser {
        let extractor = match Extractor::for_site(site) {
            Ok(extractor) => extractor.name().to_string(),
            Err(e) => format!("invalid: {}", e),
        };
        println!("  - {} ({}) [{}]", site.name, site.url, extractor);
    }

    let spider = ProcessSpider::new(&config.spider, &config.output);
    println!("\nSubprocess Sites ({}):", config.sites.subprocess.len());
    for site in &config.sites.subprocess {
        println!(
            "  - {}: {} {}",
            site.name,
            config.spider.command,
            spider.arguments(site).join(" ")
        );
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would run {} crawl jobs", config.sites.len());
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str, cli: &Cli) -> anyhow::Result<RunReport> {
    let sink = build_sink(&config.output, config_hash).with_context(|| {
        format!(
            "failed to prepare output in {}",
            config.output.output_dir
        )
    })?;

    let coordinator = Coordinator::from_config(config, Arc::new(sink))
        .context("failed to build the crawl engine")?;

    // Ctrl-C stops dispatching; the job in flight finishes its current page
    let token = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing the current page and stopping");
            token.cancel();
        }
    });

    let report = if cli.browser_only {
        coordinator.run_browser_jobs().await
    } else if cli.subprocess_only {
        coordinator.run_subprocess_jobs().await
    } else {
        coordinator.run_all().await
    }
    .context("failed to write the run report")?;

    Ok(report)
}
