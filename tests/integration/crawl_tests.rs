//! Integration tests for the crawl orchestrator
//!
//! These tests serve job boards from wiremock servers and drive whole runs
//! through the coordinator, the HTTP fetcher and the JSON/SQLite sinks.

use job_trawler::config::{
    parse_config, Config, CrawlerConfig, OutputConfig, Roster, SelectorConfig, SiteConfig,
    SpiderConfig,
};
use job_trawler::crawler::Coordinator;
use job_trawler::extract::JobListing;
use job_trawler::output::{build_sink, FULL_REPORT_FILE};
use job_trawler::{EngineKind, OutcomeStatus};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn board_selectors() -> SelectorConfig {
    SelectorConfig {
        job_container: "li.job".to_string(),
        job_title: "h2".to_string(),
        company: ".company".to_string(),
        location: ".location".to_string(),
        salary: ".salary".to_string(),
        description: None,
        link: Some("a.apply".to_string()),
        next_page: Some("a.next".to_string()),
    }
}

fn browser_site(name: &str, url: &str) -> SiteConfig {
    SiteConfig {
        name: name.to_string(),
        url: url.to_string(),
        selectors: board_selectors(),
        ..Default::default()
    }
}

/// Creates a test configuration with fast, bounded crawler settings
fn create_test_config(output_dir: &Path, browser: Vec<SiteConfig>, subprocess: Vec<SiteConfig>) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_retries: 2,
            request_timeout_secs: 5,
            navigation_timeout_secs: 5,
            content_timeout_secs: 5,
            min_delay_ms: 0,
            max_delay_ms: 0,
            max_pages: 10,
            max_concurrent_jobs: 1,
            respect_robots_txt: false,
        },
        output: OutputConfig {
            output_dir: output_dir.to_string_lossy().into_owned(),
            database_path: Some(output_dir.join("jobs.db").to_string_lossy().into_owned()),
            summary_path: None,
        },
        sites: Roster { browser, subprocess },
        ..Default::default()
    }
}

/// Renders a listing page; `salary` is omitted from every listing when false
fn listing_page(prefix: &str, count: usize, with_salary: bool, next: Option<&str>) -> String {
    let mut body = String::from("<html><body><ul>");
    for i in 0..count {
        let salary = if with_salary {
            format!("<span class=\"salary\">${}k</span>", 100 + i)
        } else {
            String::new()
        };
        body.push_str(&format!(
            r#"<li class="job">
                <h2>{prefix} Engineer {i}</h2>
                <span class="company">{prefix} Corp</span>
                <span class="location">Worldwide</span>
                {salary}
                <a class="apply" href="/jobs/{prefix}-{i}">Apply</a>
            </li>"#,
        ));
    }
    body.push_str("</ul>");
    if let Some(next) = next {
        body.push_str(&format!(r#"<a class="next" href="{}">Next</a>"#, next));
    }
    body.push_str("</body></html>");
    body
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn read_records(output_dir: &Path, stem: &str) -> Vec<JobListing> {
    let content = std::fs::read_to_string(output_dir.join(format!("{}_jobs.json", stem)))
        .expect("records file should exist");
    serde_json::from_str(&content).expect("records file should be valid JSON")
}

async fn run(config: Config) -> job_trawler::RunReport {
    let sink = build_sink(&config.output, "test-hash").expect("sink should build");
    let coordinator =
        Coordinator::from_config(config, Arc::new(sink)).expect("coordinator should build");
    coordinator.run_all().await.expect("report should be written")
}

#[tokio::test]
async fn test_two_page_site_collects_all_listings() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/jobs", listing_page("alpha", 5, true, Some("/jobs/page/2"))).await;
    mount_page(&server, "/jobs/page/2", listing_page("beta", 3, true, None)).await;

    let config = create_test_config(
        dir.path(),
        vec![browser_site("Board One", &format!("{}/jobs", server.uri()))],
        vec![],
    );
    let report = run(config).await;

    assert_eq!(report.results.len(), 1);
    let outcome = &report.results[0];
    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.count, Some(8));
    assert_eq!(outcome.engine, EngineKind::Browser);

    let records = read_records(dir.path(), "board_one");
    assert_eq!(records.len(), 8);
    assert_eq!(records[0].title, "alpha Engineer 0");
    assert_eq!(records[0].company, "alpha Corp");
    assert_eq!(records[0].source, "Board One");
    assert_eq!(records[0].url, format!("{}/jobs/alpha-0", server.uri()));
    assert_eq!(records[7].title, "beta Engineer 2");
}

#[tokio::test]
async fn test_missing_salary_uses_sentinel() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", listing_page("gamma", 2, false, None)).await;

    let config = create_test_config(
        dir.path(),
        vec![browser_site("NoSalary", &format!("{}/", server.uri()))],
        vec![],
    );
    let report = run(config).await;

    assert!(report.results[0].is_success());
    let records = read_records(dir.path(), "nosalary");
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.salary == "Not specified"));
    assert!(records.iter().all(|r| r.location == "Worldwide"));
}

#[tokio::test]
async fn test_pagination_loop_stops_at_visited_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Page 2 links back to page 1
    mount_page(&server, "/list", listing_page("loop", 2, true, Some("/list?page=2"))).await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page("loop2", 1, true, Some("/list"))),
        )
        .with_priority(1)
        .mount(&server)
        .await;

    let config = create_test_config(
        dir.path(),
        vec![browser_site("Loop", &format!("{}/list", server.uri()))],
        vec![],
    );
    let report = run(config).await;

    assert_eq!(report.results[0].count, Some(3));
}

#[tokio::test]
async fn test_unreachable_site_is_isolated() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/ok", listing_page("ok", 1, true, None)).await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = create_test_config(
        dir.path(),
        vec![
            browser_site("Down", &format!("{}/down", server.uri())),
            browser_site("Up", &format!("{}/ok", server.uri())),
        ],
        vec![],
    );
    let report = run(config).await;

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[0].site, "Down");
    assert_eq!(report.results[0].status, OutcomeStatus::Error);
    assert_eq!(report.results[0].count, Some(0));
    assert!(report.results[0].error.as_deref().unwrap().contains("503"));
    assert_eq!(report.results[1].site, "Up");
    assert_eq!(report.results[1].count, Some(1));
}

#[tokio::test]
async fn test_robots_disallow_fails_site() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .mount(&server)
        .await;
    mount_page(&server, "/jobs", listing_page("hidden", 3, true, None)).await;

    let mut config = create_test_config(
        dir.path(),
        vec![browser_site("Private", &format!("{}/jobs", server.uri()))],
        vec![],
    );
    config.crawler.respect_robots_txt = true;
    let report = run(config).await;

    let outcome = &report.results[0];
    assert_eq!(outcome.status, OutcomeStatus::Error);
    assert!(outcome.error.as_deref().unwrap().contains("robots.txt"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_fake_spider_end_to_end() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", listing_page("web", 2, true, None)).await;

    let mut config = create_test_config(
        dir.path(),
        vec![browser_site("Web", &format!("{}/", server.uri()))],
        vec![
            SiteConfig {
                name: "Spidered".to_string(),
                url: "https://spidered.test/".to_string(),
                ..Default::default()
            },
            SiteConfig {
                name: "Broken".to_string(),
                url: "https://broken.test/".to_string(),
                ..Default::default()
            },
        ],
    );
    // The fake spider writes an empty listing file, except for "broken"
    config.spider = SpiderConfig {
        command: "sh".to_string(),
        args: vec![
            "-c".to_string(),
            r#"[ "$2" = broken ] && exit 4; echo '[]' > "$4""#.to_string(),
            "sh".to_string(),
        ],
        project_dir: dir.path().to_string_lossy().into_owned(),
        timeout_secs: 30,
    };
    let report = run(config).await;

    let sites: Vec<&str> = report.results.iter().map(|o| o.site.as_str()).collect();
    assert_eq!(sites, ["Web", "Spidered", "Broken"]);

    let spidered = &report.results[1];
    assert_eq!(spidered.engine, EngineKind::Subprocess);
    assert_eq!(spidered.status, OutcomeStatus::Success);
    assert_eq!(spidered.count, None);
    assert!(dir.path().join("spidered_jobs.json").exists());

    let broken = &report.results[2];
    assert_eq!(broken.status, OutcomeStatus::Error);
    assert_eq!(broken.error.as_deref(), Some("Process exited with code 4"));
}

#[tokio::test]
async fn test_report_shape_is_stable() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", listing_page("shape", 1, true, None)).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = create_test_config(
        dir.path(),
        vec![
            browser_site("Good", &format!("{}/", server.uri())),
            browser_site("Gone", &format!("{}/gone", server.uri())),
        ],
        vec![],
    );
    run(config).await;

    let content = std::fs::read_to_string(dir.path().join(FULL_REPORT_FILE)).unwrap();
    let report: serde_json::Value = serde_json::from_str(&content).unwrap();

    assert!(report["timestamp"].is_string());
    assert_eq!(report["browser"].as_array().unwrap().len(), 2);
    assert_eq!(report["subprocess"].as_array().unwrap().len(), 0);

    let results = report["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);

    let good = results[0].as_object().unwrap();
    assert_eq!(good["site"], "Good");
    assert_eq!(good["engine"], "browser");
    assert_eq!(good["count"], 1);
    assert_eq!(good["status"], "success");
    assert!(!good.contains_key("error"));

    let gone = results[1].as_object().unwrap();
    assert_eq!(gone["status"], "error");
    assert_eq!(gone["count"], 0);
    assert!(gone["error"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn test_sqlite_mirror_receives_listings() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", listing_page("db", 4, true, None)).await;

    let config = create_test_config(
        dir.path(),
        vec![browser_site("Mirrored", &format!("{}/", server.uri()))],
        vec![],
    );
    run(config).await;

    let conn = rusqlite::Connection::open(dir.path().join("jobs.db")).unwrap();
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM listings WHERE source = 'Mirrored'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    let status: String = conn
        .query_row("SELECT status FROM runs ORDER BY id DESC LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap();

    assert_eq!(count, 4);
    assert_eq!(status, "completed");
}

#[tokio::test]
async fn test_browser_only_run_writes_partial_report() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", listing_page("part", 1, true, None)).await;

    let config = create_test_config(
        dir.path(),
        vec![browser_site("Partial", &format!("{}/", server.uri()))],
        vec![SiteConfig {
            name: "Skipped".to_string(),
            url: "https://skipped.test/".to_string(),
            ..Default::default()
        }],
    );
    let sink = build_sink(&config.output, "test-hash").unwrap();
    let coordinator = Coordinator::from_config(config, Arc::new(sink)).unwrap();
    let report = coordinator.run_browser_jobs().await.unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].site, "Partial");
    assert!(dir.path().join("crawlee_summary.json").exists());
    assert!(!dir.path().join(FULL_REPORT_FILE).exists());
}

#[test]
fn test_parsed_roster_assigns_engines() {
    let config = parse_config(
        r#"
        [[sites.browser]]
        name = "RemoteOK"
        url = "https://remoteok.com/remote-dev-jobs"

        [sites.browser.selectors]
        job-container = "tr.job"
        job-title = "h2"
        company = "h3"
        location = ".location"
        salary = ".salary"

        [[sites.subprocess]]
        name = "WeWorkRemotely"
        url = "https://weworkremotely.com/"
        "#,
    )
    .unwrap();

    let engines: Vec<(&str, EngineKind)> = config
        .sites
        .iter()
        .map(|s| (s.name.as_str(), s.engine))
        .collect();
    assert_eq!(
        engines,
        [
            ("RemoteOK", EngineKind::Browser),
            ("WeWorkRemotely", EngineKind::Subprocess)
        ]
    );
}
