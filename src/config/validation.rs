use crate::config::types::{Config, CrawlerConfig, RotationConfig, SiteConfig, SpiderConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
///
/// Selector syntax is not checked here: a broken selector fails only the job
/// of the site that declares it.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_rotation_config(&config.rotation)?;
    validate_spider_config(&config.spider)?;
    validate_output_config(&config.output)?;
    validate_sites(config.sites.iter())?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_concurrent_jobs < 1 || config.max_concurrent_jobs > 16 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_jobs must be between 1 and 16, got {}",
            config.max_concurrent_jobs
        )));
    }

    for (name, secs) in [
        ("request_timeout_secs", config.request_timeout_secs),
        ("navigation_timeout_secs", config.navigation_timeout_secs),
        ("content_timeout_secs", config.content_timeout_secs),
    ] {
        if secs == 0 {
            return Err(ConfigError::Validation(format!("{} must be > 0", name)));
        }
    }

    Ok(())
}

/// Validates user agent and proxy pools
fn validate_rotation_config(config: &RotationConfig) -> Result<(), ConfigError> {
    if config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user_agents cannot contain empty entries".to_string(),
        ));
    }

    for proxy in &config.proxies {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }

    Ok(())
}

/// Validates the external spider invocation
fn validate_spider_config(config: &SpiderConfig) -> Result<(), ConfigError> {
    if config.command.trim().is_empty() {
        return Err(ConfigError::Validation(
            "spider command cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "spider timeout_secs must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if matches!(config.database_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "database_path cannot be empty when set".to_string(),
        ));
    }

    if matches!(config.summary_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates site entries across both roster lists
fn validate_sites<'a>(sites: impl Iterator<Item = &'a SiteConfig>) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for site in sites {
        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site name cannot be empty".to_string(),
            ));
        }

        // Names key the output files, so two sites may not share one
        if !seen.insert(site.file_stem()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site name '{}'",
                site.name
            )));
        }

        validate_site_url(site)?;

        if site.max_pages == Some(0) {
            return Err(ConfigError::Validation(format!(
                "max_pages for '{}' must be >= 1",
                site.name
            )));
        }
    }

    Ok(())
}

/// Validates a site's start URL
fn validate_site_url(site: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&site.url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid URL '{}' for '{}': {}", site.url, site.name, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "URL '{}' for '{}' must use http or https",
            site.url, site.name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str, url: &str) -> SiteConfig {
        SiteConfig {
            name: name.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_crawler_bounds() {
        let mut config = CrawlerConfig::default();
        assert!(validate_crawler_config(&config).is_ok());

        config.max_retries = 0;
        assert!(validate_crawler_config(&config).is_err());

        config = CrawlerConfig {
            max_concurrent_jobs: 0,
            ..Default::default()
        };
        assert!(validate_crawler_config(&config).is_err());

        config = CrawlerConfig {
            content_timeout_secs: 0,
            ..Default::default()
        };
        assert!(validate_crawler_config(&config).is_err());

        config = CrawlerConfig {
            min_delay_ms: 0,
            max_delay_ms: 0,
            ..Default::default()
        };
        assert!(validate_crawler_config(&config).is_ok());
    }

    #[test]
    fn test_validate_proxies() {
        let config = RotationConfig {
            user_agents: vec![],
            proxies: vec!["not a url".to_string()],
        };
        assert!(matches!(
            validate_rotation_config(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_validate_sites() {
        let ok = [site("A", "https://a.example.com/"), site("B", "http://b.example.com/")];
        assert!(validate_sites(ok.iter()).is_ok());

        let dup = [site("Same", "https://a.example.com/"), site("same", "https://b.example.com/")];
        assert!(validate_sites(dup.iter()).is_err());

        let bad_scheme = [site("Ftp", "ftp://example.com/")];
        assert!(validate_sites(bad_scheme.iter()).is_err());

        let unnamed = [site("  ", "https://example.com/")];
        assert!(validate_sites(unnamed.iter()).is_err());
    }
}
