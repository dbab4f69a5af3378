//! The extraction contract and its site variants
//!
//! Each variant maps a rendered page to listing records and probes for the
//! next result page. Variants are a closed set chosen once per job from the
//! site's roster entry.

use crate::config::SiteConfig;
use crate::crawler::RenderedPage;
use crate::extract::listing::{JobListing, RawListing};
use crate::extract::selectors::{
    document_href, select_href, select_text, CompiledSelectors, SelectorDefaults,
};
use crate::extract::ExtractError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Listings and pagination result for one page
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    pub listings: Vec<JobListing>,
    pub next_page: Option<String>,
}

/// Per-site mapping from a rendered page to listing records
pub trait ExtractionContract: Send + Sync {
    /// Variant name used in logs
    fn name(&self) -> &'static str;

    /// Selector of the repeating listing node
    fn container(&self) -> &Selector;

    /// Maps one listing node to a record; never fails, missing fields get sentinels
    fn map_listing(&self, node: ElementRef<'_>, page_url: &Url) -> JobListing;

    /// Returns the next page's absolute URL, if the page links one
    fn next_page(&self, document: &Html, page_url: &Url) -> Option<String>;

    /// Runs the contract against a whole page
    fn extract(&self, page: &RenderedPage) -> PageExtraction {
        let document = Html::parse_document(&page.html);

        let listings = document
            .select(self.container())
            .map(|node| self.map_listing(node, &page.url))
            .collect();

        PageExtraction {
            listings,
            next_page: self.next_page(&document, &page.url),
        }
    }
}

/// Extractor driven entirely by the roster's selectors
#[derive(Debug, Clone)]
pub struct GenericExtractor {
    source: String,
    selectors: CompiledSelectors,
}

impl GenericExtractor {
    pub fn new(site: &SiteConfig) -> Result<Self, ExtractError> {
        Self::with_defaults(site, SelectorDefaults::GENERIC)
    }

    fn with_defaults(site: &SiteConfig, defaults: SelectorDefaults) -> Result<Self, ExtractError> {
        Ok(Self {
            source: site.name.clone(),
            selectors: CompiledSelectors::compile(&site.selectors, defaults)?,
        })
    }

    fn raw_listing(&self, node: ElementRef<'_>, page_url: &Url) -> RawListing {
        let s = &self.selectors;
        RawListing {
            title: select_text(node, s.title.as_ref()),
            company: select_text(node, s.company.as_ref()),
            url: select_href(node, s.link.as_ref(), page_url),
            description: select_text(node, s.description.as_ref()),
            location: select_text(node, s.location.as_ref()),
            salary: select_text(node, s.salary.as_ref()),
        }
    }
}

impl ExtractionContract for GenericExtractor {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn container(&self) -> &Selector {
        &self.selectors.container
    }

    fn map_listing(&self, node: ElementRef<'_>, page_url: &Url) -> JobListing {
        self.raw_listing(node, page_url)
            .finish(&self.source, page_url.as_str())
    }

    fn next_page(&self, document: &Html, page_url: &Url) -> Option<String> {
        document_href(document, self.selectors.next_page.as_ref(), page_url)
    }
}

/// RemoteOK: listing links live under `/remote-jobs/`, pagination under `.pagination`
#[derive(Debug, Clone)]
pub struct RemoteOkExtractor {
    inner: GenericExtractor,
}

impl RemoteOkExtractor {
    const DEFAULTS: SelectorDefaults = SelectorDefaults {
        link: "a[href*=\"/remote-jobs/\"]",
        description: Some(".description"),
        next_page: ".pagination a.next",
    };

    pub fn new(site: &SiteConfig) -> Result<Self, ExtractError> {
        Ok(Self {
            inner: GenericExtractor::with_defaults(site, Self::DEFAULTS)?,
        })
    }
}

impl ExtractionContract for RemoteOkExtractor {
    fn name(&self) -> &'static str {
        "remoteok"
    }

    fn container(&self) -> &Selector {
        self.inner.container()
    }

    fn map_listing(&self, node: ElementRef<'_>, page_url: &Url) -> JobListing {
        self.inner.map_listing(node, page_url)
    }

    fn next_page(&self, document: &Html, page_url: &Url) -> Option<String> {
        self.inner.next_page(document, page_url)
    }
}

/// WeWorkRemotely: strips "New!" badges and treats every listing as remote
#[derive(Debug, Clone)]
pub struct WeWorkRemotelyExtractor {
    inner: GenericExtractor,
}

impl WeWorkRemotelyExtractor {
    const DEFAULTS: SelectorDefaults = SelectorDefaults {
        link: "a[href]",
        description: None,
        next_page: "a.next_page",
    };

    pub fn new(site: &SiteConfig) -> Result<Self, ExtractError> {
        Ok(Self {
            inner: GenericExtractor::with_defaults(site, Self::DEFAULTS)?,
        })
    }
}

impl ExtractionContract for WeWorkRemotelyExtractor {
    fn name(&self) -> &'static str {
        "weworkremotely"
    }

    fn container(&self) -> &Selector {
        self.inner.container()
    }

    fn map_listing(&self, node: ElementRef<'_>, page_url: &Url) -> JobListing {
        let mut raw = self.inner.raw_listing(node, page_url);

        raw.title = raw
            .title
            .map(|title| title.replace("New!", "").trim().to_string());

        let remote = raw
            .location
            .as_deref()
            .is_some_and(|location| location.to_lowercase().contains("remote"));
        if !remote {
            raw.location = None;
        }

        raw.finish(&self.inner.source, page_url.as_str())
    }

    fn next_page(&self, document: &Html, page_url: &Url) -> Option<String> {
        self.inner.next_page(document, page_url)
    }
}

/// The closed set of extraction variants
#[derive(Debug, Clone)]
pub enum Extractor {
    Generic(GenericExtractor),
    RemoteOk(RemoteOkExtractor),
    WeWorkRemotely(WeWorkRemotelyExtractor),
}

impl Extractor {
    /// Selects and builds the variant for a site
    ///
    /// An explicit `extractor` key must name a known variant. Without one the
    /// site name picks a dedicated variant when there is one, and the generic
    /// extractor otherwise.
    pub fn for_site(site: &SiteConfig) -> Result<Self, ExtractError> {
        let (key, explicit) = match site.extractor.as_deref() {
            Some(name) => (name, true),
            None => (site.name.as_str(), false),
        };

        match variant_key(key).as_str() {
            "remoteok" => Ok(Self::RemoteOk(RemoteOkExtractor::new(site)?)),
            "weworkremotely" => Ok(Self::WeWorkRemotely(WeWorkRemotelyExtractor::new(site)?)),
            "generic" => Ok(Self::Generic(GenericExtractor::new(site)?)),
            _ if explicit => Err(ExtractError::UnknownExtractor(key.to_string())),
            _ => Ok(Self::Generic(GenericExtractor::new(site)?)),
        }
    }

    fn contract(&self) -> &dyn ExtractionContract {
        match self {
            Self::Generic(e) => e,
            Self::RemoteOk(e) => e,
            Self::WeWorkRemotely(e) => e,
        }
    }
}

impl ExtractionContract for Extractor {
    fn name(&self) -> &'static str {
        self.contract().name()
    }

    fn container(&self) -> &Selector {
        self.contract().container()
    }

    fn map_listing(&self, node: ElementRef<'_>, page_url: &Url) -> JobListing {
        self.contract().map_listing(node, page_url)
    }

    fn next_page(&self, document: &Html, page_url: &Url) -> Option<String> {
        self.contract().next_page(document, page_url)
    }
}

/// "We Work Remotely" -> "weworkremotely"
fn variant_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;
    use crate::extract::listing::{SALARY_NOT_SPECIFIED, UNKNOWN_COMPANY};

    fn site(name: &str) -> SiteConfig {
        SiteConfig {
            name: name.to_string(),
            url: "https://board.example.com/jobs".to_string(),
            selectors: SelectorConfig {
                job_container: "li.job".to_string(),
                job_title: ".title".to_string(),
                company: ".company".to_string(),
                location: ".region".to_string(),
                salary: ".salary".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn page(html: &str) -> RenderedPage {
        RenderedPage {
            url: Url::parse("https://board.example.com/jobs").unwrap(),
            html: html.to_string(),
        }
    }

    #[test]
    fn test_generic_extraction_with_missing_salary() {
        let extractor = Extractor::for_site(&site("Board")).unwrap();
        let result = extractor.extract(&page(
            r#"<ul>
                <li class="job"><a href="/job/1"><span class="title">Rust Dev</span></a>
                    <span class="company">Acme</span><span class="region">EU</span></li>
                <li class="job"><span class="title">Go Dev</span>
                    <span class="salary">$100k</span></li>
            </ul>"#,
        ));

        assert_eq!(result.listings.len(), 2);

        let first = &result.listings[0];
        assert_eq!(first.title, "Rust Dev");
        assert_eq!(first.company, "Acme");
        assert_eq!(first.url, "https://board.example.com/job/1");
        assert_eq!(first.salary, SALARY_NOT_SPECIFIED);
        assert_eq!(first.source, "Board");

        let second = &result.listings[1];
        assert_eq!(second.company, UNKNOWN_COMPANY);
        assert_eq!(second.url, "https://board.example.com/jobs");
        assert_eq!(second.salary, "$100k");
        assert_eq!(second.location, "Remote");
    }

    #[test]
    fn test_empty_page_is_not_an_error() {
        let extractor = Extractor::for_site(&site("Board")).unwrap();
        let result = extractor.extract(&page("<html><body>No jobs today</body></html>"));
        assert!(result.listings.is_empty());
        assert!(result.next_page.is_none());
    }

    #[test]
    fn test_generic_next_page_uses_rel_next() {
        let extractor = Extractor::for_site(&site("Board")).unwrap();
        let result = extractor.extract(&page(r#"<a rel="next" href="?page=2">Next</a>"#));
        assert_eq!(
            result.next_page.as_deref(),
            Some("https://board.example.com/jobs?page=2")
        );
    }

    #[test]
    fn test_remoteok_variant() {
        let extractor = Extractor::for_site(&site("RemoteOK")).unwrap();
        assert_eq!(extractor.name(), "remoteok");

        let result = extractor.extract(&page(
            r#"<ul>
                <li class="job"><a href="/company/acme" class="company">Acme</a>
                    <a href="/remote-jobs/42-rust"><span class="title">Rust</span></a>
                    <div class="description">Write Rust</div></li>
            </ul>
            <div class="pagination"><a class="next" href="/remote-dev-jobs?page=2">Next</a></div>"#,
        ));

        let listing = result
            .listings
            .first()
            .expect("one listing should be extracted");
        assert_eq!(listing.url, "https://board.example.com/remote-jobs/42-rust");
        assert_eq!(listing.description, "Write Rust");
        assert_eq!(
            result.next_page.as_deref(),
            Some("https://board.example.com/remote-dev-jobs?page=2")
        );
    }

    #[test]
    fn test_weworkremotely_cleanup() {
        let extractor = Extractor::for_site(&site("We Work Remotely")).unwrap();
        assert_eq!(extractor.name(), "weworkremotely");

        let result = extractor.extract(&page(
            r#"<ul>
                <li class="job"><span class="title">New! Backend Engineer</span>
                    <span class="region">Anywhere in the World</span></li>
                <li class="job"><span class="title">Designer</span>
                    <span class="region">Remote (US)</span></li>
            </ul>
            <a class="next_page" href="/remote-jobs?page=2">Next</a>"#,
        ));

        assert_eq!(result.listings[0].title, "Backend Engineer");
        assert_eq!(result.listings[0].location, "Remote");
        assert_eq!(result.listings[1].location, "Remote (US)");
        assert!(result.next_page.is_some());
    }

    #[test]
    fn test_explicit_extractor_overrides_name() {
        let mut config = site("Some Board");
        config.extractor = Some("remoteok".to_string());
        assert_eq!(Extractor::for_site(&config).unwrap().name(), "remoteok");
    }

    #[test]
    fn test_unknown_explicit_extractor_is_an_error() {
        let mut config = site("Some Board");
        config.extractor = Some("linkedin".to_string());
        assert!(matches!(
            Extractor::for_site(&config),
            Err(ExtractError::UnknownExtractor(_))
        ));
    }

    #[test]
    fn test_unknown_name_falls_back_to_generic() {
        assert_eq!(Extractor::for_site(&site("Tiny Board")).unwrap().name(), "generic");
    }
}
