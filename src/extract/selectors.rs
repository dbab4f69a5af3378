//! Compiled selector sets and text helpers

use crate::config::SelectorConfig;
use crate::extract::ExtractError;
use crate::url::resolve_href;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Selector defaults a site variant supplies when the roster leaves them out
#[derive(Debug, Clone, Copy)]
pub struct SelectorDefaults {
    pub link: &'static str,
    pub description: Option<&'static str>,
    pub next_page: &'static str,
}

impl SelectorDefaults {
    pub const GENERIC: Self = Self {
        link: "a[href]",
        description: None,
        next_page: "a[rel=\"next\"]",
    };
}

/// Parsed selectors for one site
///
/// Sub-field selectors are optional: an empty selector in the roster simply
/// never matches, and the listing gets the sentinel for that field.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub container: Selector,
    pub title: Option<Selector>,
    pub company: Option<Selector>,
    pub location: Option<Selector>,
    pub salary: Option<Selector>,
    pub description: Option<Selector>,
    pub link: Option<Selector>,
    pub next_page: Option<Selector>,
}

impl CompiledSelectors {
    /// Compiles a roster selector set, filling gaps from `defaults`
    pub fn compile(
        config: &SelectorConfig,
        defaults: SelectorDefaults,
    ) -> Result<Self, ExtractError> {
        if config.job_container.trim().is_empty() {
            return Err(ExtractError::MissingSelector("job-container"));
        }

        let description = config.description.as_deref().or(defaults.description);
        let link = config.link.as_deref().unwrap_or(defaults.link);
        let next_page = config.next_page.as_deref().unwrap_or(defaults.next_page);

        Ok(Self {
            container: parse_selector(&config.job_container)?,
            title: parse_optional(&config.job_title)?,
            company: parse_optional(&config.company)?,
            location: parse_optional(&config.location)?,
            salary: parse_optional(&config.salary)?,
            description: description.map(parse_optional).transpose()?.flatten(),
            link: parse_optional(link)?,
            next_page: parse_optional(next_page)?,
        })
    }
}

/// Parses a selector, mapping failures to `ExtractError::InvalidSelector`
pub fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

fn parse_optional(selector: &str) -> Result<Option<Selector>, ExtractError> {
    if selector.trim().is_empty() {
        Ok(None)
    } else {
        parse_selector(selector).map(Some)
    }
}

/// Text of the first descendant matching `selector`, whitespace-collapsed
pub fn select_text(node: ElementRef<'_>, selector: Option<&Selector>) -> Option<String> {
    let selector = selector?;
    node.select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// Absolute URL of the first descendant anchor matching `selector`
pub fn select_href(node: ElementRef<'_>, selector: Option<&Selector>, base: &Url) -> Option<String> {
    let selector = selector?;
    node.select(selector)
        .filter_map(|element| element.value().attr("href"))
        .find_map(|href| resolve_href(href, base))
}

/// Absolute URL of the first anchor in the document matching `selector`
pub fn document_href(document: &Html, selector: Option<&Selector>, base: &Url) -> Option<String> {
    let selector = selector?;
    document
        .select(selector)
        .filter_map(|element| element.value().attr("href"))
        .find_map(|href| resolve_href(href, base))
}

/// Collapses all text under an element into single-spaced, trimmed text
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
