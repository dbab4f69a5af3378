//! robots.txt rules backed by the robotstxt crate

use robotstxt::DefaultMatcher;

/// Rules of one host's robots.txt
///
/// Matching is done on demand because `DefaultMatcher` borrows the body for
/// the duration of a single check.
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    content: Option<String>,
}

impl ParsedRobots {
    /// Rules from a robots.txt body
    pub fn from_content(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
        }
    }

    /// No rules; used when the host serves no robots.txt
    pub fn allow_all() -> Self {
        Self { content: None }
    }

    /// Checks an absolute page URL for a user agent
    ///
    /// Browser-style agents are matched by their product token, so
    /// "Mozilla/5.0 (...)" falls under the `*` group unless a site names
    /// Mozilla explicitly.
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match self.content.as_deref() {
            None | Some("") => true,
            Some(content) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, user_agent, url)
            }
        }
    }
}
