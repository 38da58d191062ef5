//! Source URL allowlist

/// Domains accepted when no other list is configured
pub const DEFAULT_ALLOWED_DOMAINS: [&str; 3] = ["youtube.com", "youtu.be", "m.youtube.com"];

/// Lightweight check that a submitted URL belongs to a known video host
///
/// Matching is plain substring containment on the raw string, not URL parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAllowlist {
    domains: Vec<String>,
}

impl SourceAllowlist {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains
                .into_iter()
                .map(Into::into)
                .map(|d: String| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Parses a comma separated list such as `youtube.com,youtu.be`
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn is_allowed(&self, url: &str) -> bool {
        self.domains.iter().any(|domain| url.contains(domain.as_str()))
    }
}

impl Default for SourceAllowlist {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_DOMAINS)
    }
}
