//! Known crawler identities
//!
//! A fixed set of identifiers matched case-insensitively as substrings of
//! the `User-Agent` header.

/// Crawlers that receive prerendered HTML instead of the SPA shell
pub const DEFAULT_SIGNATURES: &[&str] = &[
    "Googlebot",
    "Bingbot",
    "LinkedInBot",
    "Twitterbot",
    "facebookexternalhit",
    "Slackbot",
    "WhatsApp",
    "DuckDuckBot",
    "YandexBot",
    "Discordbot",
];

/// Lower-cased crawler identifiers with a single matching entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlerSignatures {
    needles: Vec<String>,
}

impl CrawlerSignatures {
    pub fn new<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut needles: Vec<String> = signatures
            .into_iter()
            .map(|s| s.as_ref().trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        needles.sort();
        needles.dedup();
        Self { needles }
    }

    /// Whether the user agent identifies a known crawler
    pub fn matches(&self, user_agent: &str) -> bool {
        if user_agent.is_empty() {
            return false;
        }
        let haystack = user_agent.to_ascii_lowercase();
        self.needles.iter().any(|needle| haystack.contains(needle.as_str()))
    }

    pub fn len(&self) -> usize {
        self.needles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.needles.is_empty()
    }
}

impl Default for CrawlerSignatures {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNATURES)
    }
}
