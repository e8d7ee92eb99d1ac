//! Lane classification
//!
//! Decides which of the three outcomes a request gets. The API prefix
//! always wins; after that only the asset extension and the crawler
//! signature matter.

use super::crawlers::CrawlerSignatures;
use super::request::RequestDescriptor;
use crate::http::mime;

/// Extensions always served as real bytes, even to crawlers
pub const DEFAULT_ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "css", "js", "map", "txt", "xml",
];

/// The mutually exclusive outcome category of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    /// Locally generated JSON
    Api,
    /// Static asset, or the SPA shell on a miss
    AssetOrSpa,
    /// Proxied to the upstream rendering service
    RenderProxy,
}

impl Lane {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::AssetOrSpa => "asset",
            Self::RenderProxy => "render",
        }
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only classification policy, built once at startup
#[derive(Debug, Clone)]
pub struct Classifier {
    api_prefix: String,
    crawlers: CrawlerSignatures,
    asset_extensions: Vec<String>,
}

impl Classifier {
    pub fn new<I, S>(api_prefix: &str, crawlers: CrawlerSignatures, asset_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            api_prefix: api_prefix.to_string(),
            crawlers,
            asset_extensions: asset_extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    /// Assign the request to exactly one lane
    pub fn classify(&self, request: &RequestDescriptor) -> Lane {
        if self.is_api_path(&request.path) {
            return Lane::Api;
        }
        if !self.crawlers.matches(request.user_agent()) || self.is_asset_path(&request.path) {
            return Lane::AssetOrSpa;
        }
        Lane::RenderProxy
    }

    pub fn is_api_path(&self, path: &str) -> bool {
        path.starts_with(&self.api_prefix)
    }

    pub fn is_asset_path(&self, path: &str) -> bool {
        mime::extension_of(path).is_some_and(|ext| {
            self.asset_extensions
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new("/api/", CrawlerSignatures::default(), DEFAULT_ASSET_EXTENSIONS)
    }
}
