// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

use crate::routing::classifier::DEFAULT_ASSET_EXTENSIONS;
use crate::routing::crawlers::DEFAULT_SIGNATURES;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub sitemap: SitemapConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub backlog: i32,
    /// Absolute origin used for generated URLs instead of the Host header
    #[serde(default)]
    pub public_origin: Option<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Upper bound on a connection's lifetime, in seconds
    pub connection_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Static asset store configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory holding the built SPA
    pub root: String,
    pub index_files: Vec<String>,
    /// Document served for unmatched HTML navigations
    pub spa_shell: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: "public".to_string(),
            index_files: vec!["index.html".to_string()],
            spa_shell: "/index.html".to_string(),
        }
    }
}

/// Lane classification configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RoutingConfig {
    pub api_prefix: String,
    pub crawler_signatures: Vec<String>,
    pub asset_extensions: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_prefix: "/api/".to_string(),
            crawler_signatures: DEFAULT_SIGNATURES.iter().map(ToString::to_string).collect(),
            asset_extensions: DEFAULT_ASSET_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Upstream rendering service configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RenderConfig {
    /// Shared secret, required for the render-proxy lane
    pub token: Option<String>,
    pub base_url: String,
    /// Adds diagnostic headers to proxied responses
    pub debug: bool,
    pub timeout_secs: u64,
    pub token_header: String,
    /// URL shapes tried in order against the upstream
    pub attempts: Vec<RenderAttemptConfig>,
}

/// One URL shape; `{base}` and `{target}` are substituted
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RenderAttemptConfig {
    pub template: String,
    #[serde(default = "default_reject_statuses")]
    pub reject_statuses: Vec<u16>,
}

fn default_reject_statuses() -> Vec<u16> {
    vec![400, 404]
}

impl RenderAttemptConfig {
    fn shape(template: &str) -> Self {
        Self {
            template: template.to_string(),
            reject_statuses: default_reject_statuses(),
        }
    }
}

pub const DEFAULT_RENDER_BASE_URL: &str = "https://service.prerender.cloud";

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: DEFAULT_RENDER_BASE_URL.to_string(),
            debug: false,
            timeout_secs: 20,
            token_header: "X-Prerender-Token".to_string(),
            attempts: vec![
                RenderAttemptConfig::shape("{base}/render/{target}"),
                RenderAttemptConfig::shape("{base}/render?url={target}"),
                RenderAttemptConfig::shape("{base}/render?uri={target}"),
            ],
        }
    }
}

/// Sitemap index synthesis configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SitemapConfig {
    pub index_path: String,
    /// Named root documents, probed before the shards
    pub roots: Vec<String>,
    pub shard_prefix: String,
    pub shard_suffix: String,
    pub shard_min: u32,
    pub shard_max: u32,
    /// Zero-padding width of the shard number
    pub shard_width: usize,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            index_path: "/sitemap_index.xml".to_string(),
            roots: vec!["sitemap.xml".to_string(), "sitemap_pages.xml".to_string()],
            shard_prefix: "sitemap_small".to_string(),
            shard_suffix: ".xml".to_string(),
            shard_min: 1,
            shard_max: 20,
            shard_width: 1,
        }
    }
}

/// Demo content API configuration
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    pub product_count: u32,
    pub post_count: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            product_count: 120,
            post_count: 48,
        }
    }
}
