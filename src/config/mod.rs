// Configuration module entry point
// Loads file + environment configuration and builds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

use config::builder::{ConfigBuilder, DefaultState};

pub use state::AppState;
pub use types::{
    ApiConfig, AssetsConfig, Config, LoggingConfig, PerformanceConfig, RenderAttemptConfig,
    RenderConfig, RoutingConfig, ServerConfig, SitemapConfig, DEFAULT_RENDER_BASE_URL,
};

/// Config file looked up when no path is given (extension optional)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Upper bound on the number of numbered sitemap shards probed per index request
pub const MAX_SITEMAP_SHARDS: u32 = 1000;

/// Configuration loading or validation failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid listen address '{addr}': {source}")]
    Address {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from specified file path (without extension)
    /// and the process environment
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Load configuration with an explicit lookup for the `RENDER_*` variables
    pub fn load_with(
        config_path: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("EDGE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.backlog", 1024)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.connection_timeout", 60)?;

        let settings = apply_render_env(builder, lookup)?.build()?;
        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| ConfigError::Address { addr, source })
    }

    /// Reject settings the dispatcher cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.routing.api_prefix.starts_with('/') {
            return Err(invalid("routing.api_prefix must start with '/'"));
        }
        if !self.assets.spa_shell.starts_with('/') {
            return Err(invalid("assets.spa_shell must start with '/'"));
        }
        if !self.sitemap.index_path.starts_with('/') {
            return Err(invalid("sitemap.index_path must start with '/'"));
        }
        if self.render.attempts.is_empty() {
            return Err(invalid("render.attempts must list at least one URL shape"));
        }
        if let Some(attempt) = self
            .render
            .attempts
            .iter()
            .find(|a| !a.template.contains("{target}"))
        {
            return Err(ConfigError::Invalid(format!(
                "render attempt template '{}' has no {{target}} placeholder",
                attempt.template
            )));
        }
        if hyper::header::HeaderName::from_bytes(self.render.token_header.as_bytes()).is_err() {
            return Err(ConfigError::Invalid(format!(
                "render.token_header '{}' is not a valid header name",
                self.render.token_header
            )));
        }
        if !is_http_url(&self.render.base_url) {
            return Err(ConfigError::Invalid(format!(
                "render.base_url '{}' must be an http(s) URL",
                self.render.base_url
            )));
        }
        if let Some(origin) = &self.server.public_origin {
            if !is_http_url(origin) {
                return Err(ConfigError::Invalid(format!(
                    "server.public_origin '{origin}' must be an http(s) URL"
                )));
            }
        }
        if self.sitemap.shard_width > 10 {
            return Err(invalid("sitemap.shard_width must be at most 10"));
        }
        let shards = self.sitemap.shard_max.saturating_sub(self.sitemap.shard_min);
        if shards >= MAX_SITEMAP_SHARDS {
            return Err(ConfigError::Invalid(format!(
                "sitemap shard range {}..={} spans more than {MAX_SITEMAP_SHARDS} shards",
                self.sitemap.shard_min, self.sitemap.shard_max
            )));
        }
        Ok(())
    }
}

/// Map the well-known `RENDER_*` variables onto the `render` section
fn apply_render_env(
    builder: ConfigBuilder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    Ok(builder
        .set_override_option("render.token", present("RENDER_TOKEN"))?
        .set_override_option("render.base_url", present("RENDER_BASE_URL"))?
        .set_override_option("render.debug", present("RENDER_DEBUG").map(|v| is_truthy(&v)))?)
}

/// `1`, `true`, `yes` and `on` enable a flag
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_string())
}
