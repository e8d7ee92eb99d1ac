// Application state module
// Runtime objects derived from the configuration, shared read-only by every request

use std::sync::Arc;
use std::time::Duration;

use super::types::Config;
use super::ConfigError;
use crate::api::Catalog;
use crate::handler::render::RenderProxy;
use crate::handler::upstream::{RenderUpstream, UreqUpstream};
use crate::handler::sitemap;
use crate::routing::{Classifier, CrawlerSignatures};
use crate::store::{AssetStore, FsAssetStore};

/// Application state
pub struct AppState {
    pub config: Config,
    pub classifier: Classifier,
    pub assets: Arc<dyn AssetStore>,
    pub render: RenderProxy,
    pub catalog: Catalog,
    /// Sitemap candidates in index order
    pub sitemap_candidates: Vec<String>,
}

impl AppState {
    /// Filesystem store and the real upstream client
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let assets = Arc::new(FsAssetStore::new(
            config.assets.root.clone(),
            config.assets.index_files.clone(),
        ));
        tracing::info!(root = %assets.root().display(), "serving assets");
        let upstream = Arc::new(UreqUpstream::new(Duration::from_secs(config.render.timeout_secs)));
        Self::with_parts(config, assets, upstream)
    }

    /// State over explicit collaborators
    pub fn with_parts(
        config: Config,
        assets: Arc<dyn AssetStore>,
        upstream: Arc<dyn RenderUpstream>,
    ) -> Result<Self, ConfigError> {
        let routing = &config.routing;
        let classifier = Classifier::new(
            &routing.api_prefix,
            CrawlerSignatures::new(&routing.crawler_signatures),
            &routing.asset_extensions,
        );
        let render = RenderProxy::from_config(upstream, &config.render)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let catalog = Catalog::seed(
            config.api.product_count,
            config.api.post_count,
            chrono::Utc::now().date_naive(),
        );
        tracing::debug!(
            products = catalog.products().len(),
            posts = catalog.posts().len(),
            "catalog seeded"
        );
        let sitemap_candidates = sitemap::candidate_paths(&config.sitemap);

        Ok(Self {
            config,
            classifier,
            assets,
            render,
            catalog,
            sitemap_candidates,
        })
    }
}
