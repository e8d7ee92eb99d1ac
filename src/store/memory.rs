//! In-memory asset store
//!
//! Holds documents in a map keyed by request path. Paths can be marked as
//! failing to reproduce a flaky store, and every lookup is recorded.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use futures::future::BoxFuture;
use futures::FutureExt;
use hyper::body::Bytes;
use hyper::{Method, Response};

use super::fs::build_stored_response;
use super::{AssetRequest, AssetStore, StoreError};
use crate::http::{self, mime, Body};

#[derive(Debug, Clone)]
struct StoredAsset {
    data: Bytes,
    content_type: String,
}

/// Map-backed asset store
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    assets: HashMap<String, StoredAsset>,
    failing: HashSet<String>,
    served: Mutex<Vec<AssetRequest>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document; the Content-Type is inferred from the path extension
    #[must_use]
    pub fn with_asset(self, path: &str, data: impl Into<Bytes>) -> Self {
        let content_type = mime::get_content_type(mime::extension_of(path));
        self.with_typed_asset(path, data, content_type)
    }

    /// Add a document with an explicit Content-Type
    #[must_use]
    pub fn with_typed_asset(mut self, path: &str, data: impl Into<Bytes>, content_type: &str) -> Self {
        self.assets.insert(
            path.to_string(),
            StoredAsset {
                data: data.into(),
                content_type: content_type.to_string(),
            },
        );
        self
    }

    /// Make every lookup of `path` fail with a store error
    #[must_use]
    pub fn with_failure(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    /// Requests served so far, in arrival order
    pub fn served(&self) -> Vec<AssetRequest> {
        self.served
            .lock()
            .map(|served| served.clone())
            .unwrap_or_default()
    }

    fn lookup(&self, request: &AssetRequest) -> Result<Response<Body>, StoreError> {
        if let Ok(mut served) = self.served.lock() {
            served.push(request.clone());
        }
        if self.failing.contains(&request.path) {
            return Err(StoreError::Unavailable(request.path.clone()));
        }
        if request.method != Method::GET && request.method != Method::HEAD {
            return Ok(http::build_405_response());
        }
        Ok(self.assets.get(&request.path).map_or_else(http::build_404_response, |asset| {
            build_stored_response(request, &asset.data, &asset.content_type)
        }))
    }
}

impl AssetStore for MemoryAssetStore {
    fn fetch<'a>(&'a self, request: &'a AssetRequest) -> BoxFuture<'a, Result<Response<Body>, StoreError>> {
        let result = self.lookup(request);
        async move { result }.boxed()
    }
}
