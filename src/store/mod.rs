//! Asset store module
//!
//! The static asset store is a key→content lookup keyed by request path.
//! It is authoritative for existence: a 2xx answer means the document
//! exists, anything else means it does not.

mod fs;
mod memory;

pub use fs::FsAssetStore;
pub use memory::MemoryAssetStore;

use futures::future::BoxFuture;
use hyper::{HeaderMap, Method, Response};

use crate::http::Body;

/// A lookup against the asset store
///
/// Carries the caller's headers unchanged so conditional and range
/// semantics survive the dispatch.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
}

impl AssetRequest {
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
        }
    }

    /// Header-less `HEAD` lookup used by existence probes
    pub fn probe(path: impl Into<String>) -> Self {
        Self::new(Method::HEAD, path, HeaderMap::new())
    }

    /// Same request re-targeted at another document
    pub fn retarget(&self, path: impl Into<String>) -> Self {
        Self::new(self.method.clone(), path, self.headers.clone())
    }

    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Failure of the store itself, as opposed to a missing document
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("asset store I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("asset store unavailable for {0}")]
    Unavailable(String),
}

/// Read-only asset lookup shared by every request
pub trait AssetStore: Send + Sync {
    fn fetch<'a>(&'a self, request: &'a AssetRequest) -> BoxFuture<'a, Result<Response<Body>, StoreError>>;
}
