//! Filesystem-backed asset store
//!
//! Serves the built SPA from a directory: traversal-safe path mapping,
//! index file resolution, validators and byte ranges.

use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;
use hyper::body::Bytes;
use hyper::{Method, Response};
use percent_encoding::percent_decode_str;
use tokio::fs;

use super::{AssetRequest, AssetStore, StoreError};
use crate::http::{self, cache, mime, Body, RangeOutcome};

/// Asset store rooted at a directory on disk
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    root: PathBuf,
    index_files: Vec<String>,
}

impl FsAssetStore {
    pub fn new(root: impl Into<PathBuf>, index_files: Vec<String>) -> Self {
        Self {
            root: root.into(),
            index_files,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path onto a file below the root
    ///
    /// `Ok(None)` means the document does not exist (or is not reachable
    /// from the root); `Err` means the root itself is unusable.
    async fn locate(&self, path: &str) -> Result<Option<PathBuf>, StoreError> {
        let Ok(decoded) = percent_decode_str(path).decode_utf8() else {
            return Ok(None);
        };
        let relative = decoded.trim_start_matches('/');
        if relative.split('/').any(|segment| segment == "..") {
            tracing::warn!(path, "path traversal attempt blocked");
            return Ok(None);
        }

        let root = fs::canonicalize(&self.root)
            .await
            .map_err(|source| StoreError::Io {
                path: self.root.display().to_string(),
                source,
            })?;

        let mut file_path = root.join(relative);
        let wants_directory = relative.is_empty() || relative.ends_with('/');
        let is_directory = fs::metadata(&file_path).await.is_ok_and(|m| m.is_dir());
        if wants_directory || is_directory {
            let mut found = None;
            for index_file in &self.index_files {
                let candidate = file_path.join(index_file);
                if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
                    found = Some(candidate);
                    break;
                }
            }
            match found {
                Some(index_path) => file_path = index_path,
                None => return Ok(None),
            }
        }

        // File not found is the common case, no need to log it
        let Ok(canonical) = fs::canonicalize(&file_path).await else {
            return Ok(None);
        };
        if !canonical.starts_with(&root) {
            tracing::warn!(
                path,
                resolved = %canonical.display(),
                "path escapes asset root, blocked"
            );
            return Ok(None);
        }
        if !fs::metadata(&canonical).await.is_ok_and(|m| m.is_file()) {
            return Ok(None);
        }
        Ok(Some(canonical))
    }

    async fn serve(&self, request: &AssetRequest) -> Result<Response<Body>, StoreError> {
        if request.method != Method::GET && request.method != Method::HEAD {
            return Ok(http::build_405_response());
        }
        let Some(file_path) = self.locate(&request.path).await? else {
            return Ok(http::build_404_response());
        };

        let data = fs::read(&file_path)
            .await
            .map(Bytes::from)
            .map_err(|source| StoreError::Io {
                path: file_path.display().to_string(),
                source,
            })?;
        let content_type = mime::get_content_type(file_path.extension().and_then(|e| e.to_str()));

        Ok(build_stored_response(request, &data, content_type))
    }
}

impl AssetStore for FsAssetStore {
    fn fetch<'a>(&'a self, request: &'a AssetRequest) -> BoxFuture<'a, Result<Response<Body>, StoreError>> {
        self.serve(request).boxed()
    }
}

/// Apply validators and ranges to a stored document
pub(super) fn build_stored_response(
    request: &AssetRequest,
    data: &Bytes,
    content_type: &str,
) -> Response<Body> {
    let etag = cache::generate_etag(data);
    let is_head = request.method == Method::HEAD;

    if cache::check_etag_match(request.header("if-none-match"), &etag) {
        return http::build_304_response(&etag, cache::CachePolicy::for_content_type(content_type));
    }

    match http::resolve_range(request.header("range"), data.len()) {
        RangeOutcome::Partial(range) => {
            http::response::build_partial_response(data, content_type, &etag, range, is_head)
        }
        RangeOutcome::Unsatisfiable => http::build_416_response(data.len()),
        RangeOutcome::Full => {
            http::response::build_document_response(data.clone(), content_type, &etag, is_head)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::{HeaderMap, StatusCode};

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>shell</html>").unwrap();
        std::fs::write(dir.path().join("robots.txt"), "User-agent: *").unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/index.html"), "<html>docs</html>").unwrap();
        dir
    }

    fn store(dir: &tempfile::TempDir) -> FsAssetStore {
        FsAssetStore::new(dir.path(), vec!["index.html".to_string()])
    }

    async fn body_of(response: Response<Body>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_serves_file_with_mime_type() {
        let dir = site();
        let response = store(&dir)
            .fetch(&AssetRequest::new(Method::GET, "/robots.txt", HeaderMap::new()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(&body_of(response).await[..], b"User-agent: *");
    }

    #[tokio::test]
    async fn test_directory_resolves_index_file() {
        let dir = site();
        let store = store(&dir);
        for path in ["/", "/docs", "/docs/"] {
            let response = store
                .fetch(&AssetRequest::new(Method::GET, path, HeaderMap::new()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "path {path}");
            assert_eq!(response.headers()["cache-control"], "no-cache");
        }
    }

    #[tokio::test]
    async fn test_missing_and_traversal_are_404() {
        let dir = site();
        let store = store(&dir);
        for path in ["/blog/post-1", "/../etc/passwd", "/docs/%2e%2e/%2e%2e/secret"] {
            let response = store
                .fetch(&AssetRequest::new(Method::GET, path, HeaderMap::new()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "path {path}");
        }
    }

    #[tokio::test]
    async fn test_conditional_and_range_requests() {
        let dir = site();
        let store = store(&dir);
        let first = store
            .fetch(&AssetRequest::new(Method::GET, "/robots.txt", HeaderMap::new()))
            .await
            .unwrap();
        let etag = first.headers()["etag"].clone();

        let mut headers = HeaderMap::new();
        headers.insert("if-none-match", etag);
        let cached = store
            .fetch(&AssetRequest::new(Method::GET, "/robots.txt", headers))
            .await
            .unwrap();
        assert_eq!(cached.status(), StatusCode::NOT_MODIFIED);

        let mut headers = HeaderMap::new();
        headers.insert("range", "bytes=0-3".parse().unwrap());
        let partial = store
            .fetch(&AssetRequest::new(Method::GET, "/robots.txt", headers))
            .await
            .unwrap();
        assert_eq!(partial.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(&body_of(partial).await[..], b"User");
    }

    #[tokio::test]
    async fn test_head_and_method_handling() {
        let dir = site();
        let store = store(&dir);
        let head = store
            .fetch(&AssetRequest::probe("/robots.txt"))
            .await
            .unwrap();
        assert_eq!(head.status(), StatusCode::OK);
        assert!(body_of(head).await.is_empty());

        let post = store
            .fetch(&AssetRequest::new(Method::POST, "/robots.txt", HeaderMap::new()))
            .await
            .unwrap();
        assert_eq!(post.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_missing_root_is_store_error() {
        let store = FsAssetStore::new("/nonexistent/spa-edge-root", vec![]);
        let result = store.fetch(&AssetRequest::probe("/index.html")).await;
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }
}
