//! Asset lookup with SPA shell fallback

use hyper::{Response, StatusCode};

use crate::http::{self, Body};
use crate::routing::RequestDescriptor;
use crate::store::{AssetRequest, AssetStore};

/// How a request was answered by the store
pub enum Resolution {
    /// The store's own answer for the requested path
    Found(Response<Body>),
    /// The shell document stood in for a missing page
    Shell(Response<Body>),
    /// Nothing to serve; carries the 404 to send
    Missing(Response<Body>),
}

impl Resolution {
    pub fn into_response(self) -> Response<Body> {
        match self {
            Self::Found(response) | Self::Shell(response) | Self::Missing(response) => response,
        }
    }
}

/// Look the request up in the store, falling back to the shell for HTML navigations
pub async fn resolve(store: &dyn AssetStore, request: &RequestDescriptor, shell: &str) -> Response<Body> {
    resolve_asset(store, request, shell).await.into_response()
}

/// Like [`resolve`], but reports whether the shell was substituted
///
/// A store failure is handled like a miss so the fallback rule still applies.
pub async fn resolve_asset(store: &dyn AssetStore, request: &RequestDescriptor, shell: &str) -> Resolution {
    let lookup = AssetRequest::new(request.method.clone(), request.path.clone(), request.headers.clone());
    let response = match store.fetch(&lookup).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => return Resolution::Found(response),
        Ok(response) => Some(response),
        Err(e) => {
            tracing::warn!(path = %request.path, error = %e, "asset lookup failed");
            None
        }
    };

    if !(request.is_get() && request.accepts_html()) {
        return Resolution::Missing(response.unwrap_or_else(http::build_404_response));
    }

    tracing::debug!(path = %request.path, shell, "serving SPA shell");
    match store.fetch(&lookup.retarget(shell)).await {
        Ok(shell_response) => Resolution::Shell(shell_response),
        Err(e) => {
            tracing::error!(shell, error = %e, "SPA shell lookup failed");
            Resolution::Missing(http::build_404_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAssetStore;
    use http_body_util::BodyExt;
    use hyper::Method;

    const SHELL: &[u8] = b"<!doctype html><div id=\"root\"></div>";

    fn store() -> MemoryAssetStore {
        MemoryAssetStore::new()
            .with_asset("/index.html", SHELL)
            .with_asset("/app.js", "console.log(1)")
            .with_failure("/flaky")
    }

    fn get(path: &str, accept: &str) -> RequestDescriptor {
        RequestDescriptor::new(Method::GET, path, "https://example.com").with_header("accept", accept)
    }

    #[tokio::test]
    async fn test_deep_link_gets_shell() {
        let store = store();
        let req = get("/blog/post-7", "text/html,application/xhtml+xml")
            .with_header("accept-language", "de");
        let response = resolve(&store, &req, "/index.html").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], SHELL);

        let served = store.served();
        assert_eq!(served.len(), 2);
        assert_eq!(served[1].path, "/index.html");
        assert_eq!(served[1].headers["accept-language"], "de");
    }

    #[tokio::test]
    async fn test_non_html_client_gets_real_404() {
        let store = store();
        for accept in ["application/json", "*/*", ""] {
            let response = resolve(&store, &get("/missing.png", accept), "/index.html").await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{accept}");
        }
    }

    #[tokio::test]
    async fn test_non_get_never_gets_shell() {
        let store = store();
        let req = RequestDescriptor::new(Method::HEAD, "/blog", "https://example.com")
            .with_header("accept", "text/html");
        let response = resolve(&store, &req, "/index.html").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_existing_asset_is_verbatim() {
        let store = store();
        let response = resolve(&store, &get("/app.js", "text/html"), "/index.html").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/javascript");
        assert_eq!(store.served().len(), 1);
    }

    #[tokio::test]
    async fn test_resolution_tells_shell_from_hit() {
        let store = store();
        let hit = resolve_asset(&store, &get("/app.js", "text/html"), "/index.html").await;
        assert!(matches!(hit, Resolution::Found(_)));

        let shell = resolve_asset(&store, &get("/sitemap_small9.xml", "text/html"), "/index.html").await;
        assert!(matches!(shell, Resolution::Shell(_)));

        let missing = resolve_asset(&store, &get("/sitemap_small9.xml", "*/*"), "/index.html").await;
        assert!(matches!(missing, Resolution::Missing(_)));
    }

    #[tokio::test]
    async fn test_store_failure_is_a_miss() {
        let store = store();
        let html = resolve(&store, &get("/flaky", "text/html"), "/index.html").await;
        assert_eq!(html.status(), StatusCode::OK);

        let json = resolve(&store, &get("/flaky", "application/json"), "/index.html").await;
        assert_eq!(json.status(), StatusCode::NOT_FOUND);
    }
}
