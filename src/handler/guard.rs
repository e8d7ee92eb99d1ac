//! Content-Type guard for robots and sitemap documents
//!
//! The store's MIME inference is not trusted for these paths. The guard
//! forces the canonical type after resolution; status and body pass
//! through untouched.

use hyper::header::{HeaderValue, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use hyper::Response;

use crate::http::{mime, Body};

const ROBOTS_PATH: &str = "/robots.txt";

/// `/robots.txt` and top-level `/sitemap*.xml`
pub fn is_guarded(path: &str) -> bool {
    if path == ROBOTS_PATH {
        return true;
    }
    path.strip_prefix("/sitemap")
        .and_then(|rest| rest.strip_suffix(".xml"))
        .is_some_and(|middle| !middle.contains('/'))
}

/// Canonical Content-Type for a guarded path
pub fn canonical_content_type(path: &str) -> Option<&'static str> {
    is_guarded(path).then(|| mime::get_content_type(mime::extension_of(path)))
}

/// Rewrite the Content-Type of a document response
///
/// Error responses keep their own type; their body is not the document.
pub fn apply(path: &str, mut response: Response<Body>) -> Response<Body> {
    let Some(content_type) = canonical_content_type(path) else {
        return response;
    };
    let status = response.status();
    if !(status.is_success() || status == hyper::StatusCode::NOT_MODIFIED) {
        return response;
    }
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    response
}
