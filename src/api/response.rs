// API response utility functions module

use hyper::body::Bytes;
use hyper::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::types::ApiError;
use crate::http::Body;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

const CORS_HEADERS: &[(&str, &str)] = &[
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, OPTIONS"),
    ("access-control-allow-headers", "Content-Type, Authorization"),
];

/// Build JSON response with the API envelope headers
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Body> {
    match serde_json::to_vec(body) {
        Ok(json) => with_envelope(status, Bytes::from(json)),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize API response");
            with_envelope(
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(br#"{"error":"Internal server error"}"#),
            )
        }
    }
}

/// `{"error": message}` with the given status
pub fn error_response(status: StatusCode, message: &str) -> Response<Body> {
    json_response(status, &ApiError { error: message })
}

pub fn not_found(message: &str) -> Response<Body> {
    error_response(StatusCode::NOT_FOUND, message)
}

pub fn method_not_allowed() -> Response<Body> {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// CORS preflight answer, empty body
pub fn preflight() -> Response<Body> {
    with_envelope(StatusCode::NO_CONTENT, Bytes::new())
}

fn with_envelope(status: StatusCode, body: Bytes) -> Response<Body> {
    let mut response = Response::new(Body::new(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    for (name, value) in CORS_HEADERS {
        headers.insert(*name, HeaderValue::from_static(*value));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_envelope_headers() {
        let response = json_response(StatusCode::OK, &serde_json::json!({"ok": true}));
        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], JSON_CONTENT_TYPE);
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "GET, OPTIONS");
        assert_eq!(headers["access-control-allow-headers"], "Content-Type, Authorization");
        assert_eq!(headers[CACHE_CONTROL], "no-store");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_preflight_is_empty() {
        let response = preflight();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }
}
