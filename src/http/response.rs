//! HTTP response building module
//!
//! Builders for the status responses the dispatcher emits itself. Every
//! builder yields a well-formed response even if a header is rejected.

use hyper::body::Bytes;
use hyper::header::{CACHE_CONTROL, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use hyper::{Response, StatusCode};

use super::cache::CachePolicy;
use super::range::ByteRange;
use super::Body;

/// Build a plain-text response with the given status
pub fn build_text_response(status: StatusCode, text: &'static str) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(X_CONTENT_TYPE_OPTIONS, "nosniff")
        .body(Body::new(Bytes::from_static(text.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            fallback(status, text)
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str, policy: CachePolicy) -> Response<Body> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("ETag", etag)
        .header(CACHE_CONTROL, policy.to_header_value())
        .body(Body::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::NOT_MODIFIED, &e);
            fallback(StatusCode::NOT_MODIFIED, "")
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Body> {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Body> {
    let mut response = build_text_response(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed");
    response
        .headers_mut()
        .insert("Allow", hyper::header::HeaderValue::from_static("GET, HEAD"));
    response
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(total_size: usize) -> Response<Body> {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header("Content-Range", format!("bytes */{total_size}"))
        .body(Body::new(Bytes::from_static(b"Range Not Satisfiable")))
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::RANGE_NOT_SATISFIABLE, &e);
            fallback(StatusCode::RANGE_NOT_SATISFIABLE, "Range Not Satisfiable")
        })
}

/// Build 500 response carrying a short operator-facing reason
pub fn build_500_response(reason: &'static str) -> Response<Body> {
    build_text_response(StatusCode::INTERNAL_SERVER_ERROR, reason)
}

/// Build 502 Bad Gateway response
pub fn build_502_response() -> Response<Body> {
    build_text_response(StatusCode::BAD_GATEWAY, "502 Bad Gateway")
}

/// Build an XML document response that must never be sniffed or cached
pub fn build_xml_response(document: String) -> Response<Body> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/xml")
        .header(X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(CACHE_CONTROL, CachePolicy::NoStore.to_header_value())
        .body(Body::new(Bytes::from(document)))
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::OK, &e);
            fallback(StatusCode::INTERNAL_SERVER_ERROR, "")
        })
}

/// Build a full 200 response for a stored document
pub fn build_document_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    is_head: bool,
) -> Response<Body> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header("Content-Length", content_length)
        .header("Accept-Ranges", "bytes")
        .header("ETag", etag)
        .header(
            CACHE_CONTROL,
            CachePolicy::for_content_type(content_type).to_header_value(),
        )
        .body(Body::new(body))
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::OK, &e);
            fallback(StatusCode::INTERNAL_SERVER_ERROR, "")
        })
}

/// Build 206 Partial Content response
pub fn build_partial_response(
    data: &Bytes,
    content_type: &str,
    etag: &str,
    range: ByteRange,
    is_head: bool,
) -> Response<Body> {
    let body = if is_head {
        Bytes::new()
    } else {
        data.slice(range.start..=range.end)
    };

    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(CONTENT_TYPE, content_type)
        .header("Content-Length", range.length())
        .header("Content-Range", range.content_range(data.len()))
        .header("Accept-Ranges", "bytes")
        .header("ETag", etag)
        .body(Body::new(body))
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::PARTIAL_CONTENT, &e);
            fallback(StatusCode::INTERNAL_SERVER_ERROR, "")
        })
}

fn fallback(status: StatusCode, text: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::new(Bytes::from_static(text.as_bytes())));
    *response.status_mut() = status;
    response
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    tracing::error!(%status, "failed to build response: {error}");
}
