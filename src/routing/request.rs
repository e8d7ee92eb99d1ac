//! Immutable view of an inbound request
//!
//! Derived once from the hyper request head; routing decisions only read it.

use hyper::header::{ACCEPT, HOST, USER_AGENT};
use hyper::{HeaderMap, Method};

/// Method, path, query and headers of one request
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    /// Scheme and authority the client used, e.g. `https://example.com`
    pub origin: String,
}

impl RequestDescriptor {
    /// Build from a request head
    ///
    /// `public_origin` wins over the `Host` header when set. Otherwise the
    /// scheme comes from `X-Forwarded-Proto` (default `http`).
    pub fn from_parts(parts: &hyper::http::request::Parts, public_origin: Option<&str>) -> Self {
        let origin = public_origin.map_or_else(
            || derive_origin(&parts.uri, &parts.headers),
            |o| o.trim_end_matches('/').to_string(),
        );
        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(ToString::to_string),
            headers: parts.headers.clone(),
            origin,
        }
    }

    /// Convenience constructor for a bare request
    pub fn new(method: Method, path_and_query: &str, origin: &str) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (path_and_query.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            headers: HeaderMap::new(),
            origin: origin.trim_end_matches('/').to_string(),
        }
    }

    /// Builder-style header setter, ignores values that are not valid headers
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            hyper::header::HeaderName::from_bytes(name.as_bytes()),
            hyper::header::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    fn header(&self, name: impl hyper::header::AsHeaderName) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    pub fn user_agent(&self) -> &str {
        self.header(USER_AGENT)
    }

    pub fn accept(&self) -> &str {
        self.header(ACCEPT)
    }

    pub fn accepts_html(&self) -> bool {
        self.accept().contains("text/html")
    }

    /// Safe read methods eligible for the SPA shell
    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// Absolute URL of the requested page: origin, path and query
    pub fn target_url(&self) -> String {
        match &self.query {
            Some(query) => format!("{}{}?{query}", self.origin, self.path),
            None => format!("{}{}", self.origin, self.path),
        }
    }

    /// First value of a query parameter, percent-decoded
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;
        pairs.into_iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

fn derive_origin(uri: &hyper::Uri, headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| uri.scheme_str())
        .unwrap_or("http");
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(hyper::http::uri::Authority::as_str))
        .unwrap_or("localhost");
    format!("{scheme}://{host}")
}
