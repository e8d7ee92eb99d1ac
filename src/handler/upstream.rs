//! Upstream rendering service transport
//!
//! The render proxy talks to the upstream through [`RenderUpstream`] so the
//! attempt sequencing can run against a stub. [`UreqUpstream`] is the real
//! client.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::Response;
use ureq::Agent;

use crate::http::Body;

/// Headers that describe the upstream connection rather than the document
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "upgrade",
    "te",
    "trailer",
    // The body is re-framed (and possibly decoded) before it is forwarded
    "content-length",
    "content-encoding",
];

/// Render proxy failure that is not an upstream answer
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The shared secret is not configured; a deployment problem
    #[error("render token is not configured")]
    MissingToken,

    /// No upstream status at all: connection, TLS or timeout failure
    #[error("upstream request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("cannot forward {0} header: invalid value")]
    InvalidHeader(&'static str),

    #[error("no render attempts configured")]
    NoAttempts,
}

/// One GET against the rendering service
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub url: String,
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

/// Transport seam for the render proxy
pub trait RenderUpstream: Send + Sync {
    /// Perform the request; any HTTP status is an `Ok` answer
    fn get<'a>(&'a self, request: &'a UpstreamRequest) -> BoxFuture<'a, Result<Response<Body>, RenderError>>;
}

/// Blocking `ureq` agent driven from tokio's blocking pool
#[derive(Debug, Clone)]
pub struct UreqUpstream {
    agent: Agent,
}

impl UreqUpstream {
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl RenderUpstream for UreqUpstream {
    fn get<'a>(&'a self, request: &'a UpstreamRequest) -> BoxFuture<'a, Result<Response<Body>, RenderError>> {
        let agent = self.agent.clone();
        let owned = request.clone();
        async move {
            let url = owned.url.clone();
            tokio::task::spawn_blocking(move || fetch_blocking(&agent, &owned))
                .await
                .map_err(|e| RenderError::Transport {
                    url,
                    reason: e.to_string(),
                })?
        }
        .boxed()
    }
}

fn fetch_blocking(agent: &Agent, request: &UpstreamRequest) -> Result<Response<Body>, RenderError> {
    let transport = |e: ureq::Error| RenderError::Transport {
        url: request.url.clone(),
        reason: e.to_string(),
    };

    let mut call = agent.get(&request.url);
    for (name, value) in &request.headers {
        call = call.header(name.as_str(), value.as_bytes());
    }
    let (parts, mut body) = call.call().map_err(transport)?.into_parts();
    let data = body.read_to_vec().map_err(transport)?;

    let mut response = Response::new(Body::new(Bytes::from(data)));
    *response.status_mut() = parts.status;
    for (name, value) in &parts.headers {
        if !is_hop_by_hop(name) {
            response.headers_mut().append(name.clone(), value.clone());
        }
    }
    Ok(response)
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.iter().any(|h| name.as_str().eq_ignore_ascii_case(h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hop_by_hop_headers_are_dropped() {
        assert!(is_hop_by_hop(&HeaderName::from_static("transfer-encoding")));
        assert!(is_hop_by_hop(&HeaderName::from_static("content-length")));
        assert!(!is_hop_by_hop(&HeaderName::from_static("content-type")));
        assert!(!is_hop_by_hop(&HeaderName::from_static("x-prerender-requestid")));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        let upstream = UreqUpstream::new(Duration::from_secs(2));
        let request = UpstreamRequest {
            url: "http://127.0.0.1:9/render/x".to_string(),
            headers: Vec::new(),
        };
        let result = upstream.get(&request).await;
        assert!(matches!(result, Err(RenderError::Transport { .. })));
    }
}
