//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: lane classification, the
//! fixed document routes and per-lane dispatch.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use hyper::body::Body as _;
use hyper::{Method, Request, Response};

use super::render::RenderOutcome;
use super::upstream::RenderError;
use super::spa::Resolution;
use super::{guard, sitemap, spa};
use crate::api;
use crate::config::AppState;
use crate::http::{self, Body};
use crate::logger::{self, AccessLogEntry};
use crate::routing::{Lane, RequestDescriptor};

/// Main entry point for HTTP request handling
///
/// The request body is never read. Every failure is turned into a
/// response, so the service never errors.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Body>, Infallible> {
    let received_at = Local::now();
    let started = Instant::now();
    let (parts, _body) = req.into_parts();
    let request = RequestDescriptor::from_parts(&parts, state.config.server.public_origin.as_deref());

    let (lane, response) = dispatch(&request, &state).await;

    if state.config.logging.access_log {
        let mut entry = access_entry(&request, remote_addr, received_at, lane, &response);
        entry.http_version = version_label(parts.version).to_string();
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Access log entry for a finished request, stamped with its arrival time
fn access_entry(
    request: &RequestDescriptor,
    remote_addr: SocketAddr,
    received_at: DateTime<Local>,
    lane: Lane,
    response: &Response<Body>,
) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        received_at,
        request.method.to_string(),
        request.path.clone(),
        lane,
    );
    entry.query.clone_from(&request.query);
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.referer = header_string(request, "referer");
    entry.user_agent = header_string(request, "user-agent");
    entry
}

/// Route one request and report the lane it was assigned
pub async fn dispatch(request: &RequestDescriptor, state: &AppState) -> (Lane, Response<Body>) {
    let lane = state.classifier.classify(request);
    tracing::debug!(method = %request.method, path = %request.path, %lane, "classified");

    let response = match lane {
        Lane::Api => api::handle_api(request, state.classifier.api_prefix(), &state.catalog),
        _ if request.path == state.config.sitemap.index_path => serve_sitemap_index(request, state).await,
        _ if guard::is_guarded(&request.path) => {
            match spa::resolve_asset(state.assets.as_ref(), request, &state.config.assets.spa_shell).await {
                Resolution::Found(response) => guard::apply(&request.path, response),
                other => other.into_response(),
            }
        }
        Lane::AssetOrSpa => spa::resolve(state.assets.as_ref(), request, &state.config.assets.spa_shell).await,
        Lane::RenderProxy => serve_rendered(request, state).await,
    };
    (lane, response)
}

async fn serve_sitemap_index(request: &RequestDescriptor, state: &AppState) -> Response<Body> {
    if request.method != Method::GET && request.method != Method::HEAD {
        return http::build_405_response();
    }
    let index = sitemap::synthesize_index(
        state.assets.as_ref(),
        &state.sitemap_candidates,
        &request.origin,
        chrono::Utc::now().date_naive(),
    )
    .await;
    tracing::debug!(entries = index.len(), "sitemap index synthesized");
    http::build_xml_response(index.to_xml())
}

async fn serve_rendered(request: &RequestDescriptor, state: &AppState) -> Response<Body> {
    let render = &state.config.render;
    let result = state
        .render
        .render(
            &request.target_url(),
            request.user_agent(),
            render.token.as_deref(),
            &render.base_url,
        )
        .await;

    match result {
        Ok(RenderOutcome {
            response,
            attempted,
            state: verdict,
        }) => {
            tracing::debug!(attempts = attempted.len(), ?verdict, "render proxy finished");
            response
        }
        Err(RenderError::MissingToken) => {
            tracing::error!(path = %request.path, "crawler request but RENDER_TOKEN is not configured");
            http::build_500_response("Missing RENDER_TOKEN")
        }
        Err(e @ RenderError::Transport { .. }) => {
            tracing::error!(error = %e, "render service unreachable");
            http::build_502_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "render proxy misconfigured");
            http::build_500_response("Render proxy misconfigured")
        }
    }
}

fn header_string(request: &RequestDescriptor, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
