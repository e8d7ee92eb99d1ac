//! Render proxy client
//!
//! Crawlers asking for pages get HTML from an upstream rendering service.
//! The upstream's URL convention is not guaranteed, so a list of shapes is
//! tried in order. Only a status in a shape's reject set moves on to the
//! next shape; any other answer is final and returned as-is. When every
//! shape is rejected the last answer stands.

use std::sync::Arc;

use hyper::header::{HeaderName, HeaderValue, USER_AGENT};
use hyper::{Response, StatusCode};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::upstream::{RenderError, RenderUpstream, UpstreamRequest};
use crate::config::{RenderAttemptConfig, RenderConfig};
use crate::http::Body;

/// Characters left alone by `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// One URL shape and the statuses that mean "wrong shape"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderAttempt {
    template: String,
    reject_statuses: Vec<StatusCode>,
}

impl RenderAttempt {
    pub fn new(template: &str, reject_statuses: impl IntoIterator<Item = u16>) -> Self {
        Self {
            template: template.to_string(),
            reject_statuses: reject_statuses
                .into_iter()
                .filter_map(|code| StatusCode::from_u16(code).ok())
                .collect(),
        }
    }

    /// Substitute `{base}` and the already-encoded `{target}`
    pub fn url(&self, base_url: &str, encoded_target: &str) -> String {
        self.template
            .replace("{base}", base_url.trim_end_matches('/'))
            .replace("{target}", encoded_target)
    }

    pub fn rejects(&self, status: StatusCode) -> bool {
        self.reject_statuses.contains(&status)
    }
}

impl From<&RenderAttemptConfig> for RenderAttempt {
    fn from(cfg: &RenderAttemptConfig) -> Self {
        Self::new(&cfg.template, cfg.reject_statuses.iter().copied())
    }
}

/// Progress through the attempt list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Unattempted,
    /// Waiting on the answer for shape `n`
    Trying(usize),
    /// The upstream accepted the shape and answered 2xx/3xx
    Success,
    /// The upstream accepted the shape but failed; no other shape would help
    OtherFailure,
    /// Every shape was rejected; the last answer is returned
    Exhausted,
}

impl AttemptState {
    /// Leave `Unattempted` for the first shape
    #[must_use]
    pub const fn start(self, attempt_count: usize) -> Self {
        match self {
            Self::Unattempted if attempt_count == 0 => Self::Exhausted,
            Self::Unattempted => Self::Trying(0),
            other => other,
        }
    }

    /// Feed the status answered for the shape being tried
    #[must_use]
    pub fn observe(self, status: StatusCode, attempts: &[RenderAttempt]) -> Self {
        let Self::Trying(index) = self else {
            return self;
        };
        let rejected = attempts.get(index).is_some_and(|a| a.rejects(status));
        if rejected {
            if index + 1 < attempts.len() {
                Self::Trying(index + 1)
            } else {
                Self::Exhausted
            }
        } else if status.is_success() || status.is_redirection() {
            Self::Success
        } else {
            Self::OtherFailure
        }
    }
}

/// Answer of a render proxy run
#[derive(Debug)]
pub struct RenderOutcome {
    pub response: Response<Body>,
    /// Upstream URLs in the order they were requested
    pub attempted: Vec<String>,
    pub state: AttemptState,
}

/// Sequential shape-tolerant client for the rendering service
pub struct RenderProxy {
    upstream: Arc<dyn RenderUpstream>,
    attempts: Vec<RenderAttempt>,
    token_header: HeaderName,
    debug: bool,
}

impl RenderProxy {
    pub fn new(
        upstream: Arc<dyn RenderUpstream>,
        attempts: Vec<RenderAttempt>,
        token_header: HeaderName,
        debug: bool,
    ) -> Self {
        Self {
            upstream,
            attempts,
            token_header,
            debug,
        }
    }

    pub fn from_config(upstream: Arc<dyn RenderUpstream>, cfg: &RenderConfig) -> Result<Self, RenderError> {
        let token_header = HeaderName::from_bytes(cfg.token_header.as_bytes())
            .map_err(|_| RenderError::InvalidHeader("token"))?;
        let attempts = cfg.attempts.iter().map(RenderAttempt::from).collect();
        Ok(Self::new(upstream, attempts, token_header, cfg.debug))
    }

    /// Render `target_url` for a crawler identified by `user_agent`
    pub async fn render(
        &self,
        target_url: &str,
        user_agent: &str,
        token: Option<&str>,
        base_url: &str,
    ) -> Result<RenderOutcome, RenderError> {
        let token = token.filter(|t| !t.is_empty()).ok_or(RenderError::MissingToken)?;
        let headers = vec![
            (
                USER_AGENT,
                HeaderValue::from_str(user_agent).map_err(|_| RenderError::InvalidHeader("user-agent"))?,
            ),
            (
                self.token_header.clone(),
                HeaderValue::from_str(token).map_err(|_| RenderError::InvalidHeader("token"))?,
            ),
        ];
        let encoded_target = utf8_percent_encode(target_url, URI_COMPONENT).to_string();

        let mut state = AttemptState::Unattempted.start(self.attempts.len());
        let mut attempted = Vec::with_capacity(self.attempts.len());
        let mut last = None;

        while let AttemptState::Trying(index) = state {
            let Some(attempt) = self.attempts.get(index) else {
                break;
            };
            let request = UpstreamRequest {
                url: attempt.url(base_url, &encoded_target),
                headers: headers.clone(),
            };
            let response = self.upstream.get(&request).await?;
            state = state.observe(response.status(), &self.attempts);
            tracing::debug!(
                url = %request.url,
                status = response.status().as_u16(),
                next = ?state,
                "render attempt"
            );
            attempted.push(request.url);
            last = Some(response);
        }

        let mut response = last.ok_or(RenderError::NoAttempts)?;
        if self.debug {
            annotate(&mut response, base_url);
        }
        Ok(RenderOutcome {
            response,
            attempted,
            state,
        })
    }
}

/// Diagnostic headers; status and body stay untouched
fn annotate(response: &mut Response<Body>, base_url: &str) {
    let status = response.status().as_u16().to_string();
    let headers = response.headers_mut();
    if let Ok(base) = HeaderValue::from_str(base_url) {
        headers.insert("x-debug-render-base", base);
    }
    if let Ok(status) = HeaderValue::from_str(&status) {
        headers.insert("x-debug-upstream-status", status);
    }
    headers.insert("x-debug-token-present", HeaderValue::from_static("true"));
}
