//! Logger module
//!
//! Provides logging utilities for the dispatcher:
//! - `tracing` subscriber setup
//! - Server lifecycle logging
//! - Access logging with multiple formats

mod format;

pub use format::AccessLogEntry;

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use crate::config::{Config, LoggingConfig};

/// Target used for access log lines
pub const ACCESS_TARGET: &str = "access";

/// Install the global `fmt` subscriber
///
/// `RUST_LOG` wins over `logging.level`. Should be called once at
/// application startup; a second call fails.
pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;
    tracing_subscriber::fmt().with_env_filter(filter).try_init()
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("======================================");
    tracing::info!("Edge dispatcher started");
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Asset root: {}", config.assets.root);
    tracing::info!("API prefix: {}", config.routing.api_prefix);
    tracing::info!("Render service: {}", config.render.base_url);
    if config.render.token.is_none() {
        tracing::warn!("RENDER_TOKEN is not set; crawler page requests will fail with 500");
    }
    if config.render.debug {
        tracing::info!("Render debug headers enabled");
    }
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    if let Some(max) = config.performance.max_connections {
        tracing::info!("Max connections: {max}");
    }
    tracing::info!("======================================");
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    tracing::error!("Failed to serve connection: {err}");
}

pub fn log_connection_timeout(peer_addr: &SocketAddr) {
    tracing::warn!("Connection from {peer_addr} exceeded its lifetime, closing");
}

pub fn log_connection_refused(peer_addr: &SocketAddr, active: usize) {
    tracing::warn!("Connection limit reached ({active} active), refusing {peer_addr}");
}

pub fn log_accept_error(err: &std::io::Error) {
    tracing::error!("Failed to accept connection: {err}");
}

pub fn log_shutdown_started(in_flight: usize) {
    tracing::info!("Shutdown signal received, draining {in_flight} connection(s)");
}

pub fn log_shutdown_complete() {
    tracing::info!("Server stopped");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: ACCESS_TARGET, "{}", entry.format(format));
}
