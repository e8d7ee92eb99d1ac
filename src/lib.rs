//! Edge request dispatcher for a static single-page application
//!
//! Every request lands in one of three lanes: the JSON content API, the
//! static asset store with SPA shell fallback, or the upstream render
//! service for crawlers asking for pages.

pub mod api;
pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;
pub mod store;
