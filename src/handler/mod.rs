//! Request handler module
//!
//! Responsible for request routing dispatch and the per-lane behaviour:
//! asset resolution with SPA fallback, the render proxy, the sitemap
//! index and the content-type guard.

pub mod guard;
pub mod render;
pub mod router;
pub mod sitemap;
pub mod spa;
pub mod upstream;

// Re-export main entry point
pub use router::{dispatch, handle_request};
