//! HTTP protocol layer module
//!
//! Protocol helpers shared by the asset store, the content API and the
//! render proxy: MIME detection, validators, byte ranges and response builders.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

pub use range::{resolve_range, ByteRange, RangeOutcome};
pub use response::{
    build_304_response, build_404_response, build_405_response, build_416_response,
    build_500_response, build_502_response, build_xml_response,
};

/// Body type used by every response this crate produces
pub type Body = http_body_util::Full<hyper::body::Bytes>;
