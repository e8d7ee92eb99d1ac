//! Request classification module
//!
//! Every inbound request is assigned exactly one lane before any I/O happens.

pub mod classifier;
pub mod crawlers;
pub mod request;

pub use classifier::{Classifier, Lane};
pub use crawlers::CrawlerSignatures;
pub use request::RequestDescriptor;
