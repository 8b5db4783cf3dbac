//! scriptcast-core — Pure types and script segmentation.
//!
//! No async runtime, no I/O, no platform dependencies.

pub mod script;
pub mod types;
