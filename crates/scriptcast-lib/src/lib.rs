//! scriptcast-lib — Script-to-speech engine.
//!
//! Synthesis orchestration, speech providers, slide and webpage extraction,
//! and the HTTP API. Depends on scriptcast-core for segmentation and types.

pub mod error;
pub mod orchestrator;
pub mod server;
pub mod slides;
pub mod synth;
pub mod webpage;

pub use error::{Error, Result};

// Re-export scriptcast-core for convenience
pub use scriptcast_core;
