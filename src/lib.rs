//! CompressX video compression library
//!
//! Orchestrates a transcode from a declarative [`CompressionConfig`]: trim window
//! resolution, target settings derivation (dimensions, rotation, bitrate, HDR
//! profile, audio), frame-rate reduction, and concurrent per-track sample
//! pumping with backpressure, cancellation and progress. Codec execution is
//! delegated to decoder and encoder implementations behind the [`ports`] traits.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod planner;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::CompressionError;
pub use domain::model::{
    CompressionAnalytics, CompressionConfig, SourceMediaProfile, TargetMediaProfile, TimeSpec,
    TimeWindow,
};
pub use domain::rules::TimeWindowResolver;
pub use engine::{CompressionOutcome, FrameReducer, ReductionStrategy, TranscodeSession};
pub use planner::TargetSettingsDeriver;
