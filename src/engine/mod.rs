//! Core transcode engine module

pub mod analytics;
pub mod control;
pub mod frame_reducer;
pub mod progress;
pub mod pump;
pub mod session;

pub use analytics::{AnalyticsAggregator, AnalyticsInput};
pub use control::SessionControl;
pub use frame_reducer::{
    EvenlySpaced, FrameKeepSet, FrameReducer, RandomReducer, ReductionStrategy, SceneAware,
};
pub use progress::{
    progress_fn, ConsoleProgressCallback, JsonProgressCallback, ProgressCallback,
    ProgressReporter, ProgressThrottle,
};
pub use pump::{PumpReport, TrackPump, TrackPumpState};
pub use session::{CompressionOutcome, TranscodeSession};
