//! Progress reporting and callbacks for UI integration

use std::sync::Arc;

use serde::Serialize;

use crate::domain::errors::CompressionError;
use crate::domain::model::CompressionAnalytics;

/// Smallest progress step worth reporting
pub const PROGRESS_STEP: f64 = 0.01;

/// Progress callback trait for UI integration
///
/// Only `on_progress` is required. Progress is a fraction in `[0.0, 1.0]` of the
/// effective (post-trim) duration and is reported from the video track only.
pub trait ProgressCallback: Send + Sync {
    /// Called during transcoding with the completed fraction
    fn on_progress(&self, fraction: f64);

    /// Called once the output has been finalized
    fn on_complete(&self, _analytics: &CompressionAnalytics) {}

    /// Called when the run fails
    fn on_error(&self, _error: &CompressionError) {}

    /// Called when the run stops because cancellation was requested
    fn on_cancel(&self) {}
}

/// Adapts a closure into a [`ProgressCallback`]
pub struct FnProgress<F>(F);

impl<F> ProgressCallback for FnProgress<F>
where
    F: Fn(f64) + Send + Sync,
{
    fn on_progress(&self, fraction: f64) {
        (self.0)(fraction)
    }
}

/// Wrap a closure as a shareable progress callback
pub fn progress_fn<F>(f: F) -> Arc<dyn ProgressCallback>
where
    F: Fn(f64) + Send + Sync + 'static,
{
    Arc::new(FnProgress(f))
}

/// Suppresses progress updates smaller than [`PROGRESS_STEP`]
#[derive(Debug, Clone, Default)]
pub struct ProgressThrottle {
    last_reported: f64,
}

impl ProgressThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value to report, if this update should be reported
    pub fn offer(&mut self, fraction: f64) -> Option<f64> {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let reached_end = fraction >= 1.0 && self.last_reported < 1.0;
        if fraction - self.last_reported >= PROGRESS_STEP || reached_end {
            self.last_reported = fraction;
            Some(fraction)
        } else {
            None
        }
    }

    /// Final 100% update, unless one was already reported
    pub fn finish(&mut self) -> Option<f64> {
        self.offer(1.0)
    }

    pub fn last_reported(&self) -> f64 {
        self.last_reported
    }
}

/// Converts rebased sample timestamps into throttled callback invocations
pub struct ProgressReporter {
    callback: Arc<dyn ProgressCallback>,
    throttle: ProgressThrottle,
    effective_duration: f64,
}

impl ProgressReporter {
    pub fn new(callback: Arc<dyn ProgressCallback>, effective_duration_secs: f64) -> Self {
        Self {
            callback,
            throttle: ProgressThrottle::new(),
            effective_duration: effective_duration_secs,
        }
    }

    /// Report the position of a rebased timestamp within the effective duration
    pub fn report_timestamp(&mut self, rebased_secs: f64) {
        let fraction = if self.effective_duration > 0.0 {
            rebased_secs / self.effective_duration
        } else {
            1.0
        };
        if let Some(value) = self.throttle.offer(fraction) {
            self.callback.on_progress(value);
        }
    }

    pub fn finish(&mut self) {
        if let Some(value) = self.throttle.finish() {
            self.callback.on_progress(value);
        }
    }
}

/// Console progress callback for CLI usage
pub struct ConsoleProgressCallback {
    bar_length: usize,
}

impl ConsoleProgressCallback {
    pub fn new() -> Self {
        Self { bar_length: 30 }
    }
}

impl Default for ConsoleProgressCallback {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressCallback for ConsoleProgressCallback {
    fn on_progress(&self, fraction: f64) {
        let filled = (fraction * self.bar_length as f64) as usize;
        let bar = "#".repeat(filled.min(self.bar_length))
            + &"-".repeat(self.bar_length.saturating_sub(filled));
        eprint!("\r[{}] {:>5.1}%", bar, fraction * 100.0);
        if fraction >= 1.0 {
            eprintln!();
        }
    }

    fn on_complete(&self, analytics: &CompressionAnalytics) {
        eprintln!(
            "Completed: {:.2}x smaller in {:.2}s",
            analytics.compression_ratio,
            analytics.processing_time.as_secs_f64()
        );
    }

    fn on_error(&self, error: &CompressionError) {
        eprintln!("\nError: {}", error);
    }

    fn on_cancel(&self) {
        eprintln!("\nCancelled");
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ProgressEvent<'a> {
    Progress { percent: f64, timestamp: String },
    Complete { analytics: &'a CompressionAnalytics, timestamp: String },
    Error { error: String, timestamp: String },
    Cancel { timestamp: String },
}

/// JSON-lines progress callback for structured output
pub struct JsonProgressCallback {
    output_progress_events: bool,
}

impl JsonProgressCallback {
    pub fn new(output_progress_events: bool) -> Self {
        Self {
            output_progress_events,
        }
    }

    fn emit(event: &ProgressEvent<'_>) {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{}", line);
        }
    }

    fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

impl ProgressCallback for JsonProgressCallback {
    fn on_progress(&self, fraction: f64) {
        if self.output_progress_events {
            Self::emit(&ProgressEvent::Progress {
                percent: (fraction * 100.0).min(100.0),
                timestamp: Self::now(),
            });
        }
    }

    fn on_complete(&self, analytics: &CompressionAnalytics) {
        Self::emit(&ProgressEvent::Complete {
            analytics,
            timestamp: Self::now(),
        });
    }

    fn on_error(&self, error: &CompressionError) {
        Self::emit(&ProgressEvent::Error {
            error: error.to_string(),
            timestamp: Self::now(),
        });
    }

    fn on_cancel(&self) {
        Self::emit(&ProgressEvent::Cancel {
            timestamp: Self::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_throttle_skips_small_steps() {
        let mut throttle = ProgressThrottle::new();
        assert_eq!(throttle.offer(0.004), None);
        assert_eq!(throttle.offer(0.012), Some(0.012));
        assert_eq!(throttle.offer(0.015), None);
        assert_eq!(throttle.offer(0.5), Some(0.5));
    }

    #[test]
    fn test_throttle_always_reports_completion_once() {
        let mut throttle = ProgressThrottle::new();
        assert_eq!(throttle.offer(0.995), Some(0.995));
        assert_eq!(throttle.offer(1.0), Some(1.0));
        assert_eq!(throttle.finish(), None);
    }

    #[test]
    fn test_throttle_finish_after_partial() {
        let mut throttle = ProgressThrottle::new();
        throttle.offer(0.97);
        assert_eq!(throttle.finish(), Some(1.0));
    }

    #[test]
    fn test_throttle_clamps() {
        let mut throttle = ProgressThrottle::new();
        assert_eq!(throttle.offer(1.7), Some(1.0));
        assert_eq!(throttle.offer(-3.0), None);
        assert_eq!(throttle.last_reported(), 1.0);
    }

    #[test]
    fn test_reporter_maps_timestamps_to_fraction() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut reporter = ProgressReporter::new(
            progress_fn(move |p| sink.lock().unwrap().push(p)),
            2.0,
        );

        reporter.report_timestamp(0.0);
        reporter.report_timestamp(0.5);
        reporter.report_timestamp(0.505);
        reporter.report_timestamp(1.9);
        reporter.finish();

        assert_eq!(*seen.lock().unwrap(), vec![0.25, 0.95, 1.0]);
    }
}
