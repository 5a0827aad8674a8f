//! Transcode session orchestrator
//!
//! Sequences one run: validate, measure, resolve the trim window, derive target
//! settings, open the decoder and encoder, pump every track concurrently, then
//! finalize the output and compute analytics.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::domain::errors::CompressionError;
use crate::domain::model::*;
use crate::domain::rules::TimeWindowResolver;
use crate::engine::analytics::{AnalyticsAggregator, AnalyticsInput};
use crate::engine::control::{RunGuard, SessionControl};
use crate::engine::frame_reducer::FrameReducer;
use crate::engine::progress::{ProgressCallback, ProgressReporter};
use crate::engine::pump::{PumpReport, TrackPump, TrackPumpState};
use crate::planner::TargetSettingsDeriver;
use crate::ports::*;

/// Successful run result
#[derive(Debug, Clone, Serialize)]
pub struct CompressionOutcome {
    pub output_path: PathBuf,
    pub analytics: CompressionAnalytics,
    pub target: TargetMediaProfile,
    pub window: TimeWindow,
}

/// Orchestrates one transcode at a time over the given ports
pub struct TranscodeSession {
    decoder: Arc<dyn DecodePort>,
    encoder: Arc<dyn EncodePort>,
    capabilities: Arc<dyn CodecCapabilityPort>,
    outputs: Arc<dyn OutputPathPort>,
    control: SessionControl,
}

impl TranscodeSession {
    pub fn new(
        decoder: Arc<dyn DecodePort>,
        encoder: Arc<dyn EncodePort>,
        capabilities: Arc<dyn CodecCapabilityPort>,
        outputs: Arc<dyn OutputPathPort>,
    ) -> Self {
        Self {
            decoder,
            encoder,
            capabilities,
            outputs,
            control: SessionControl::new(),
        }
    }

    /// Request cancellation of the current run. Idempotent, callable from any thread.
    pub fn cancel(&self) {
        if self.control.is_running() {
            info!("Cancellation requested");
        }
        self.control.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    /// Transcode `source` according to `config`
    pub async fn run(
        &self,
        source: &Path,
        config: &CompressionConfig,
        reducer: &dyn FrameReducer,
        progress: Option<Arc<dyn ProgressCallback>>,
    ) -> Result<CompressionOutcome, CompressionError> {
        let result = self.run_inner(source, config, reducer, progress.clone()).await;
        if let Some(callback) = progress.as_ref() {
            match &result {
                Ok(outcome) => callback.on_complete(&outcome.analytics),
                Err(err) if err.is_cancelled() => callback.on_cancel(),
                Err(err) => callback.on_error(err),
            }
        }
        result
    }

    async fn run_inner(
        &self,
        source: &Path,
        config: &CompressionConfig,
        reducer: &dyn FrameReducer,
        progress: Option<Arc<dyn ProgressCallback>>,
    ) -> Result<CompressionOutcome, CompressionError> {
        let mut scope = RunScope::new(self.control.begin()?);
        let started = self.control.started_at().unwrap_or_else(Instant::now);

        info!(source = %source.display(), codec = %config.video_codec, "Starting transcode");

        let original_file_size = Self::check_source(source).await?;

        if !self.capabilities.is_supported(config.video_codec) {
            return Err(CompressionError::CodecNotSupported {
                codec: config.video_codec,
            });
        }

        let profile = self.decoder.probe(source).await?;
        profile.validate()?;
        debug!(
            size = %profile.natural_size,
            fps = profile.frame_rate,
            duration = %profile.duration,
            hdr = profile.color.is_hdr(),
            "Probed source"
        );

        let window = TimeWindowResolver::resolve(
            config.trim_start_time,
            config.trim_end_time,
            profile.duration,
        )?;

        let output_path = self.outputs.resolve(config, source)?;
        if matches!(config.output_location(), OutputLocation::SystemDefault) {
            scope.discard_on_exit(&output_path);
        }

        let target = TargetSettingsDeriver::derive(config, &profile);
        let keep = reducer.reduce(
            profile.frame_rate,
            target.frame_rate,
            window.duration.as_seconds(),
        );
        info!(
            output = %output_path.display(),
            window_start = %window.start,
            window_duration = %window.duration,
            encoded = %target.encoded_size(),
            reducer = reducer.name(),
            kept_frames = keep.as_ref().map(|k| k.len()),
            "Resolved transcode plan"
        );

        let decoder = self
            .decoder
            .open(source, window, target.audio.is_some())
            .await?;
        self.control.register(&decoder.control);
        scope.track(decoder.control.clone());

        let encoder = self
            .encoder
            .open(&output_path, config.container, &target)
            .await?;
        self.control.register(&encoder.control);
        scope.track(encoder.control.clone());
        scope.discard_on_exit(&output_path);

        let DecoderHandle {
            video: video_source,
            audio: audio_source,
            ..
        } = decoder;
        let EncoderHandle {
            video: video_sink,
            audio: audio_sink,
            mut writer,
            ..
        } = encoder;

        let reporter = progress.map(|cb| ProgressReporter::new(cb, window.duration.as_seconds()));
        let video_pump = TrackPump::new(
            TrackKind::Video,
            video_source,
            video_sink,
            self.control.clone(),
            window.start,
        )
        .with_keep_set(keep)
        .with_progress(reporter);
        scope.pumps.spawn(video_pump.run());

        match (audio_source, audio_sink) {
            (Some(audio_source), Some(audio_sink)) => {
                let audio_pump = TrackPump::new(
                    TrackKind::Audio,
                    audio_source,
                    audio_sink,
                    self.control.clone(),
                    window.start,
                );
                scope.pumps.spawn(audio_pump.run());
            }
            (None, Some(mut audio_sink)) => {
                warn!("Decoder opened no audio track; finishing the audio input empty");
                audio_sink.mark_finished().await;
            }
            (Some(_), None) => warn!("Encoder opened no audio input; skipping source audio"),
            (None, None) => {}
        }

        let mut reports: Vec<PumpReport> = Vec::with_capacity(scope.pumps.len());
        let mut failure: Option<String> = None;
        while let Some(joined) = scope.pumps.join_next().await {
            match joined {
                Ok(report) => {
                    debug!(
                        track = %report.track,
                        state = %report.state,
                        appended = report.samples_appended,
                        dropped = report.samples_dropped,
                        "Pump finished"
                    );
                    reports.push(report);
                }
                Err(join_err) => {
                    self.control.abort();
                    failure.get_or_insert(format!("pump task failed: {}", join_err));
                }
            }
        }
        if failure.is_none() {
            failure = reports.iter().find_map(|r| match &r.state {
                TrackPumpState::Failed(reason) => Some(reason.clone()),
                _ => None,
            });
        }

        if let Some(reason) = failure {
            warn!(%reason, "Transcode failed, discarding partial output");
            return Err(CompressionError::CompressionFailed(reason));
        }

        if self.control.is_cancelled()
            || reports.iter().any(|r| r.state == TrackPumpState::Cancelled)
        {
            info!("Transcode cancelled, discarding partial output");
            return Err(CompressionError::Cancelled);
        }

        match writer.finish_writing().await {
            WriterStatus::Completed => {}
            WriterStatus::Cancelled => return Err(CompressionError::Cancelled),
            WriterStatus::Failed(reason) => {
                return Err(CompressionError::failed(format!("writer failed: {}", reason)));
            }
        }
        drop(writer);

        let compressed_file_size = tokio::fs::metadata(&output_path)
            .await
            .map(|m| m.len())
            .map_err(|e| CompressionError::failed(format!("output not readable: {}", e)))?;

        let analytics = AnalyticsAggregator::compute(AnalyticsInput {
            original_file_size,
            compressed_file_size,
            processing_time: started.elapsed(),
            source: &profile,
            target: &target,
            effective_duration: window.duration,
        });

        info!(
            output = %output_path.display(),
            original_bytes = analytics.original_file_size,
            compressed_bytes = analytics.compressed_file_size,
            ratio = analytics.compression_ratio,
            elapsed_ms = analytics.processing_time.as_millis() as u64,
            "Transcode completed"
        );

        scope.complete();
        Ok(CompressionOutcome {
            output_path,
            analytics,
            target,
            window,
        })
    }

    /// The source must be an existing regular file; returns its size
    async fn check_source(source: &Path) -> Result<u64, CompressionError> {
        match tokio::fs::metadata(source).await {
            Ok(meta) if meta.is_file() => Ok(meta.len()),
            _ => Err(CompressionError::InvalidSourceLocation {
                path: source.to_path_buf(),
            }),
        }
    }
}

/// Cleanup owned by one run, applied on every exit path
///
/// Also runs when the `run` future is dropped mid-flight. Pumps still in the
/// set are aborted. Unless the run completed, registered handles are cancelled
/// and the partial output is removed.
struct RunScope {
    pumps: JoinSet<PumpReport>,
    handles: Vec<Arc<dyn Cancellable>>,
    discard: Option<PathBuf>,
    completed: bool,
    // dropped after the cleanup in `Drop::drop`
    _run: RunGuard,
}

impl RunScope {
    fn new(run: RunGuard) -> Self {
        Self {
            pumps: JoinSet::new(),
            handles: Vec::new(),
            discard: None,
            completed: false,
            _run: run,
        }
    }

    fn track(&mut self, handle: Arc<dyn Cancellable>) {
        self.handles.push(handle);
    }

    /// Remove `path` unless the run completes
    fn discard_on_exit(&mut self, path: &Path) {
        self.discard = Some(path.to_path_buf());
    }

    fn complete(&mut self) {
        self.completed = true;
        self.discard = None;
    }
}

impl Drop for RunScope {
    fn drop(&mut self) {
        if !self.pumps.is_empty() {
            debug!(pumps = self.pumps.len(), "Aborting unfinished pumps");
            self.pumps.abort_all();
        }
        if self.completed {
            return;
        }
        for handle in &self.handles {
            handle.cancel();
        }
        if let Some(path) = self.discard.take() {
            discard_output(&path);
        }
    }
}

/// Remove a partially written output; a missing file is not an error
fn discard_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
    }
}
