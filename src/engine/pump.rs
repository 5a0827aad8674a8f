//! Per-track sample pump
//!
//! Moves samples from one decoder track to one encoder track. The pump suspends
//! on the sink's readiness signal and drains samples while the sink accepts
//! them, checking the session stop flag before every pull.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::model::{TimeSpec, TrackKind};
use crate::engine::control::SessionControl;
use crate::engine::frame_reducer::FrameKeepSet;
use crate::engine::progress::ProgressReporter;
use crate::ports::{SampleSink, SampleSource};

/// Pump state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum TrackPumpState {
    Idle,
    Pumping,
    Draining,
    Finished,
    Cancelled,
    Failed(String),
}

impl TrackPumpState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TrackPumpState::Finished | TrackPumpState::Cancelled | TrackPumpState::Failed(_)
        )
    }
}

impl fmt::Display for TrackPumpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackPumpState::Idle => write!(f, "idle"),
            TrackPumpState::Pumping => write!(f, "pumping"),
            TrackPumpState::Draining => write!(f, "draining"),
            TrackPumpState::Finished => write!(f, "finished"),
            TrackPumpState::Cancelled => write!(f, "cancelled"),
            TrackPumpState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Outcome of one pump
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PumpReport {
    pub track: TrackKind,
    pub state: TrackPumpState,
    pub samples_read: u64,
    pub samples_appended: u64,
    pub samples_dropped: u64,
}

/// Walks a [`FrameKeepSet`] alongside the running frame counter
#[derive(Debug, Clone)]
struct KeepFilter {
    indices: Vec<u64>,
    cursor: usize,
    frame: u64,
}

impl KeepFilter {
    fn new(keep: FrameKeepSet) -> Self {
        Self {
            indices: keep.into_inner(),
            cursor: 0,
            frame: 0,
        }
    }

    /// Whether the next frame in decode order is kept
    fn admit(&mut self) -> bool {
        let frame = self.frame;
        self.frame += 1;
        match self.indices.get(self.cursor) {
            Some(&next) if next == frame => {
                self.cursor += 1;
                true
            }
            _ => false,
        }
    }
}

/// Result of one step inside a readiness cycle
enum Step {
    Continue,
    Stop(TrackPumpState),
}

/// Pump for one (decoder track, encoder track) pair
pub struct TrackPump {
    track: TrackKind,
    source: Box<dyn SampleSource>,
    sink: Box<dyn SampleSink>,
    control: SessionControl,
    window_start: TimeSpec,
    keep: Option<KeepFilter>,
    progress: Option<ProgressReporter>,
    state: TrackPumpState,
    samples_read: u64,
    samples_appended: u64,
    samples_dropped: u64,
}

impl TrackPump {
    pub fn new(
        track: TrackKind,
        source: Box<dyn SampleSource>,
        sink: Box<dyn SampleSink>,
        control: SessionControl,
        window_start: TimeSpec,
    ) -> Self {
        Self {
            track,
            source,
            sink,
            control,
            window_start,
            keep: None,
            progress: None,
            state: TrackPumpState::Idle,
            samples_read: 0,
            samples_appended: 0,
            samples_dropped: 0,
        }
    }

    /// Apply frame-keep filtering; ignored for audio
    pub fn with_keep_set(mut self, keep: Option<FrameKeepSet>) -> Self {
        if self.track == TrackKind::Video {
            self.keep = keep.map(KeepFilter::new);
        }
        self
    }

    /// Report progress from this pump; ignored for audio
    pub fn with_progress(mut self, progress: Option<ProgressReporter>) -> Self {
        if self.track == TrackKind::Video {
            self.progress = progress;
        }
        self
    }

    pub fn state(&self) -> &TrackPumpState {
        &self.state
    }

    /// Run until a terminal state is reached
    pub async fn run(mut self) -> PumpReport {
        self.transition(TrackPumpState::Pumping);

        let terminal = loop {
            if self.control.should_stop() {
                break self.stop_cancelled().await;
            }
            if let Err(reason) = self.sink.wait_ready().await {
                if self.control.should_stop() {
                    break self.stop_cancelled().await;
                }
                break TrackPumpState::Failed(format!("{} encoder not ready: {}", self.track, reason));
            }

            let mut outcome = None;
            while self.sink.is_ready_for_more_data() {
                if let Step::Stop(state) = self.step().await {
                    outcome = Some(state);
                    break;
                }
            }
            if let Some(state) = outcome {
                break state;
            }
        };

        if matches!(terminal, TrackPumpState::Failed(_)) {
            self.control.abort();
        }
        self.transition(terminal);

        PumpReport {
            track: self.track,
            state: self.state.clone(),
            samples_read: self.samples_read,
            samples_appended: self.samples_appended,
            samples_dropped: self.samples_dropped,
        }
    }

    async fn step(&mut self) -> Step {
        if self.control.should_stop() {
            return Step::Stop(self.stop_cancelled().await);
        }

        let sample = match self.source.next_sample().await {
            Ok(Some(sample)) => sample,
            Ok(None) => {
                // a cancelled decoder also ends its tracks early
                if self.control.should_stop() {
                    return Step::Stop(self.stop_cancelled().await);
                }
                self.transition(TrackPumpState::Draining);
                self.sink.mark_finished().await;
                if let Some(progress) = self.progress.as_mut() {
                    progress.finish();
                }
                return Step::Stop(TrackPumpState::Finished);
            }
            Err(err) => {
                return Step::Stop(TrackPumpState::Failed(format!(
                    "{} decode failed: {}",
                    self.track, err
                )));
            }
        };
        self.samples_read += 1;

        if let Some(keep) = self.keep.as_mut() {
            if !keep.admit() {
                self.samples_dropped += 1;
                return Step::Continue;
            }
        }

        let sample = sample.rebased(self.window_start);
        if let Some(progress) = self.progress.as_mut() {
            progress.report_timestamp(sample.pts.as_seconds());
        }

        match self.sink.append(sample).await {
            Ok(()) => {
                self.samples_appended += 1;
                Step::Continue
            }
            Err(reason) => {
                warn!(track = %self.track, %reason, "Encoder rejected sample");
                Step::Stop(TrackPumpState::Failed(format!(
                    "{} append failed: {}",
                    self.track, reason
                )))
            }
        }
    }

    async fn stop_cancelled(&mut self) -> TrackPumpState {
        self.sink.mark_finished().await;
        TrackPumpState::Cancelled
    }

    fn transition(&mut self, next: TrackPumpState) {
        debug!(track = %self.track, from = %self.state, to = %next, "Pump state change");
        self.state = next;
    }
}
