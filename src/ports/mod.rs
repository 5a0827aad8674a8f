// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Something the session can signal to stop early
pub trait Cancellable: Send + Sync {
    fn cancel(&self);
}

/// One decoded track, read in decode order
#[async_trait]
pub trait SampleSource: Send {
    /// Next decoded sample, or `None` once the track is exhausted
    async fn next_sample(&mut self) -> Result<Option<Sample>, CompressionError>;
}

/// One encoder input track with backpressure
#[async_trait]
pub trait SampleSink: Send {
    /// Whether another sample may be appended right now
    fn is_ready_for_more_data(&self) -> bool;

    /// Suspend until the sink signals readiness again
    async fn wait_ready(&mut self) -> Result<(), String>;

    /// Append one sample; an error is fatal for the run
    async fn append(&mut self, sample: Sample) -> Result<(), String>;

    /// No more samples will be appended to this track
    async fn mark_finished(&mut self);
}

/// Final state reported by the container writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterStatus {
    Completed,
    Failed(String),
    Cancelled,
}

/// Container muxer that owns the output file
#[async_trait]
pub trait ContainerWriter: Send {
    async fn finish_writing(&mut self) -> WriterStatus;
}

/// Per-track sample streams of an opened source
pub struct DecoderHandle {
    pub video: Box<dyn SampleSource>,
    pub audio: Option<Box<dyn SampleSource>>,
    pub control: Arc<dyn Cancellable>,
}

/// Per-track sinks and the writer of an opened output
pub struct EncoderHandle {
    pub video: Box<dyn SampleSink>,
    pub audio: Option<Box<dyn SampleSink>>,
    pub writer: Box<dyn ContainerWriter>,
    pub control: Arc<dyn Cancellable>,
}

/// Port for measuring and decoding a source container
#[async_trait]
pub trait DecodePort: Send + Sync {
    /// Measure the source
    async fn probe(&self, source: &Path) -> Result<SourceMediaProfile, CompressionError>;

    /// Open per-track sample streams restricted to `window`
    async fn open(
        &self,
        source: &Path,
        window: TimeWindow,
        with_audio: bool,
    ) -> Result<DecoderHandle, CompressionError>;
}

/// Port for encoding and muxing an output container
#[async_trait]
pub trait EncodePort: Send + Sync {
    /// Open per-track sinks configured for `target`
    async fn open(
        &self,
        output: &Path,
        container: ContainerFormat,
        target: &TargetMediaProfile,
    ) -> Result<EncoderHandle, CompressionError>;
}

/// Port for encoder availability
pub trait CodecCapabilityPort: Send + Sync {
    fn is_supported(&self, codec: VideoCodec) -> bool;
}

/// Port for turning the configured output location into a writable file path
pub trait OutputPathPort: Send + Sync {
    fn resolve(&self, config: &CompressionConfig, source: &Path) -> Result<PathBuf, CompressionError>;
}
