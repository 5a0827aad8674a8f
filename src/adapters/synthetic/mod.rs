// Synthetic media adapter - Deterministic in-process decoder and encoder
//
// The decoder generates timed samples from a SourceMediaProfile instead of
// reading a real container. The encoder shrinks payloads according to the
// target rate and writes them to a simple sample container (see `container`).

pub mod container;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use async_trait::async_trait;
use bytes::BytesMut;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Samples per AAC frame
const AUDIO_FRAME_SAMPLES: f64 = 1024.0;
const DEFAULT_VIDEO_BITRATE: u64 = 4_000_000;
const DEFAULT_AUDIO_BITRATE: u64 = 128_000;
const KEYFRAME_INTERVAL: u64 = 30;

/// Shared stop flag handed to the session
#[derive(Debug, Default)]
pub struct SyntheticControl {
    cancelled: AtomicBool,
}

impl SyntheticControl {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Cancellable for SyntheticControl {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Decoder that fabricates samples for a fixed source profile
pub struct SyntheticDecoder {
    profile: SourceMediaProfile,
    fail_open: Option<String>,
}

impl SyntheticDecoder {
    pub fn new(profile: SourceMediaProfile) -> Self {
        Self {
            profile,
            fail_open: None,
        }
    }

    /// Fail every `open` with the given cause
    pub fn failing_open(mut self, cause: impl Into<String>) -> Self {
        self.fail_open = Some(cause.into());
        self
    }

    pub fn profile(&self) -> &SourceMediaProfile {
        &self.profile
    }
}

struct SyntheticTrack {
    kind: TrackKind,
    start: f64,
    step: f64,
    count: u64,
    next: u64,
    payload_len: usize,
    control: Arc<SyntheticControl>,
}

impl SyntheticTrack {
    fn new(kind: TrackKind, window: TimeWindow, rate: f64, bitrate: u64, control: Arc<SyntheticControl>) -> Self {
        let step = 1.0 / rate;
        let count = (window.duration.as_seconds() * rate - 1e-9).ceil().max(0.0) as u64;
        let payload_len = ((bitrate as f64 / 8.0) * step).ceil().max(1.0) as usize;
        Self {
            kind,
            start: window.start.as_seconds(),
            step,
            count,
            next: 0,
            payload_len,
            control,
        }
    }
}

#[async_trait]
impl SampleSource for SyntheticTrack {
    async fn next_sample(&mut self) -> Result<Option<Sample>, CompressionError> {
        if self.control.is_cancelled() || self.next >= self.count {
            return Ok(None);
        }
        tokio::task::yield_now().await;

        let index = self.next;
        self.next += 1;
        Ok(Some(Sample {
            track: self.kind,
            pts: TimeSpec::from_seconds(self.start + index as f64 * self.step),
            duration: TimeSpec::from_seconds(self.step),
            keyframe: self.kind == TrackKind::Audio || index % KEYFRAME_INTERVAL == 0,
            data: vec![(index % 251) as u8; self.payload_len],
        }))
    }
}

#[async_trait]
impl DecodePort for SyntheticDecoder {
    async fn probe(&self, _source: &Path) -> Result<SourceMediaProfile, CompressionError> {
        Ok(self.profile.clone())
    }

    async fn open(
        &self,
        source: &Path,
        window: TimeWindow,
        with_audio: bool,
    ) -> Result<DecoderHandle, CompressionError> {
        if let Some(cause) = &self.fail_open {
            return Err(CompressionError::DecoderInitializationFailed(cause.clone()));
        }
        let control = Arc::new(SyntheticControl::default());

        let video = SyntheticTrack::new(
            TrackKind::Video,
            window,
            self.profile.frame_rate,
            self.profile.video_bitrate.unwrap_or(DEFAULT_VIDEO_BITRATE),
            control.clone(),
        );
        let audio = match (&self.profile.audio, with_audio) {
            (Some(audio), true) if audio.sample_rate > 0 => Some(Box::new(SyntheticTrack::new(
                TrackKind::Audio,
                window,
                audio.sample_rate as f64 / AUDIO_FRAME_SAMPLES,
                audio.bitrate.unwrap_or(DEFAULT_AUDIO_BITRATE),
                control.clone(),
            )) as Box<dyn SampleSource>),
            _ => None,
        };

        debug!(
            source = %source.display(),
            video_samples = video.count,
            audio = audio.is_some(),
            "Opened synthetic decoder"
        );

        Ok(DecoderHandle {
            video: Box::new(video),
            audio,
            control,
        })
    }
}

/// Knobs for the synthetic encoder
#[derive(Debug, Clone)]
pub struct SyntheticEncoderOptions {
    /// Samples accepted per readiness cycle
    pub burst: usize,
    /// Artificial latency per append
    pub append_delay: Option<Duration>,
    /// Reject the append after this many samples on the given track
    pub fail_after: Option<(TrackKind, u64)>,
}

impl Default for SyntheticEncoderOptions {
    fn default() -> Self {
        Self {
            burst: 8,
            append_delay: None,
            fail_after: None,
        }
    }
}

/// Encoder writing the synthetic sample container
#[derive(Debug, Clone, Default)]
pub struct SyntheticEncoder {
    options: SyntheticEncoderOptions,
}

impl SyntheticEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_burst(mut self, burst: usize) -> Self {
        self.options.burst = burst.max(1);
        self
    }

    pub fn with_append_delay(mut self, delay: Duration) -> Self {
        self.options.append_delay = Some(delay);
        self
    }

    pub fn failing_after(mut self, track: TrackKind, samples: u64) -> Self {
        self.options.fail_after = Some((track, samples));
        self
    }
}

/// How much of each raw payload survives encoding
#[derive(Debug, Clone, Copy)]
enum PayloadBudget {
    BytesPerSecond(f64),
    Fraction(f64),
}

impl PayloadBudget {
    fn encoded_len(&self, raw: usize, duration_secs: f64) -> usize {
        let len = match *self {
            PayloadBudget::BytesPerSecond(bps) => (bps * duration_secs).ceil() as usize,
            PayloadBudget::Fraction(fraction) => (raw as f64 * fraction).ceil() as usize,
        };
        len.clamp(1, raw.max(1))
    }
}

struct Muxer {
    file: tokio::fs::File,
    tracks: usize,
    finished_tracks: usize,
    error: Option<String>,
}

impl Muxer {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), String> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if let Err(e) = self.file.write_all(bytes).await {
            let err = format!("write failed: {}", e);
            self.error = Some(err.clone());
            return Err(err);
        }
        Ok(())
    }
}

struct SyntheticSink {
    kind: TrackKind,
    muxer: Arc<Mutex<Muxer>>,
    control: Arc<SyntheticControl>,
    budget: PayloadBudget,
    buffer: BytesMut,
    pending: usize,
    burst: usize,
    appended: u64,
    append_delay: Option<Duration>,
    fail_after: Option<u64>,
    finished: bool,
}

impl SyntheticSink {
    async fn flush(&mut self) -> Result<(), String> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let bytes = self.buffer.split().freeze();
        self.muxer.lock().await.write(&bytes).await
    }
}

#[async_trait]
impl SampleSink for SyntheticSink {
    fn is_ready_for_more_data(&self) -> bool {
        !self.finished && !self.control.is_cancelled() && self.pending < self.burst
    }

    async fn wait_ready(&mut self) -> Result<(), String> {
        if self.control.is_cancelled() {
            return Err("encoder cancelled".to_string());
        }
        if self.finished {
            return Err(format!("{} input already finished", self.kind));
        }
        self.flush().await?;
        self.pending = 0;
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn append(&mut self, sample: Sample) -> Result<(), String> {
        if self.fail_after.is_some_and(|limit| self.appended >= limit) {
            return Err(format!("{} encoder rejected sample {}", self.kind, self.appended));
        }
        if let Some(delay) = self.append_delay {
            tokio::time::sleep(delay).await;
        }

        let len = self
            .budget
            .encoded_len(sample.data.len(), sample.duration.as_seconds());
        let encoded = Sample {
            data: sample.data[..len.min(sample.data.len())].to_vec(),
            ..sample
        };
        container::encode_record(&mut self.buffer, &encoded);
        self.pending += 1;
        self.appended += 1;
        Ok(())
    }

    async fn mark_finished(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        let flushed = self.flush().await;
        let mut muxer = self.muxer.lock().await;
        if let Err(err) = flushed {
            muxer.error.get_or_insert(err);
        }
        muxer.finished_tracks += 1;
    }
}

struct SyntheticWriter {
    muxer: Arc<Mutex<Muxer>>,
    control: Arc<SyntheticControl>,
}

#[async_trait]
impl ContainerWriter for SyntheticWriter {
    async fn finish_writing(&mut self) -> WriterStatus {
        if self.control.is_cancelled() {
            return WriterStatus::Cancelled;
        }
        let mut muxer = self.muxer.lock().await;
        if let Some(err) = &muxer.error {
            return WriterStatus::Failed(err.clone());
        }
        if muxer.finished_tracks < muxer.tracks {
            return WriterStatus::Failed(format!(
                "{} of {} tracks not finished",
                muxer.tracks - muxer.finished_tracks,
                muxer.tracks
            ));
        }
        if let Err(e) = muxer.file.flush().await {
            return WriterStatus::Failed(format!("flush failed: {}", e));
        }
        match muxer.file.sync_all().await {
            Ok(()) => WriterStatus::Completed,
            Err(e) => WriterStatus::Failed(format!("sync failed: {}", e)),
        }
    }
}

#[async_trait]
impl EncodePort for SyntheticEncoder {
    async fn open(
        &self,
        output: &Path,
        container: ContainerFormat,
        target: &TargetMediaProfile,
    ) -> Result<EncoderHandle, CompressionError> {
        let mut file = tokio::fs::File::create(output).await.map_err(|e| {
            CompressionError::EncoderInitializationFailed(format!(
                "cannot create {}: {}",
                output.display(),
                e
            ))
        })?;
        file.write_all(&container::header())
            .await
            .map_err(|e| CompressionError::EncoderInitializationFailed(e.to_string()))?;

        let tracks = 1 + usize::from(target.audio.is_some());
        let muxer = Arc::new(Mutex::new(Muxer {
            file,
            tracks,
            finished_tracks: 0,
            error: None,
        }));
        let control = Arc::new(SyntheticControl::default());

        let sink = |kind: TrackKind, budget: PayloadBudget| -> Box<dyn SampleSink> {
            Box::new(SyntheticSink {
                kind,
                muxer: muxer.clone(),
                control: control.clone(),
                budget,
                buffer: BytesMut::new(),
                pending: 0,
                burst: self.options.burst.max(1),
                appended: 0,
                append_delay: self.options.append_delay,
                fail_after: self
                    .options
                    .fail_after
                    .filter(|(track, _)| *track == kind)
                    .map(|(_, n)| n),
                finished: false,
            })
        };

        let video_budget = match target.rate {
            VideoRate::Bitrate(bps) => PayloadBudget::BytesPerSecond(bps as f64 / 8.0),
            VideoRate::Quality(q) => PayloadBudget::Fraction(q.max(0.05)),
        };
        let video = sink(TrackKind::Video, video_budget);
        let audio = target
            .audio
            .as_ref()
            .map(|a| sink(TrackKind::Audio, PayloadBudget::BytesPerSecond(a.bitrate as f64 / 8.0)));

        debug!(
            output = %output.display(),
            container = container.extension(),
            encoded = %target.encoded_size(),
            tracks,
            "Opened synthetic encoder"
        );

        Ok(EncoderHandle {
            video,
            audio,
            writer: Box::new(SyntheticWriter {
                muxer: muxer.clone(),
                control: control.clone(),
            }),
            control,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn profile() -> SourceMediaProfile {
        SourceMediaProfile {
            duration: TimeSpec::from_seconds(4.0),
            natural_size: Size::new(640, 360),
            frame_rate: 25.0,
            video_bitrate: Some(800_000),
            transform: Transform::IDENTITY,
            color: ColorInfo::default(),
            audio: Some(SourceAudioProfile {
                sample_rate: 48_000,
                channels: 2,
                bitrate: Some(128_000),
                format: "aac".to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn test_decoder_covers_window() {
        let decoder = SyntheticDecoder::new(profile());
        let window = TimeWindow::new(TimeSpec::from_seconds(1.0), TimeSpec::from_seconds(2.0));
        let mut handle = decoder.open(Path::new("in.mov"), window, true).await.unwrap();

        let mut count = 0;
        let mut last_pts = 0.0;
        while let Some(sample) = handle.video.next_sample().await.unwrap() {
            count += 1;
            last_pts = sample.pts.as_seconds();
        }
        assert_eq!(count, 50);
        assert!(last_pts >= 1.0 && last_pts < 3.0);
        assert!(handle.audio.is_some());
    }

    #[tokio::test]
    async fn test_decoder_skips_audio_when_not_requested() {
        let decoder = SyntheticDecoder::new(profile());
        let window = TimeWindow::new(TimeSpec::ZERO, TimeSpec::from_seconds(1.0));
        let handle = decoder.open(Path::new("in.mov"), window, false).await.unwrap();
        assert!(handle.audio.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_decoder_ends_stream() {
        let decoder = SyntheticDecoder::new(profile());
        let window = TimeWindow::new(TimeSpec::ZERO, TimeSpec::from_seconds(1.0));
        let mut handle = decoder.open(Path::new("in.mov"), window, false).await.unwrap();
        handle.control.cancel();
        assert!(handle.video.next_sample().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_encoder_writes_readable_container() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.mp4");
        let target = crate::planner::TargetSettingsDeriver::derive(
            &CompressionConfig::default().with_quality(0.5).without_audio(),
            &profile(),
        );
        let mut handle = SyntheticEncoder::new()
            .with_burst(2)
            .open(&out, ContainerFormat::Mp4, &target)
            .await
            .unwrap();

        for i in 0..3u64 {
            handle.video.wait_ready().await.unwrap();
            handle
                .video
                .append(Sample {
                    track: TrackKind::Video,
                    pts: TimeSpec::from_seconds(i as f64 / 25.0),
                    duration: TimeSpec::from_seconds(0.04),
                    keyframe: i == 0,
                    data: vec![7; 100],
                })
                .await
                .unwrap();
        }
        handle.video.mark_finished().await;
        assert_eq!(handle.writer.finish_writing().await, WriterStatus::Completed);

        let samples = container::read_samples(&out).await.unwrap();
        assert_eq!(samples.len(), 3);
        assert!(samples.iter().all(|s| s.data.len() == 50));
    }

    #[tokio::test]
    async fn test_backpressure_after_burst() {
        let dir = TempDir::new().unwrap();
        let target = crate::planner::TargetSettingsDeriver::derive(&CompressionConfig::default(), &profile());
        let mut handle = SyntheticEncoder::new()
            .with_burst(1)
            .open(&dir.path().join("out.mp4"), ContainerFormat::Mp4, &target)
            .await
            .unwrap();

        assert!(handle.video.is_ready_for_more_data());
        handle
            .video
            .append(Sample {
                track: TrackKind::Video,
                pts: TimeSpec::ZERO,
                duration: TimeSpec::from_seconds(0.04),
                keyframe: true,
                data: vec![1; 10],
            })
            .await
            .unwrap();
        assert!(!handle.video.is_ready_for_more_data());
        handle.video.wait_ready().await.unwrap();
        assert!(handle.video.is_ready_for_more_data());
    }

    #[tokio::test]
    async fn test_unfinished_tracks_fail_the_writer() {
        let dir = TempDir::new().unwrap();
        let target = crate::planner::TargetSettingsDeriver::derive(&CompressionConfig::default(), &profile());
        let mut handle = SyntheticEncoder::new()
            .open(&dir.path().join("out.mp4"), ContainerFormat::Mp4, &target)
            .await
            .unwrap();
        handle.video.mark_finished().await;
        assert!(matches!(handle.writer.finish_writing().await, WriterStatus::Failed(_)));
    }

    #[tokio::test]
    async fn test_fail_after_rejects_append() {
        let dir = TempDir::new().unwrap();
        let target = crate::planner::TargetSettingsDeriver::derive(&CompressionConfig::default(), &profile());
        let mut handle = SyntheticEncoder::new()
            .failing_after(TrackKind::Video, 0)
            .open(&dir.path().join("out.mp4"), ContainerFormat::Mp4, &target)
            .await
            .unwrap();
        let sample = Sample {
            track: TrackKind::Video,
            pts: TimeSpec::ZERO,
            duration: TimeSpec::from_seconds(0.04),
            keyframe: true,
            data: vec![1; 10],
        };
        assert!(handle.video.append(sample).await.is_err());
    }
}
