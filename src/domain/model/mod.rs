// Domain models - Core types and data structures

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::errors::CompressionError;

/// Point in time or duration, in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    pub const ZERO: TimeSpec = TimeSpec { seconds: 0.0 };

    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Create a new TimeSpec from hours, minutes, seconds, milliseconds
    pub fn from_components(hours: u32, minutes: u32, seconds: u32, milliseconds: u32) -> Self {
        let total_seconds = hours as f64 * 3600.0
            + minutes as f64 * 60.0
            + seconds as f64
            + milliseconds as f64 / 1000.0;
        Self {
            seconds: total_seconds,
        }
    }

    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Convert to Duration, clamping negative values to zero
    pub fn to_duration(&self) -> Duration {
        Duration::from_secs_f64(self.seconds.max(0.0))
    }

    /// Convert from Duration
    pub fn from_duration(duration: Duration) -> Self {
        Self {
            seconds: duration.as_secs_f64(),
        }
    }

    /// Subtract, flooring the result at zero
    pub fn saturating_sub(self, other: TimeSpec) -> TimeSpec {
        TimeSpec::from_seconds((self.seconds - other.seconds).max(0.0))
    }

    /// Parse time string in various formats
    pub fn parse(time_str: &str) -> Result<Self, String> {
        let trimmed = time_str.trim();

        if let Ok(seconds) = trimmed.parse::<f64>() {
            if !seconds.is_finite() {
                return Err("Time must be a finite number".to_string());
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let parse_minutes = |s: &str| {
            s.parse::<u32>()
                .map_err(|_| "Invalid minutes format".to_string())
        };
        let parse_seconds = |s: &str| -> Result<f64, String> {
            let value = s
                .parse::<f64>()
                .map_err(|_| "Invalid seconds format".to_string())?;
            if !(0.0..60.0).contains(&value) {
                return Err("Seconds must be less than 60".to_string());
            }
            Ok(value)
        };

        match parts.as_slice() {
            [minutes, seconds] => {
                let minutes = parse_minutes(minutes)?;
                let seconds = parse_seconds(seconds)?;
                Ok(Self::from_seconds(minutes as f64 * 60.0 + seconds))
            }
            [hours, minutes, seconds] => {
                let hours = hours
                    .parse::<u32>()
                    .map_err(|_| "Invalid hours format".to_string())?;
                let minutes = parse_minutes(minutes)?;
                if minutes >= 60 {
                    return Err("Minutes must be less than 60".to_string());
                }
                let seconds = parse_seconds(seconds)?;
                Ok(Self::from_seconds(
                    hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
                ))
            }
            _ => Err(
                "Invalid time format. Supported formats: seconds (e.g., 123.45), MM:SS.ms (e.g., 2:30.5), HH:MM:SS.ms (e.g., 1:02:30.5)"
                    .to_string(),
            ),
        }
    }

    /// Format as HH:MM:SS.ms
    pub fn format_hms(&self) -> String {
        let total_ms = (self.seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let seconds = (total_ms % 60_000) / 1000;
        let milliseconds = total_ms % 1000;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// Effective trim range of a run, in source time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: TimeSpec,
    pub duration: TimeSpec,
}

impl TimeWindow {
    pub fn new(start: TimeSpec, duration: TimeSpec) -> Self {
        Self { start, duration }
    }

    pub fn end(&self) -> TimeSpec {
        TimeSpec::from_seconds(self.start.seconds + self.duration.seconds)
    }

    /// Whether the window covers the whole source
    pub fn is_full(&self, source_duration: TimeSpec) -> bool {
        self.start.seconds == 0.0 && self.duration.seconds >= source_duration.seconds
    }
}

/// Pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn swapped(&self) -> Self {
        Self::new(self.height, self.width)
    }

    pub fn longer_side(&self) -> u32 {
        self.width.max(self.height)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Affine display transform attached to a video track
///
/// Copied verbatim into the output unless the encoder is asked to bake the
/// rotation into the encoded dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Pure rotation by the given clockwise angle
    pub fn rotation(degrees: f64) -> Self {
        let radians = degrees.to_radians();
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Rotation snapped to the nearest quarter turn: 0, 90, 180 or 270
    pub fn rotation_degrees(&self) -> u16 {
        let degrees = self.b.atan2(self.a).to_degrees();
        let normalized = degrees.rem_euclid(360.0);
        ((normalized / 90.0).round() as u16 % 4) * 90
    }

    /// Whether the transform swaps width and height (90 or 270 degrees)
    pub fn is_rotated(&self) -> bool {
        matches!(self.rotation_degrees(), 90 | 270)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// Color primaries tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorPrimaries {
    Bt709,
    Bt601,
    DisplayP3,
    Bt2020,
    Unknown,
}

impl ColorPrimaries {
    /// Map a container/ffprobe style tag
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_lowercase().replace(['-', ' '], "_").as_str() {
            "bt709" | "itu_r_709_2" => Self::Bt709,
            "bt470bg" | "smpte170m" | "bt601" => Self::Bt601,
            "smpte432" | "p3_d65" | "display_p3" => Self::DisplayP3,
            "bt2020" | "bt2020nc" | "itu_r_2020" => Self::Bt2020,
            _ => Self::Unknown,
        }
    }

    pub fn is_wide_gamut(&self) -> bool {
        matches!(self, Self::Bt2020)
    }
}

/// Transfer function tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferFunction {
    Bt709,
    Srgb,
    Pq,
    Hlg,
    Unknown,
}

impl TransferFunction {
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_lowercase().replace(['-', ' '], "_").as_str() {
            "bt709" | "itu_r_709_2" => Self::Bt709,
            "iec61966_2_1" | "srgb" => Self::Srgb,
            "smpte2084" | "smpte_st_2084_pq" | "pq" => Self::Pq,
            "arib_std_b67" | "itu_r_2100_hlg" | "hlg" => Self::Hlg,
            _ => Self::Unknown,
        }
    }

    pub fn is_hdr(&self) -> bool {
        matches!(self, Self::Pq | Self::Hlg)
    }
}

/// YCbCr matrix tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMatrix {
    Bt709,
    Bt601,
    Bt2020,
    Unknown,
}

impl ColorMatrix {
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_lowercase().replace(['-', ' '], "_").as_str() {
            "bt709" | "itu_r_709_2" => Self::Bt709,
            "bt470bg" | "smpte170m" | "bt601" | "itu_r_601_4" => Self::Bt601,
            "bt2020nc" | "bt2020c" | "bt2020" | "itu_r_2020" => Self::Bt2020,
            _ => Self::Unknown,
        }
    }
}

/// Color tags measured on the source video track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColorInfo {
    pub primaries: Option<ColorPrimaries>,
    pub transfer: Option<TransferFunction>,
    pub matrix: Option<ColorMatrix>,
}

impl ColorInfo {
    /// Wide-gamut primaries or a PQ/HLG transfer function
    pub fn is_hdr(&self) -> bool {
        self.primaries.is_some_and(|p| p.is_wide_gamut())
            || self.transfer.is_some_and(|t| t.is_hdr())
    }
}

/// Target video codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    #[default]
    H264,
    Hevc,
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoCodec::H264 => write!(f, "h264"),
            VideoCodec::Hevc => write!(f, "hevc"),
        }
    }
}

impl FromStr for VideoCodec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "h264" | "avc" => Ok(VideoCodec::H264),
            "hevc" | "h265" => Ok(VideoCodec::Hevc),
            _ => Err(format!("Invalid video codec: {}. Valid codecs: h264, hevc", s)),
        }
    }
}

/// Target audio codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCodec {
    #[default]
    Aac,
    HeAac,
    HeAacV2,
}

impl AudioCodec {
    /// High-efficiency variants cannot run above 48 kHz
    pub fn is_high_efficiency(&self) -> bool {
        matches!(self, AudioCodec::HeAac | AudioCodec::HeAacV2)
    }
}

impl FromStr for AudioCodec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "aac" => Ok(AudioCodec::Aac),
            "he_aac" | "heaac" => Ok(AudioCodec::HeAac),
            "he_aac_v2" | "heaacv2" => Ok(AudioCodec::HeAacV2),
            _ => Err(format!("Invalid audio codec: {}. Valid codecs: aac, he-aac, he-aac-v2", s)),
        }
    }
}

/// Output container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    #[default]
    Mp4,
    Mov,
}

impl ContainerFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "mp4",
            ContainerFormat::Mov => "mov",
        }
    }
}

impl FromStr for ContainerFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mp4" | "m4v" => Ok(ContainerFormat::Mp4),
            "mov" | "qt" => Ok(ContainerFormat::Mov),
            _ => Err(format!("Invalid container: {}. Valid containers: mp4, mov", s)),
        }
    }
}

/// Whether the encoder targets a bitrate or a quality factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateMode {
    Bitrate,
    #[default]
    Quality,
}

/// Where the compressed file should land
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLocation {
    File(PathBuf),
    Directory(PathBuf),
    SystemDefault,
}

/// Declarative compression request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub video_codec: VideoCodec,
    pub rate_mode: RateMode,
    /// Target video bitrate in bits per second (bitrate mode)
    pub video_bitrate: u64,
    /// Quality factor in [0.0, 1.0] (quality mode)
    pub quality: f64,
    pub use_adaptive_bitrate: bool,
    /// Maximum distance between keyframes, in frames
    pub max_keyframe_interval: u32,
    pub frame_rate: f64,
    /// Explicit visual width; `None` derives it from the height and aspect ratio
    pub width: Option<u32>,
    /// Explicit visual height; `None` derives it from the width and aspect ratio
    pub height: Option<u32>,
    /// Caps the visual longer side; takes precedence over width/height
    pub max_longer_dimension: Option<u32>,
    pub force_visual_encoding_dimensions: bool,
    pub audio_codec: AudioCodec,
    /// Audio bitrate in bits per second; zero or negative drops the audio track
    pub audio_bitrate: i64,
    pub audio_sample_rate: u32,
    /// `None` keeps the source channel count (still capped at stereo)
    pub audio_channels: Option<u32>,
    pub trim_start_time: Option<TimeSpec>,
    pub trim_end_time: Option<TimeSpec>,
    pub output_path: Option<PathBuf>,
    pub output_directory: Option<PathBuf>,
    pub container: ContainerFormat,
    pub content_aware_optimization: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            video_codec: VideoCodec::H264,
            rate_mode: RateMode::Quality,
            video_bitrate: 1_000_000,
            quality: 0.6,
            use_adaptive_bitrate: true,
            max_keyframe_interval: 30,
            frame_rate: 30.0,
            width: None,
            height: None,
            max_longer_dimension: None,
            force_visual_encoding_dimensions: false,
            audio_codec: AudioCodec::Aac,
            audio_bitrate: 128_000,
            audio_sample_rate: 44_100,
            audio_channels: None,
            trim_start_time: None,
            trim_end_time: None,
            output_path: None,
            output_directory: None,
            container: ContainerFormat::Mp4,
            content_aware_optimization: false,
        }
    }
}

impl CompressionConfig {
    /// Switch to bitrate mode with the given target
    pub fn with_bitrate(mut self, bits_per_second: u64) -> Self {
        self.rate_mode = RateMode::Bitrate;
        self.video_bitrate = bits_per_second;
        self
    }

    /// Switch to quality mode with the given factor
    pub fn with_quality(mut self, quality: f64) -> Self {
        self.rate_mode = RateMode::Quality;
        self.quality = quality;
        self
    }

    pub fn with_codec(mut self, codec: VideoCodec) -> Self {
        self.video_codec = codec;
        self
    }

    pub fn with_adaptive_bitrate(mut self, enabled: bool) -> Self {
        self.use_adaptive_bitrate = enabled;
        self
    }

    pub fn with_frame_rate(mut self, fps: f64) -> Self {
        self.frame_rate = fps;
        self
    }

    pub fn with_max_longer_dimension(mut self, max: u32) -> Self {
        self.max_longer_dimension = Some(max);
        self
    }

    pub fn with_dimensions(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_trim(mut self, start: Option<TimeSpec>, end: Option<TimeSpec>) -> Self {
        self.trim_start_time = start;
        self.trim_end_time = end;
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_directory = Some(dir.into());
        self
    }

    pub fn without_audio(mut self) -> Self {
        self.audio_bitrate = 0;
        self
    }

    /// Resolve the output location; an explicit file path wins over a directory
    pub fn output_location(&self) -> OutputLocation {
        match (&self.output_path, &self.output_directory) {
            (Some(path), _) => OutputLocation::File(path.clone()),
            (None, Some(dir)) => OutputLocation::Directory(dir.clone()),
            (None, None) => OutputLocation::SystemDefault,
        }
    }

    /// The explicit "no audio" signal
    pub fn drops_audio(&self) -> bool {
        self.audio_bitrate <= 0
    }
}

/// Audio properties measured on the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAudioProfile {
    pub sample_rate: u32,
    pub channels: u32,
    pub bitrate: Option<u64>,
    pub format: String,
}

/// Properties measured on the source, loaded once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMediaProfile {
    pub duration: TimeSpec,
    /// Encoded (pre-rotation) pixel size
    pub natural_size: Size,
    pub frame_rate: f64,
    /// Estimated video bitrate in bits per second
    pub video_bitrate: Option<u64>,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub color: ColorInfo,
    #[serde(default)]
    pub audio: Option<SourceAudioProfile>,
}

impl SourceMediaProfile {
    /// Validate the measured values
    pub fn validate(&self) -> Result<(), CompressionError> {
        if self.natural_size.width == 0 || self.natural_size.height == 0 {
            return Err(CompressionError::MissingVideoTrack);
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(CompressionError::DecoderInitializationFailed(format!(
                "source frame rate must be positive, got {}",
                self.frame_rate
            )));
        }
        Ok(())
    }

    /// Pixel size as displayed, after applying the rotation
    pub fn visual_size(&self) -> Size {
        if self.transform.is_rotated() {
            self.natural_size.swapped()
        } else {
            self.natural_size
        }
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }
}

/// Codec profile chosen for the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecProfile {
    H264High,
    HevcMain,
    HevcMain10,
}

/// Rate control handed to the encoder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoRate {
    Bitrate(u64),
    Quality(f64),
}

/// Derived audio encoder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetAudioProfile {
    pub codec: AudioCodec,
    pub bitrate: u64,
    pub sample_rate: u32,
    pub channels: u32,
}

/// Derived encoder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetMediaProfile {
    pub codec: VideoCodec,
    /// Encoding-space width, even and at least 2
    pub width: u32,
    /// Encoding-space height, even and at least 2
    pub height: u32,
    pub transform: Transform,
    pub rate: VideoRate,
    pub profile: CodecProfile,
    pub hdr: bool,
    /// Carry HDR metadata through to the output (HEVC Main10 only)
    pub preserve_hdr_metadata: bool,
    pub frame_rate: f64,
    pub max_keyframe_interval: u32,
    pub audio: Option<TargetAudioProfile>,
    /// Non-fatal policy notes raised during derivation
    pub notes: Vec<String>,
}

impl TargetMediaProfile {
    pub fn encoded_size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn target_bitrate(&self) -> Option<u64> {
        match self.rate {
            VideoRate::Bitrate(bps) => Some(bps),
            VideoRate::Quality(_) => None,
        }
    }
}

/// Elementary stream kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Video => write!(f, "video"),
            TrackKind::Audio => write!(f, "audio"),
        }
    }
}

/// One decoded sample travelling from decoder to encoder
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub track: TrackKind,
    /// Presentation timestamp in source time
    pub pts: TimeSpec,
    pub duration: TimeSpec,
    pub keyframe: bool,
    pub data: Vec<u8>,
}

impl Sample {
    /// Same sample, with its timestamp shifted back by `offset`
    pub fn rebased(mut self, offset: TimeSpec) -> Self {
        self.pts = self.pts.saturating_sub(offset);
        self
    }
}

/// Outcome statistics of a successful run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionAnalytics {
    pub original_file_size: u64,
    pub compressed_file_size: u64,
    /// original / compressed, 0 when nothing was written
    pub compression_ratio: f64,
    pub processing_time: Duration,
    /// Visual (rotation-corrected) source size
    pub original_dimensions: Size,
    /// Encoding-space output size
    pub compressed_dimensions: Size,
    pub original_video_bitrate: Option<u64>,
    pub compressed_video_bitrate: u64,
    pub original_audio_bitrate: Option<u64>,
    pub compressed_audio_bitrate: Option<u64>,
    pub effective_duration: TimeSpec,
    pub original_frame_rate: f64,
    pub compressed_frame_rate: f64,
}
