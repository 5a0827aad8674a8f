//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

use crate::domain::model::{AudioCodec, CompressionConfig, ContainerFormat, TimeSpec, VideoCodec};
use crate::engine::ReductionStrategy;

fn parse_time(s: &str) -> Result<TimeSpec, String> {
    TimeSpec::parse(s)
}

/// Compression settings shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// TOML config file (COMPRESSX_* environment variables override it)
    #[arg(long, env = "COMPRESSX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Video codec (h264, hevc)
    #[arg(long)]
    pub codec: Option<VideoCodec>,

    /// Target video bitrate in bits per second (switches to bitrate mode)
    #[arg(long, conflicts_with = "quality")]
    pub bitrate: Option<u64>,

    /// Quality factor between 0.0 and 1.0 (switches to quality mode)
    #[arg(long)]
    pub quality: Option<f64>,

    /// Do not cap the bitrate at the source bitrate
    #[arg(long)]
    pub no_adaptive: bool,

    /// Target frame rate
    #[arg(long)]
    pub fps: Option<f64>,

    /// Cap the longer visual side, in pixels
    #[arg(long)]
    pub max_dimension: Option<u32>,

    /// Target visual width; height follows the aspect ratio unless given
    #[arg(long)]
    pub width: Option<u32>,

    /// Target visual height; width follows the aspect ratio unless given
    #[arg(long)]
    pub height: Option<u32>,

    /// Encode at visual dimensions and drop rotation metadata
    #[arg(long)]
    pub force_visual_dimensions: bool,

    /// Audio codec (aac, he-aac, he-aac-v2)
    #[arg(long)]
    pub audio_codec: Option<AudioCodec>,

    /// Audio bitrate in bits per second; 0 drops the audio track
    #[arg(long)]
    pub audio_bitrate: Option<i64>,

    /// Drop the audio track
    #[arg(long)]
    pub no_audio: bool,

    /// Trim start (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long, value_parser = parse_time)]
    pub start: Option<TimeSpec>,

    /// Trim end (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long, value_parser = parse_time)]
    pub end: Option<TimeSpec>,

    /// Output file path (wins over --output-dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output directory; the file is named after the source
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Output container (mp4, mov)
    #[arg(long)]
    pub container: Option<ContainerFormat>,

    /// Adjust keyframe interval and quality to the content type
    #[arg(long)]
    pub content_aware: bool,

    /// Frame selection when reducing the frame rate
    #[arg(long, default_value_t = ReductionStrategy::EvenlySpaced)]
    pub reducer: ReductionStrategy,

    /// Seed for the random frame reducer
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ConfigArgs {
    /// Apply command-line overrides on top of a loaded config
    pub fn apply(&self, mut config: CompressionConfig) -> CompressionConfig {
        if let Some(codec) = self.codec {
            config.video_codec = codec;
        }
        if let Some(bitrate) = self.bitrate {
            config = config.with_bitrate(bitrate);
        }
        if let Some(quality) = self.quality {
            config = config.with_quality(quality);
        }
        if self.no_adaptive {
            config.use_adaptive_bitrate = false;
        }
        if let Some(fps) = self.fps {
            config.frame_rate = fps;
        }
        if let Some(max) = self.max_dimension {
            config.max_longer_dimension = Some(max);
        }
        if self.width.is_some() || self.height.is_some() {
            config = config.with_dimensions(self.width, self.height);
        }
        if self.force_visual_dimensions {
            config.force_visual_encoding_dimensions = true;
        }
        if let Some(codec) = self.audio_codec {
            config.audio_codec = codec;
        }
        if let Some(bitrate) = self.audio_bitrate {
            config.audio_bitrate = bitrate;
        }
        if self.no_audio {
            config = config.without_audio();
        }
        if self.start.is_some() || self.end.is_some() {
            config = config.with_trim(self.start, self.end);
        }
        if let Some(output) = &self.output {
            config.output_path = Some(output.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output_directory = Some(dir.clone());
        }
        if let Some(container) = self.container {
            config.container = container;
        }
        if self.content_aware {
            config.content_aware_optimization = true;
        }
        config
    }
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Source profile as JSON (SourceMediaProfile)
    #[arg(long)]
    pub profile: PathBuf,

    #[command(flatten)]
    pub settings: ConfigArgs,
}

/// Arguments for the simulate command
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Source file; only its size and name are used
    pub source: PathBuf,

    /// Source profile as JSON; defaults to 10s of 1080p30 with stereo audio
    #[arg(long)]
    pub profile: Option<PathBuf>,

    #[command(flatten)]
    pub settings: ConfigArgs,

    /// Samples the synthetic encoder accepts per readiness cycle
    #[arg(long, default_value_t = 8)]
    pub burst: usize,

    /// Print analytics as JSON
    #[arg(long)]
    pub json: bool,

    /// Show a progress bar on stderr
    #[arg(long)]
    pub progress: bool,
}
