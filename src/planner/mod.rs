//! Target settings planning
//!
//! Turns a [`CompressionConfig`] plus the measured [`SourceMediaProfile`] into
//! the concrete [`TargetMediaProfile`] handed to the encoder. Derivation is a
//! pure function of its inputs: no I/O, no clock, no randomness.

use tracing::{debug, warn};

use crate::domain::model::*;

pub mod bitrate;
pub mod content;
pub mod dimensions;

pub use bitrate::{clamp_bitrate, MIN_AUDIO_BITRATE, MIN_VIDEO_BITRATE};
pub use content::{content_adjusted, ContentClass};
pub use dimensions::{even_floor, plan_dimensions, PlannedDimensions};

const MIN_AUDIO_SAMPLE_RATE: u32 = 8_000;
const MAX_AUDIO_SAMPLE_RATE: u32 = 96_000;
const MAX_HE_AAC_SAMPLE_RATE: u32 = 48_000;
const MAX_AUDIO_CHANNELS: u32 = 2;

/// Derives encoder settings from a request and a source profile
pub struct TargetSettingsDeriver;

impl TargetSettingsDeriver {
    /// Derive the target profile
    pub fn derive(config: &CompressionConfig, source: &SourceMediaProfile) -> TargetMediaProfile {
        let adjusted;
        let config = if config.content_aware_optimization {
            adjusted = content_adjusted(config, source);
            &adjusted
        } else {
            config
        };

        let dims = plan_dimensions(config, source);
        let rate = Self::video_rate(config, source);
        let mut notes = Vec::new();
        let (profile, hdr, preserve_hdr_metadata) =
            Self::codec_profile(config.video_codec, &source.color, &mut notes);

        let frame_rate = if config.frame_rate > 0.0 && config.frame_rate.is_finite() {
            config.frame_rate.min(source.frame_rate)
        } else {
            source.frame_rate
        };

        let target = TargetMediaProfile {
            codec: config.video_codec,
            width: dims.encoded.width,
            height: dims.encoded.height,
            transform: dims.transform,
            rate,
            profile,
            hdr,
            preserve_hdr_metadata,
            frame_rate,
            max_keyframe_interval: config.max_keyframe_interval.max(1),
            audio: Self::audio_profile(config, source),
            notes,
        };

        debug!(
            codec = %target.codec,
            encoded = %target.encoded_size(),
            visual = %dims.visual,
            rate = ?target.rate,
            profile = ?target.profile,
            frame_rate = target.frame_rate,
            audio = target.audio.is_some(),
            "Derived target settings"
        );
        target
    }

    fn video_rate(config: &CompressionConfig, source: &SourceMediaProfile) -> VideoRate {
        match config.rate_mode {
            RateMode::Quality => {
                let quality = if config.quality.is_nan() { 0.0 } else { config.quality };
                VideoRate::Quality(quality.clamp(0.0, 1.0))
            }
            RateMode::Bitrate => VideoRate::Bitrate(clamp_bitrate(
                config.video_bitrate,
                source.video_bitrate,
                config.use_adaptive_bitrate,
                MIN_VIDEO_BITRATE,
            )),
        }
    }

    /// Pick the codec profile, honouring HDR sources where the codec allows it
    fn codec_profile(
        codec: VideoCodec,
        color: &ColorInfo,
        notes: &mut Vec<String>,
    ) -> (CodecProfile, bool, bool) {
        let hdr = color.is_hdr();
        match (codec, hdr) {
            (VideoCodec::Hevc, true) => (CodecProfile::HevcMain10, true, true),
            (VideoCodec::Hevc, false) => (CodecProfile::HevcMain, false, false),
            (VideoCodec::H264, true) => {
                let note = "HDR source encoded with H.264; HDR metadata may be lost".to_string();
                warn!("{}", note);
                notes.push(note);
                (CodecProfile::H264High, true, false)
            }
            (VideoCodec::H264, false) => (CodecProfile::H264High, false, false),
        }
    }

    fn audio_profile(
        config: &CompressionConfig,
        source: &SourceMediaProfile,
    ) -> Option<TargetAudioProfile> {
        if config.drops_audio() {
            return None;
        }
        let source_audio = source.audio.as_ref()?;
        if source_audio.sample_rate < MIN_AUDIO_SAMPLE_RATE {
            warn!(
                sample_rate = source_audio.sample_rate,
                "Source audio sample rate unusable, dropping audio"
            );
            return None;
        }

        let channels = config
            .audio_channels
            .unwrap_or(source_audio.channels)
            .clamp(1, MAX_AUDIO_CHANNELS);

        let sample_rate = config
            .audio_sample_rate
            .clamp(MIN_AUDIO_SAMPLE_RATE, MAX_AUDIO_SAMPLE_RATE)
            .min(source_audio.sample_rate);

        let bitrate = clamp_bitrate(
            config.audio_bitrate as u64,
            source_audio.bitrate,
            config.use_adaptive_bitrate,
            MIN_AUDIO_BITRATE,
        );

        let codec = if config.audio_codec.is_high_efficiency() && sample_rate > MAX_HE_AAC_SAMPLE_RATE {
            debug!(sample_rate, "High-efficiency AAC unsupported at this rate, using AAC");
            AudioCodec::Aac
        } else {
            config.audio_codec
        };

        Some(TargetAudioProfile {
            codec,
            bitrate,
            sample_rate,
            channels,
        })
    }
}
