//! Analytics aggregation for a finished run

use std::time::Duration;

use crate::domain::model::{
    CompressionAnalytics, SourceMediaProfile, TargetMediaProfile, TimeSpec,
};

/// Inputs gathered by the session once the output is finalized
#[derive(Debug, Clone)]
pub struct AnalyticsInput<'a> {
    pub original_file_size: u64,
    pub compressed_file_size: u64,
    pub processing_time: Duration,
    pub source: &'a SourceMediaProfile,
    pub target: &'a TargetMediaProfile,
    /// Post-trim duration
    pub effective_duration: TimeSpec,
}

pub struct AnalyticsAggregator;

impl AnalyticsAggregator {
    pub fn compute(input: AnalyticsInput<'_>) -> CompressionAnalytics {
        let compression_ratio = if input.compressed_file_size == 0 {
            0.0
        } else {
            input.original_file_size as f64 / input.compressed_file_size as f64
        };

        let compressed_video_bitrate = input.target.target_bitrate().unwrap_or_else(|| {
            estimate_bitrate(input.compressed_file_size, input.effective_duration)
        });

        CompressionAnalytics {
            original_file_size: input.original_file_size,
            compressed_file_size: input.compressed_file_size,
            compression_ratio,
            processing_time: input.processing_time,
            original_dimensions: input.source.visual_size(),
            compressed_dimensions: input.target.encoded_size(),
            original_video_bitrate: input.source.video_bitrate,
            compressed_video_bitrate,
            original_audio_bitrate: input.source.audio.as_ref().and_then(|a| a.bitrate),
            compressed_audio_bitrate: input.target.audio.as_ref().map(|a| a.bitrate),
            effective_duration: input.effective_duration,
            original_frame_rate: input.source.frame_rate,
            compressed_frame_rate: input.target.frame_rate,
        }
    }
}

/// Average bits per second of `bytes` spread over `duration`
pub fn estimate_bitrate(bytes: u64, duration: TimeSpec) -> u64 {
    let seconds = duration.as_seconds();
    if seconds <= 0.0 || !seconds.is_finite() {
        return 0;
    }
    (bytes as f64 * 8.0 / seconds).round() as u64
}
