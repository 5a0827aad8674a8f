//! Content-aware adjustment of a compression request

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::model::{CompressionConfig, Size, SourceMediaProfile};

/// Display resolutions typical of screen recordings rather than camera footage
const SCREENCAST_RESOLUTIONS: &[(u32, u32)] = &[
    (1280, 800),
    (1440, 900),
    (1680, 1050),
    (1920, 1200),
    (2560, 1600),
    (2880, 1800),
    (3024, 1964),
    (3456, 2234),
    (2560, 1664),
    (2940, 1912),
];

/// Coarse content classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentClass {
    HighMotion,
    LowMotion,
    Screencast,
    Standard,
}

impl ContentClass {
    /// Classify from frame rate first, then from the visual resolution
    pub fn classify(source: &SourceMediaProfile) -> Self {
        if source.frame_rate > 45.0 {
            ContentClass::HighMotion
        } else if source.frame_rate < 24.0 {
            ContentClass::LowMotion
        } else if is_screencast_size(source.visual_size()) {
            ContentClass::Screencast
        } else {
            ContentClass::Standard
        }
    }
}

fn is_screencast_size(size: Size) -> bool {
    SCREENCAST_RESOLUTIONS
        .iter()
        .any(|&(w, h)| (size.width, size.height) == (w, h) || (size.width, size.height) == (h, w))
}

/// Return an adjusted copy of `config`; the caller's value is never touched
pub fn content_adjusted(config: &CompressionConfig, source: &SourceMediaProfile) -> CompressionConfig {
    let mut adjusted = config.clone();
    let class = ContentClass::classify(source);

    match class {
        ContentClass::HighMotion => {
            // one keyframe per second keeps seeking and recovery cheap
            let per_second = source.frame_rate.round().max(1.0) as u32;
            adjusted.max_keyframe_interval = adjusted.max_keyframe_interval.min(per_second);
            adjusted.quality = adjusted.quality.max(0.7);
            adjusted.video_bitrate = adjusted.video_bitrate.max(2_000_000);
        }
        ContentClass::LowMotion => {
            adjusted.max_keyframe_interval = adjusted.max_keyframe_interval.saturating_mul(2).min(300);
        }
        ContentClass::Screencast => {
            adjusted.max_keyframe_interval = adjusted.max_keyframe_interval.saturating_mul(4).min(300);
            adjusted.quality = adjusted.quality.max(0.8);
        }
        ContentClass::Standard => {}
    }

    debug!(
        ?class,
        keyframe_interval = adjusted.max_keyframe_interval,
        quality = adjusted.quality,
        "Applied content-aware adjustment"
    );
    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ColorInfo, TimeSpec, Transform};

    fn source(width: u32, height: u32, fps: f64) -> SourceMediaProfile {
        SourceMediaProfile {
            duration: TimeSpec::from_seconds(10.0),
            natural_size: Size::new(width, height),
            frame_rate: fps,
            video_bitrate: None,
            transform: Transform::IDENTITY,
            color: ColorInfo::default(),
            audio: None,
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(ContentClass::classify(&source(1920, 1080, 60.0)), ContentClass::HighMotion);
        assert_eq!(ContentClass::classify(&source(1920, 1080, 15.0)), ContentClass::LowMotion);
        assert_eq!(ContentClass::classify(&source(2880, 1800, 30.0)), ContentClass::Screencast);
        assert_eq!(ContentClass::classify(&source(1920, 1080, 30.0)), ContentClass::Standard);
    }

    #[test]
    fn test_high_motion_tightens_keyframes() {
        let config = CompressionConfig {
            max_keyframe_interval: 120,
            ..CompressionConfig::default()
        };
        let adjusted = content_adjusted(&config, &source(1920, 1080, 60.0));
        assert_eq!(adjusted.max_keyframe_interval, 60);
        assert!(adjusted.quality >= 0.7);
        assert_eq!(config.max_keyframe_interval, 120);
    }

    #[test]
    fn test_screencast_raises_quality_floor() {
        let config = CompressionConfig::default().with_quality(0.3);
        let adjusted = content_adjusted(&config, &source(1440, 900, 30.0));
        assert_eq!(adjusted.quality, 0.8);
        assert_eq!(adjusted.max_keyframe_interval, 120);
        assert_eq!(config.quality, 0.3);
    }

    #[test]
    fn test_standard_content_is_unchanged() {
        let config = CompressionConfig::default();
        let adjusted = content_adjusted(&config, &source(1920, 1080, 30.0));
        assert_eq!(adjusted, config);
    }
}
