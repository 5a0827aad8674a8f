//! Output dimension planning

use crate::domain::model::{CompressionConfig, Size, SourceMediaProfile, Transform};

/// Encoding-space dimensions plus the transform to stamp on the output track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedDimensions {
    /// Rotation-applied target size
    pub visual: Size,
    /// Size handed to the encoder
    pub encoded: Size,
    pub transform: Transform,
}

/// Round down to the nearest even integer, never below 2
pub fn even_floor(value: f64) -> u32 {
    if !value.is_finite() || value < 2.0 {
        return 2;
    }
    let floored = value.floor().min(u32::MAX as f64) as u32;
    (floored & !1).max(2)
}

/// Compute the visual target size.
///
/// A max-longer-dimension cap wins over explicit width/height. A single
/// explicit dimension derives its companion from the source aspect ratio.
pub fn visual_target_size(config: &CompressionConfig, source_visual: Size) -> Size {
    let (source_w, source_h) = (source_visual.width as f64, source_visual.height as f64);
    let longer = source_visual.longer_side() as f64;

    let (width, height) = match config.max_longer_dimension {
        Some(max) if max > 0 && longer > max as f64 => {
            let max = max as f64;
            (source_w * max / longer, source_h * max / longer)
        }
        _ => match (config.width.filter(|w| *w > 0), config.height.filter(|h| *h > 0)) {
            (Some(w), Some(h)) => (w as f64, h as f64),
            (Some(w), None) => (w as f64, w as f64 * source_h / source_w),
            (None, Some(h)) => (h as f64 * source_w / source_h, h as f64),
            (None, None) => (source_w, source_h),
        },
    };

    Size::new(even_floor(width), even_floor(height))
}

/// Map the visual target into encoding space.
///
/// With `force_visual_encoding_dimensions` the rotation is baked in and the
/// output transform is identity. Otherwise quarter-turn sources are swapped back
/// to their stored orientation and keep the source transform verbatim.
pub fn plan_dimensions(config: &CompressionConfig, source: &SourceMediaProfile) -> PlannedDimensions {
    let visual = visual_target_size(config, source.visual_size());

    if config.force_visual_encoding_dimensions {
        return PlannedDimensions {
            visual,
            encoded: visual,
            transform: Transform::IDENTITY,
        };
    }

    let encoded = if source.transform.is_rotated() {
        visual.swapped()
    } else {
        visual
    };

    PlannedDimensions {
        visual,
        encoded,
        transform: source.transform,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ColorInfo, TimeSpec};

    fn source(width: u32, height: u32, transform: Transform) -> SourceMediaProfile {
        SourceMediaProfile {
            duration: TimeSpec::from_seconds(10.0),
            natural_size: Size::new(width, height),
            frame_rate: 30.0,
            video_bitrate: Some(4_000_000),
            transform,
            color: ColorInfo::default(),
            audio: None,
        }
    }

    #[test]
    fn test_even_floor() {
        assert_eq!(even_floor(1919.9), 1918);
        assert_eq!(even_floor(1080.0), 1080);
        assert_eq!(even_floor(1.0), 2);
        assert_eq!(even_floor(0.0), 2);
        assert_eq!(even_floor(f64::NAN), 2);
        assert_eq!(even_floor(3.0), 2);
    }

    #[test]
    fn test_max_longer_dimension_scales_uniformly() {
        let config = CompressionConfig::default().with_max_longer_dimension(1280);
        let size = visual_target_size(&config, Size::new(1920, 1080));
        assert_eq!(size, Size::new(1280, 720));
    }

    #[test]
    fn test_max_longer_dimension_beats_explicit_size() {
        let config = CompressionConfig::default()
            .with_max_longer_dimension(960)
            .with_dimensions(Some(1280), Some(720));
        let size = visual_target_size(&config, Size::new(1920, 1080));
        assert_eq!(size, Size::new(960, 540));
    }

    #[test]
    fn test_cap_not_applied_when_source_is_smaller() {
        let config = CompressionConfig::default()
            .with_max_longer_dimension(4000)
            .with_dimensions(Some(640), None);
        let size = visual_target_size(&config, Size::new(1920, 1080));
        assert_eq!(size, Size::new(640, 360));
    }

    #[test]
    fn test_single_dimension_keeps_aspect() {
        let config = CompressionConfig::default().with_dimensions(None, Some(480));
        let size = visual_target_size(&config, Size::new(1920, 1080));
        assert_eq!(size, Size::new(852, 480));
    }

    #[test]
    fn test_odd_source_is_rounded_down() {
        let config = CompressionConfig::default();
        let size = visual_target_size(&config, Size::new(1281, 721));
        assert_eq!(size, Size::new(1280, 720));
    }

    #[test]
    fn test_rotated_source_round_trips_encoding_space() {
        let rotation = Transform::rotation(90.0);
        let planned = plan_dimensions(&CompressionConfig::default(), &source(1080, 1920, rotation));
        assert_eq!(planned.visual, Size::new(1920, 1080));
        assert_eq!(planned.encoded, Size::new(1080, 1920));
        assert_eq!(planned.transform, rotation);
    }

    #[test]
    fn test_force_visual_bakes_rotation() {
        let mut config = CompressionConfig::default().with_max_longer_dimension(1280);
        config.force_visual_encoding_dimensions = true;
        let planned = plan_dimensions(&config, &source(1080, 1920, Transform::rotation(270.0)));
        assert_eq!(planned.encoded, Size::new(1280, 720));
        assert!(planned.transform.is_identity());
    }

    #[test]
    fn test_half_turn_is_not_swapped() {
        let rotation = Transform::rotation(180.0);
        let planned = plan_dimensions(&CompressionConfig::default(), &source(1920, 1080, rotation));
        assert_eq!(planned.encoded, Size::new(1920, 1080));
        assert_eq!(planned.transform, rotation);
    }
}
