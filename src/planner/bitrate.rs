//! Bitrate clamping against the measured source bitrate

/// Lowest video bitrate the planner will hand to an encoder (bits/s)
pub const MIN_VIDEO_BITRATE: u64 = 50_000;

/// Lowest audio bitrate the planner will hand to an encoder (bits/s)
pub const MIN_AUDIO_BITRATE: u64 = 16_000;

/// Clamp a configured bitrate so already-lean sources are not inflated.
///
/// Adaptive mode caps the target at the source bitrate whenever the target
/// exceeds it. The safety floor always applies on top: a target more than 20%
/// above the source is brought down to 80% of the source. Neither rule goes
/// below `minimum`. An unknown source bitrate only applies the minimum.
pub fn clamp_bitrate(configured: u64, source: Option<u64>, adaptive: bool, minimum: u64) -> u64 {
    let Some(source) = source.filter(|bps| *bps > 0) else {
        return configured.max(minimum);
    };

    let clamped = if adaptive && configured > source {
        source
    } else if configured.saturating_mul(5) > source.saturating_mul(6) {
        // more than 120% of source: bring it down to 80%
        source.saturating_mul(4) / 5
    } else {
        configured
    };

    clamped.max(minimum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adaptive_caps_at_source() {
        let bitrate = clamp_bitrate(2_000_000, Some(300_000), true, MIN_VIDEO_BITRATE);
        assert_eq!(bitrate, 300_000);
    }

    #[test]
    fn test_safety_floor_applies_without_adaptive() {
        let bitrate = clamp_bitrate(2_000_000, Some(300_000), false, MIN_VIDEO_BITRATE);
        assert_eq!(bitrate, 240_000);
    }

    #[test]
    fn test_within_twenty_percent_is_kept_without_adaptive() {
        let bitrate = clamp_bitrate(350_000, Some(300_000), false, MIN_VIDEO_BITRATE);
        assert_eq!(bitrate, 350_000);
    }

    #[test]
    fn test_target_below_source_is_kept() {
        assert_eq!(clamp_bitrate(1_000_000, Some(8_000_000), true, MIN_VIDEO_BITRATE), 1_000_000);
        assert_eq!(clamp_bitrate(1_000_000, Some(8_000_000), false, MIN_VIDEO_BITRATE), 1_000_000);
    }

    #[test]
    fn test_minimum_is_respected() {
        assert_eq!(clamp_bitrate(2_000_000, Some(20_000), true, MIN_VIDEO_BITRATE), MIN_VIDEO_BITRATE);
        assert_eq!(clamp_bitrate(128_000, Some(10_000), false, MIN_AUDIO_BITRATE), MIN_AUDIO_BITRATE);
        assert_eq!(clamp_bitrate(1_000, None, false, MIN_AUDIO_BITRATE), MIN_AUDIO_BITRATE);
    }

    #[test]
    fn test_unknown_source_leaves_target() {
        assert_eq!(clamp_bitrate(2_000_000, None, true, MIN_VIDEO_BITRATE), 2_000_000);
        assert_eq!(clamp_bitrate(2_000_000, Some(0), true, MIN_VIDEO_BITRATE), 2_000_000);
    }
}
