//! Property tests for trim resolution, dimension planning and frame reduction

use compressx::domain::model::*;
use compressx::engine::{EvenlySpaced, FrameReducer, RandomReducer, SceneAware};
use compressx::{TargetSettingsDeriver, TimeWindowResolver};
use proptest::prelude::*;

fn source(width: u32, height: u32, rotation: f64) -> SourceMediaProfile {
    SourceMediaProfile {
        duration: TimeSpec::from_seconds(10.0),
        natural_size: Size::new(width, height),
        frame_rate: 30.0,
        video_bitrate: Some(3_000_000),
        transform: Transform::rotation(rotation),
        color: ColorInfo::default(),
        audio: None,
    }
}

fn rotation() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), Just(90.0), Just(180.0), Just(270.0)]
}

proptest! {
    #[test]
    fn derived_dimensions_are_even_and_positive(
        width in 1u32..8000,
        height in 1u32..8000,
        degrees in rotation(),
        cap in proptest::option::of(1u32..4000),
        explicit_width in proptest::option::of(1u32..4000),
        explicit_height in proptest::option::of(1u32..4000),
        force_visual in any::<bool>(),
    ) {
        let mut config = CompressionConfig::default().with_dimensions(explicit_width, explicit_height);
        config.max_longer_dimension = cap;
        config.force_visual_encoding_dimensions = force_visual;

        let target = TargetSettingsDeriver::derive(&config, &source(width, height, degrees));

        prop_assert!(target.width >= 2 && target.width % 2 == 0);
        prop_assert!(target.height >= 2 && target.height % 2 == 0);
    }

    #[test]
    fn longer_side_respects_cap(
        width in 2u32..8000,
        height in 2u32..8000,
        degrees in rotation(),
        cap in 2u32..4000,
    ) {
        let config = CompressionConfig::default().with_max_longer_dimension(cap);
        let target = TargetSettingsDeriver::derive(&config, &source(width, height, degrees));

        prop_assert!(target.encoded_size().longer_side() <= cap.max(2));
    }

    #[test]
    fn resolved_window_stays_inside_asset(
        duration in 0.1f64..600.0,
        start in proptest::option::of(-10.0f64..700.0),
        end in proptest::option::of(-10.0f64..700.0),
    ) {
        let result = TimeWindowResolver::resolve(
            start.map(TimeSpec::from_seconds),
            end.map(TimeSpec::from_seconds),
            TimeSpec::from_seconds(duration),
        );

        if let Ok(window) = result {
            prop_assert!(window.start.as_seconds() >= 0.0);
            prop_assert!(window.duration.as_seconds() > 0.0);
            prop_assert!(window.end().as_seconds() <= duration + 1e-9);
        }
    }

    #[test]
    fn reducers_keep_sorted_unique_indices(
        source_fps in 1.0f64..120.0,
        target_fps in 1.0f64..120.0,
        duration in 0.1f64..20.0,
        seed in any::<u64>(),
    ) {
        let reducers: [Box<dyn FrameReducer>; 3] = [
            Box::new(EvenlySpaced),
            Box::new(RandomReducer::seeded(seed)),
            Box::new(SceneAware),
        ];
        let source_count = ((source_fps * duration).round() as u64).max(1);

        for reducer in reducers.iter() {
            if let Some(keep) = reducer.reduce(source_fps, target_fps, duration) {
                let indices = keep.indices();
                prop_assert_eq!(indices[0], 0);
                prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
                prop_assert!(indices.iter().all(|&i| i < source_count));
            }
        }
    }

    #[test]
    fn reduced_frame_count_tracks_target_rate(
        source_fps in 2.0f64..120.0,
        ratio in 0.05f64..0.95,
        duration in 0.5f64..20.0,
        seed in any::<u64>(),
    ) {
        let target_fps = source_fps * ratio;
        let expected = target_fps * duration;
        let reducers: [Box<dyn FrameReducer>; 3] = [
            Box::new(EvenlySpaced),
            Box::new(RandomReducer::seeded(seed)),
            Box::new(SceneAware),
        ];

        for reducer in reducers.iter() {
            if let Some(keep) = reducer.reduce(source_fps, target_fps, duration) {
                prop_assert!(
                    (keep.len() as f64 - expected).abs() <= 1.0,
                    "{} kept {} frames, expected about {:.2}",
                    reducer.name(),
                    keep.len(),
                    expected
                );
            }
        }
    }
}
