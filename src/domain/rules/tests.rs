// Unit tests for business rules

use super::*;

fn secs(value: f64) -> Option<TimeSpec> {
    Some(TimeSpec::from_seconds(value))
}

fn reason(err: CompressionError) -> String {
    match err {
        CompressionError::InvalidTrimRange(reason) => reason,
        other => panic!("expected InvalidTrimRange, got {:?}", other),
    }
}

const TEN: TimeSpec = TimeSpec { seconds: 10.0 };

#[test]
fn test_no_trim_covers_whole_asset() {
    let window = TimeWindowResolver::resolve(None, None, TEN).unwrap();
    assert_eq!(window.start, TimeSpec::ZERO);
    assert_eq!(window.duration, TEN);
}

#[test]
fn test_both_marks() {
    let window = TimeWindowResolver::resolve(secs(1.0), secs(3.0), TEN).unwrap();
    assert_eq!(window.start.seconds, 1.0);
    assert_eq!(window.duration.seconds, 2.0);
}

#[test]
fn test_start_only_runs_to_end() {
    let window = TimeWindowResolver::resolve(secs(4.0), None, TEN).unwrap();
    assert_eq!(window.start.seconds, 4.0);
    assert_eq!(window.end().seconds, 10.0);
}

#[test]
fn test_end_only_starts_at_zero() {
    let window = TimeWindowResolver::resolve(None, secs(2.5), TEN).unwrap();
    assert_eq!(window.start, TimeSpec::ZERO);
    assert_eq!(window.duration.seconds, 2.5);
}

#[test]
fn test_start_after_end_is_rejected() {
    let err = TimeWindowResolver::resolve(secs(3.0), secs(1.0), TEN).unwrap_err();
    assert!(reason(err).contains("before trim end"));

    let err = TimeWindowResolver::resolve(secs(2.0), secs(2.0), TEN).unwrap_err();
    assert!(reason(err).contains("before trim end"));
}

#[test]
fn test_marks_outside_duration_are_rejected() {
    let err = TimeWindowResolver::resolve(secs(1.0), secs(12.0), TEN).unwrap_err();
    assert!(reason(err).contains("outside the asset duration"));

    let err = TimeWindowResolver::resolve(secs(-1.0), secs(3.0), TEN).unwrap_err();
    assert!(reason(err).contains("outside the asset duration"));

    let err = TimeWindowResolver::resolve(secs(10.0), None, TEN).unwrap_err();
    assert!(reason(err).contains("outside the asset duration"));

    let err = TimeWindowResolver::resolve(None, secs(11.0), TEN).unwrap_err();
    assert!(reason(err).contains("outside the asset duration"));
}

#[test]
fn test_end_at_or_below_zero_is_rejected() {
    let err = TimeWindowResolver::resolve(None, secs(0.0), TEN).unwrap_err();
    assert!(reason(err).contains("greater than zero"));

    let err = TimeWindowResolver::resolve(None, secs(-2.0), TEN).unwrap_err();
    assert!(reason(err).contains("greater than zero"));
}

#[test]
fn test_zero_length_asset_is_rejected() {
    assert!(TimeWindowResolver::resolve(None, None, TimeSpec::ZERO).is_err());
}

#[test]
fn test_every_resolved_window_is_valid() {
    let marks = [None, secs(-1.0), secs(0.0), secs(0.5), secs(5.0), secs(9.99), secs(10.0), secs(11.0)];
    for start in marks {
        for end in marks {
            if let Ok(window) = TimeWindowResolver::resolve(start, end, TEN) {
                assert!(window.start.seconds >= 0.0);
                assert!(window.duration.seconds > 0.0);
                assert!(window.end().seconds <= TEN.seconds + 1e-9);
            }
        }
    }
}
