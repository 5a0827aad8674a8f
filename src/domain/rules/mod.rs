// Domain rules - Business logic and policies

use crate::domain::errors::*;
use crate::domain::model::*;

/// Business rules for the trim window
pub struct TimeWindowResolver;

impl TimeWindowResolver {
    /// Resolve optional trim marks against the source duration.
    ///
    /// The three rejection reasons stay distinguishable in the message:
    /// start at/after end, a mark outside the asset duration, and an end at or
    /// before zero.
    pub fn resolve(
        trim_start: Option<TimeSpec>,
        trim_end: Option<TimeSpec>,
        source_duration: TimeSpec,
    ) -> Result<TimeWindow, CompressionError> {
        if !(source_duration.seconds.is_finite() && source_duration.seconds > 0.0) {
            return Err(CompressionError::invalid_trim(format!(
                "asset duration ({:.3}s) must be greater than zero",
                source_duration.seconds
            )));
        }

        let (start, end) = match (trim_start, trim_end) {
            (Some(start), Some(end)) => {
                Self::check_inside(start, "start", source_duration)?;
                if start.seconds >= end.seconds {
                    return Err(CompressionError::invalid_trim(format!(
                        "trim start ({:.3}s) must be before trim end ({:.3}s)",
                        start.seconds, end.seconds
                    )));
                }
                Self::check_inside(end, "end", source_duration)?;
                (start, end)
            }
            (Some(start), None) => {
                Self::check_inside(start, "start", source_duration)?;
                if start.seconds >= source_duration.seconds {
                    return Err(Self::outside(start, "start", source_duration));
                }
                (start, source_duration)
            }
            (None, Some(end)) => {
                if end.seconds <= 0.0 {
                    return Err(CompressionError::invalid_trim(format!(
                        "trim end ({:.3}s) must be greater than zero",
                        end.seconds
                    )));
                }
                Self::check_inside(end, "end", source_duration)?;
                (TimeSpec::ZERO, end)
            }
            (None, None) => (TimeSpec::ZERO, source_duration),
        };

        Ok(TimeWindow::new(
            start,
            TimeSpec::from_seconds(end.seconds - start.seconds),
        ))
    }

    fn check_inside(
        mark: TimeSpec,
        label: &str,
        source_duration: TimeSpec,
    ) -> Result<(), CompressionError> {
        if !mark.seconds.is_finite() || mark.seconds < 0.0 || mark.seconds > source_duration.seconds {
            return Err(Self::outside(mark, label, source_duration));
        }
        Ok(())
    }

    fn outside(mark: TimeSpec, label: &str, source_duration: TimeSpec) -> CompressionError {
        CompressionError::invalid_trim(format!(
            "trim {} ({:.3}s) is outside the asset duration (0.000s - {:.3}s)",
            label, mark.seconds, source_duration.seconds
        ))
    }
}

#[cfg(test)]
mod tests;
