//! Frame-rate reduction strategies
//!
//! A reducer picks which source frames survive when the target frame rate is
//! below the source rate. The output is always strictly increasing and starts
//! at frame 0 when non-empty.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Ordered, strictly increasing source frame indices to retain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrameKeepSet(Vec<u64>);

impl FrameKeepSet {
    /// Build from arbitrary indices; sorts, removes duplicates and forces frame 0
    pub fn from_indices(mut indices: Vec<u64>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        if indices.first().is_some_and(|first| *first != 0) {
            indices.insert(0, 0);
        }
        Self(indices)
    }

    pub fn indices(&self) -> &[u64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, index: u64) -> bool {
        self.0.binary_search(&index).is_ok()
    }

    pub fn into_inner(self) -> Vec<u64> {
        self.0
    }
}

/// Strategy for selecting frames during frame-rate reduction
pub trait FrameReducer: Send + Sync {
    /// Frames to keep, or `None` to keep every frame
    fn reduce(&self, source_fps: f64, target_fps: f64, duration_secs: f64) -> Option<FrameKeepSet>;

    fn name(&self) -> &'static str;
}

/// Source and target frame counts for a reduction, or `None` when nothing is dropped
fn frame_counts(source_fps: f64, target_fps: f64, duration_secs: f64) -> Option<(u64, u64)> {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if !valid(source_fps) || !valid(target_fps) || !valid(duration_secs) {
        return None;
    }
    if target_fps >= source_fps {
        return None;
    }

    let source_count = (source_fps * duration_secs).round().max(1.0) as u64;
    let target_count = ((target_fps * duration_secs).round().max(1.0) as u64).min(source_count);
    Some((source_count, target_count))
}

/// Nearest-neighbour selection at a fixed stride (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct EvenlySpaced;

impl FrameReducer for EvenlySpaced {
    fn reduce(&self, source_fps: f64, target_fps: f64, duration_secs: f64) -> Option<FrameKeepSet> {
        let (source_count, target_count) = frame_counts(source_fps, target_fps, duration_secs)?;
        let step = source_fps / target_fps;

        let mut indices: Vec<u64> = Vec::with_capacity(target_count as usize);
        for k in 0..target_count {
            let mut index = (k as f64 * step).round() as u64;
            if let Some(&last) = indices.last() {
                if index <= last {
                    index = last + 1;
                }
            }
            if index >= source_count {
                break;
            }
            indices.push(index);
        }

        Some(FrameKeepSet::from_indices(indices))
    }

    fn name(&self) -> &'static str {
        "evenly-spaced"
    }
}

/// One uniformly random frame per contiguous segment
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomReducer {
    seed: Option<u64>,
}

impl RandomReducer {
    pub fn new() -> Self {
        Self { seed: None }
    }

    /// Reproducible selection for a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl FrameReducer for RandomReducer {
    fn reduce(&self, source_fps: f64, target_fps: f64, duration_secs: f64) -> Option<FrameKeepSet> {
        let (source_count, target_count) = frame_counts(source_fps, target_fps, duration_secs)?;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // ceil(S * i / n)
        let boundary = |i: u64| (source_count * i).div_ceil(target_count);

        let indices = (0..target_count)
            .map(|segment| {
                if segment == 0 {
                    return 0;
                }
                let (lo, hi) = (boundary(segment), boundary(segment + 1).min(source_count));
                if hi > lo {
                    rng.gen_range(lo..hi)
                } else {
                    lo.min(source_count - 1)
                }
            })
            .collect();

        Some(FrameKeepSet::from_indices(indices))
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Scene-cut driven selection.
///
/// Scene-cut detection is not implemented yet; selection is delegated to
/// [`EvenlySpaced`] so output matches it exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneAware;

impl FrameReducer for SceneAware {
    fn reduce(&self, source_fps: f64, target_fps: f64, duration_secs: f64) -> Option<FrameKeepSet> {
        EvenlySpaced.reduce(source_fps, target_fps, duration_secs)
    }

    fn name(&self) -> &'static str {
        "scene-aware"
    }
}

/// Selectable reduction strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReductionStrategy {
    #[default]
    EvenlySpaced,
    Random,
    SceneAware,
}

impl ReductionStrategy {
    /// Instantiate the strategy; `seed` only affects [`ReductionStrategy::Random`]
    pub fn reducer(&self, seed: Option<u64>) -> Box<dyn FrameReducer> {
        match self {
            ReductionStrategy::EvenlySpaced => Box::new(EvenlySpaced),
            ReductionStrategy::Random => Box::new(RandomReducer { seed }),
            ReductionStrategy::SceneAware => Box::new(SceneAware),
        }
    }
}

impl fmt::Display for ReductionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReductionStrategy::EvenlySpaced => write!(f, "evenly-spaced"),
            ReductionStrategy::Random => write!(f, "random"),
            ReductionStrategy::SceneAware => write!(f, "scene-aware"),
        }
    }
}

impl FromStr for ReductionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "evenly-spaced" | "even" => Ok(ReductionStrategy::EvenlySpaced),
            "random" => Ok(ReductionStrategy::Random),
            "scene-aware" | "scene" => Ok(ReductionStrategy::SceneAware),
            _ => Err(format!(
                "Invalid frame reducer: {}. Valid reducers: evenly-spaced, random, scene-aware",
                s
            )),
        }
    }
}
