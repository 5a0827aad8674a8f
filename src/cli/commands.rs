//! Command implementations

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::adapters::{
    ConfigLoader, FsOutputAdapter, StaticCodecCapabilities, SyntheticDecoder, SyntheticEncoder,
};
use crate::cli::args::{ConfigArgs, PlanArgs, SimulateArgs};
use crate::domain::model::*;
use crate::domain::rules::TimeWindowResolver;
use crate::engine::{
    ConsoleProgressCallback, ProgressCallback, TranscodeSession,
};
use crate::planner::TargetSettingsDeriver;
use crate::utils::Utils;

/// Everything `plan` prints
#[derive(Debug, Serialize)]
pub struct PlanReport {
    pub window: TimeWindow,
    pub target: TargetMediaProfile,
    pub reducer: String,
    /// `None` when every frame is kept
    pub kept_frames: Option<usize>,
}

/// Source used by `simulate` when no profile is given
pub fn default_profile() -> SourceMediaProfile {
    SourceMediaProfile {
        duration: TimeSpec::from_seconds(10.0),
        natural_size: Size::new(1920, 1080),
        frame_rate: 30.0,
        video_bitrate: Some(4_000_000),
        transform: Transform::IDENTITY,
        color: ColorInfo::default(),
        audio: Some(SourceAudioProfile {
            sample_rate: 48_000,
            channels: 2,
            bitrate: Some(192_000),
            format: "aac".to_string(),
        }),
    }
}

fn load_profile(path: &Path) -> Result<SourceMediaProfile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read source profile {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse source profile {}", path.display()))
}

/// File, then environment, then command-line overrides
fn load_config(settings: &ConfigArgs) -> Result<CompressionConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &settings.config {
        loader = loader.with_file(path);
    }
    let config = loader.load().context("Failed to load configuration")?;
    Ok(settings.apply(config))
}

/// Build the plan for a source profile without touching any media
pub fn build_plan(
    profile: &SourceMediaProfile,
    config: &CompressionConfig,
    settings: &ConfigArgs,
) -> Result<PlanReport> {
    profile.validate().context("Invalid source profile")?;
    let window = TimeWindowResolver::resolve(config.trim_start_time, config.trim_end_time, profile.duration)
        .context("Invalid trim range")?;
    let target = TargetSettingsDeriver::derive(config, profile);
    let reducer = settings.reducer.reducer(settings.seed);
    let kept_frames = reducer
        .reduce(profile.frame_rate, target.frame_rate, window.duration.as_seconds())
        .map(|keep| keep.len());

    Ok(PlanReport {
        window,
        target,
        reducer: reducer.name().to_string(),
        kept_frames,
    })
}

/// Execute the plan command
pub fn plan(args: PlanArgs) -> Result<()> {
    info!("Starting plan operation");
    let profile = load_profile(&args.profile)?;
    let config = load_config(&args.settings)?;
    let report = build_plan(&profile, &config, &args.settings)?;

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize plan to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Execute the simulate command
pub async fn simulate(args: SimulateArgs) -> Result<()> {
    info!("Starting simulate operation");
    info!("Source: {}", args.source.display());

    let profile = match &args.profile {
        Some(path) => load_profile(path)?,
        None => default_profile(),
    };
    let config = load_config(&args.settings)?;

    let session = TranscodeSession::new(
        Arc::new(SyntheticDecoder::new(profile)),
        Arc::new(SyntheticEncoder::new().with_burst(args.burst)),
        Arc::new(StaticCodecCapabilities::all()),
        Arc::new(FsOutputAdapter::new()),
    );
    let reducer = args.settings.reducer.reducer(args.settings.seed);
    let progress: Option<Arc<dyn ProgressCallback>> = if args.progress {
        Some(Arc::new(ConsoleProgressCallback::new()))
    } else {
        None
    };

    let outcome = session
        .run(&args.source, &config, reducer.as_ref(), progress)
        .await
        .context("Transcode failed")?;

    if args.json {
        let json = serde_json::to_string_pretty(&outcome).context("Failed to serialize result to JSON")?;
        println!("{}", json);
    } else {
        display_outcome(&outcome);
    }
    Ok(())
}

fn display_outcome(outcome: &crate::engine::CompressionOutcome) {
    let a = &outcome.analytics;
    println!("Output:          {}", outcome.output_path.display());
    println!(
        "Size:            {} -> {} ({:.2}x)",
        Utils::format_file_size(a.original_file_size),
        Utils::format_file_size(a.compressed_file_size),
        a.compression_ratio
    );
    println!("Dimensions:      {} -> {}", a.original_dimensions, a.compressed_dimensions);
    println!(
        "Video bitrate:   {} -> {}",
        a.original_video_bitrate
            .map(Utils::format_bitrate)
            .unwrap_or_else(|| "unknown".to_string()),
        Utils::format_bitrate(a.compressed_video_bitrate)
    );
    if let Some(audio) = a.compressed_audio_bitrate {
        println!("Audio bitrate:   {}", Utils::format_bitrate(audio));
    } else {
        println!("Audio:           dropped");
    }
    println!("Frame rate:      {:.2} -> {:.2}", a.original_frame_rate, a.compressed_frame_rate);
    println!("Duration:        {}", a.effective_duration);
    println!("Processing time: {}", Utils::format_duration(a.processing_time));
    for note in &outcome.target.notes {
        println!("Note:            {}", note);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_reports_kept_frames() {
        let settings = ConfigArgs {
            fps: Some(15.0),
            ..ConfigArgs::default()
        };
        let config = settings.apply(CompressionConfig::default().with_trim(
            Some(TimeSpec::from_seconds(2.0)),
            Some(TimeSpec::from_seconds(6.0)),
        ));

        let report = build_plan(&default_profile(), &config, &settings).unwrap();

        assert_eq!(report.window.duration, TimeSpec::from_seconds(4.0));
        assert_eq!(report.kept_frames, Some(60));
        assert_eq!(report.reducer, "evenly-spaced");
    }

    #[test]
    fn test_plan_rejects_bad_trim() {
        let settings = ConfigArgs::default();
        let config = CompressionConfig::default().with_trim(
            Some(TimeSpec::from_seconds(3.0)),
            Some(TimeSpec::from_seconds(1.0)),
        );
        let err = build_plan(&default_profile(), &config, &settings).unwrap_err();
        assert!(format!("{:#}", err).contains("before trim end"));
    }
}
