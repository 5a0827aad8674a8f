// TOML config adapter - Loads CompressionConfig from a file plus environment overrides
//
// Precedence: CLI > Env > File > Defaults. The CLI layer applies its own
// overrides on top of what this loader returns.

use crate::domain::model::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Configuration loading failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value} ({reason})")]
    InvalidEnv {
        key: String,
        value: String,
        reason: String,
    },
}

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "COMPRESSX_";

/// Recognized environment overrides, without the prefix
const ENV_KEYS: &[&str] = &[
    "VIDEO_CODEC",
    "VIDEO_BITRATE",
    "QUALITY",
    "ADAPTIVE_BITRATE",
    "FRAME_RATE",
    "MAX_DIMENSION",
    "KEYFRAME_INTERVAL",
    "AUDIO_CODEC",
    "AUDIO_BITRATE",
    "CONTAINER",
    "OUTPUT_DIR",
    "CONTENT_AWARE",
];

/// Loads a compression config from TOML and the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// File (if any), then process environment
    pub fn load(&self) -> Result<CompressionConfig, ConfigError> {
        self.load_with_env(std::env::vars())
    }

    /// File (if any), then the given environment pairs
    pub fn load_with_env<I>(&self, env: I) -> Result<CompressionConfig, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = match &self.path {
            Some(path) => Self::read_file(path)?,
            None => CompressionConfig::default(),
        };
        apply_env_overrides(&mut config, env)?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<CompressionConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = parse_config(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }
}

/// Parse a (possibly partial) TOML document
pub fn parse_config(content: &str) -> Result<CompressionConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Apply `COMPRESSX_*` overrides to `config`
pub fn apply_env_overrides<I>(config: &mut CompressionConfig, env: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    for (name, value) in env {
        let Some(key) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        if !ENV_KEYS.contains(&key) {
            continue;
        }
        apply_override(config, &name, key, value.trim())?;
        debug!("Applied environment override {}", name);
    }
    Ok(())
}

fn apply_override(
    config: &mut CompressionConfig,
    name: &str,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnv {
        key: name.to_string(),
        value: value.to_string(),
        reason,
    };

    match key {
        "VIDEO_CODEC" => config.video_codec = value.parse().map_err(invalid)?,
        "VIDEO_BITRATE" => {
            let bps = value.parse::<u64>().map_err(|e| invalid(e.to_string()))?;
            *config = config.clone().with_bitrate(bps);
        }
        "QUALITY" => {
            let quality = value.parse::<f64>().map_err(|e| invalid(e.to_string()))?;
            *config = config.clone().with_quality(quality);
        }
        "ADAPTIVE_BITRATE" => config.use_adaptive_bitrate = parse_bool(value).map_err(invalid)?,
        "FRAME_RATE" => config.frame_rate = value.parse().map_err(|e: std::num::ParseFloatError| invalid(e.to_string()))?,
        "MAX_DIMENSION" => {
            config.max_longer_dimension =
                Some(value.parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?)
        }
        "KEYFRAME_INTERVAL" => {
            config.max_keyframe_interval =
                value.parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?
        }
        "AUDIO_CODEC" => config.audio_codec = value.parse().map_err(invalid)?,
        "AUDIO_BITRATE" => {
            config.audio_bitrate =
                value.parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?
        }
        "CONTAINER" => config.container = value.parse().map_err(invalid)?,
        "OUTPUT_DIR" => config.output_directory = Some(PathBuf::from(value)),
        "CONTENT_AWARE" => config.content_aware_optimization = parse_bool(value).map_err(invalid)?,
        _ => {}
    }
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err("expected a boolean".to_string()),
    }
}
