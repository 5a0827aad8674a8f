// Domain errors - Failure taxonomy for a compression run

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::model::VideoCodec;

/// Errors surfaced by a compression run.
///
/// Validation failures (paths, trim range, codec support) are raised before any
/// decoder or encoder is opened. `Cancelled` travels through the same channel
/// but is not a system failure; use [`CompressionError::is_cancelled`] to branch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompressionError {
    /// Source file missing, unreadable, or not a regular file
    #[error("Invalid source location: {path}")]
    InvalidSourceLocation { path: PathBuf },

    /// Output location cannot be created or written
    #[error("Invalid output path {path}: {reason}")]
    InvalidOutputPath { path: PathBuf, reason: String },

    /// Source container carries no video track
    #[error("Source has no video track")]
    MissingVideoTrack,

    /// No encoder available for the requested codec
    #[error("Video codec not supported on this platform: {codec}")]
    CodecNotSupported { codec: VideoCodec },

    /// Trim marks rejected against the source duration
    #[error("Invalid trim range: {0}")]
    InvalidTrimRange(String),

    /// Decoder could not be opened
    #[error("Decoder initialization failed: {0}")]
    DecoderInitializationFailed(String),

    /// Encoder could not be opened
    #[error("Encoder initialization failed: {0}")]
    EncoderInitializationFailed(String),

    /// Mid-pipeline failure (append rejected, writer failure, decode error)
    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    /// The caller requested a stop
    #[error("Compression cancelled")]
    Cancelled,
}

impl CompressionError {
    /// Creates an invalid output path error.
    pub fn invalid_output(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidOutputPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid trim range error.
    pub fn invalid_trim(reason: impl Into<String>) -> Self {
        Self::InvalidTrimRange(reason.into())
    }

    /// Creates a mid-pipeline compression failure.
    pub fn failed(cause: impl Into<String>) -> Self {
        Self::CompressionFailed(cause.into())
    }

    /// Whether this is a user-requested stop rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether this error was raised before any decoder/encoder was opened.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSourceLocation { .. }
                | Self::InvalidOutputPath { .. }
                | Self::MissingVideoTrack
                | Self::CodecNotSupported { .. }
                | Self::InvalidTrimRange(_)
        )
    }
}
