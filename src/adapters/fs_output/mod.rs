// Filesystem output adapter - Resolves the configured output location to a file path

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves explicit paths, output directories and the system temp location
pub struct FsOutputAdapter {
    temp_dir: Option<PathBuf>,
}

impl FsOutputAdapter {
    /// Create adapter using the system temp directory for default outputs
    pub fn new() -> Self {
        Self { temp_dir: None }
    }

    /// Create adapter placing default outputs in `dir`
    pub fn with_temp_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: Some(dir.into()),
        }
    }

    /// Output file name for directory mode: `<stem>_compressed.<ext>`
    pub fn compressed_file_name(source: &Path, container: ContainerFormat) -> String {
        format!("{}_compressed.{}", Self::source_stem(source), container.extension())
    }

    fn source_stem(source: &Path) -> String {
        source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "output".to_string())
    }

    /// Create `dir` and its parents, refusing if an existing ancestor is not a directory
    fn ensure_directory(dir: &Path) -> Result<(), CompressionError> {
        if dir.as_os_str().is_empty() {
            return Ok(());
        }
        for ancestor in dir.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            if ancestor.exists() && !ancestor.is_dir() {
                return Err(CompressionError::invalid_output(
                    dir,
                    format!("{} exists and is not a directory", ancestor.display()),
                ));
            }
        }
        fs::create_dir_all(dir).map_err(|e| {
            CompressionError::invalid_output(dir, format!("failed to create directory: {}", e))
        })
    }

    fn resolve_file(path: &Path) -> Result<PathBuf, CompressionError> {
        if path.is_dir() {
            return Err(CompressionError::invalid_output(path, "path is a directory"));
        }
        if let Some(parent) = path.parent() {
            Self::ensure_directory(parent)?;
        }
        Ok(path.to_path_buf())
    }

    fn resolve_default(&self, source: &Path, container: ContainerFormat) -> Result<PathBuf, CompressionError> {
        let dir = self.temp_dir.clone().unwrap_or_else(std::env::temp_dir);
        Self::ensure_directory(&dir)?;

        let prefix = format!("{}_", Self::source_stem(source));
        let suffix = format!(".{}", container.extension());
        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .tempfile_in(&dir)
            .map_err(|e| CompressionError::invalid_output(&dir, format!("failed to create temp file: {}", e)))?;
        let (_, path) = file
            .keep()
            .map_err(|e| CompressionError::invalid_output(&dir, format!("failed to keep temp file: {}", e)))?;
        Ok(path)
    }
}

impl Default for FsOutputAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputPathPort for FsOutputAdapter {
    fn resolve(&self, config: &CompressionConfig, source: &Path) -> Result<PathBuf, CompressionError> {
        let path = match config.output_location() {
            OutputLocation::File(path) => Self::resolve_file(&path)?,
            OutputLocation::Directory(dir) => {
                Self::ensure_directory(&dir)?;
                dir.join(Self::compressed_file_name(source, config.container))
            }
            OutputLocation::SystemDefault => self.resolve_default(source, config.container)?,
        };
        debug!(output = %path.display(), "Resolved output path");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source() -> PathBuf {
        PathBuf::from("/videos/holiday.mov")
    }

    #[test]
    fn test_explicit_path_wins_over_directory() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("nested/deeper/out.mp4");
        let config = CompressionConfig::default()
            .with_output_directory(dir.path().join("ignored"))
            .with_output_path(&explicit);

        let resolved = FsOutputAdapter::new().resolve(&config, &source()).unwrap();

        assert_eq!(resolved, explicit);
        assert!(explicit.parent().unwrap().is_dir());
        assert!(!dir.path().join("ignored").exists());
    }

    #[test]
    fn test_directory_mode_names_after_source() {
        let dir = TempDir::new().unwrap();
        let mut config = CompressionConfig::default().with_output_directory(dir.path().join("out"));
        config.container = ContainerFormat::Mov;

        let resolved = FsOutputAdapter::new().resolve(&config, &source()).unwrap();

        assert_eq!(resolved, dir.path().join("out").join("holiday_compressed.mov"));
    }

    #[test]
    fn test_default_location_is_unique_temp_file() {
        let dir = TempDir::new().unwrap();
        let adapter = FsOutputAdapter::with_temp_dir(dir.path());
        let config = CompressionConfig::default();

        let first = adapter.resolve(&config, &source()).unwrap();
        let second = adapter.resolve(&config, &source()).unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with(dir.path()));
        assert_eq!(first.extension().unwrap(), "mp4");
        assert!(first.file_name().unwrap().to_string_lossy().starts_with("holiday_"));
    }

    #[test]
    fn test_file_ancestor_is_rejected() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();
        let config = CompressionConfig::default().with_output_path(blocker.join("sub/out.mp4"));

        let err = FsOutputAdapter::new().resolve(&config, &source()).unwrap_err();

        assert!(matches!(err, CompressionError::InvalidOutputPath { .. }));
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_directory_as_output_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = CompressionConfig::default().with_output_path(dir.path());
        let err = FsOutputAdapter::new().resolve(&config, &source()).unwrap_err();
        assert!(matches!(err, CompressionError::InvalidOutputPath { .. }));
    }

    #[test]
    fn test_existing_file_is_overwritable() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("out.mp4");
        fs::write(&existing, b"old").unwrap();
        let config = CompressionConfig::default().with_output_path(&existing);
        assert_eq!(FsOutputAdapter::new().resolve(&config, &source()).unwrap(), existing);
    }
}
