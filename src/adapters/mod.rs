// Adapters - External system implementations

pub mod capabilities;
pub mod fs_output;
pub mod synthetic;
pub mod toml_config;

// Re-export adapters
pub use capabilities::StaticCodecCapabilities;
pub use fs_output::FsOutputAdapter;
pub use synthetic::{SyntheticDecoder, SyntheticEncoder, SyntheticEncoderOptions};
pub use toml_config::{ConfigError, ConfigLoader};
