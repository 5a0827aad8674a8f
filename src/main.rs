//! CompressX command-line front end
//!
//! # Usage
//!
//! ```bash
//! compressor plan --profile source.json --max-dimension 1280 --fps 24
//! compressor simulate clip.mov --start 1 --end 3 --output out.mp4 --json
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use compressx::cli::{commands, Cli, Commands};
use compressx::utils::logging::{init_logging, LoggingConfig};

/// Main entry point for the compressor CLI
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    init_logging(&LoggingConfig {
        level: cli.log_level,
        format: cli.log_format,
        ..LoggingConfig::default()
    });

    info!("Starting compressor {}", env!("CARGO_PKG_VERSION"));

    // Execute the requested command
    match cli.command {
        Commands::Plan(args) => {
            info!("Executing plan command");
            commands::plan(args)?;
        }
        Commands::Simulate(args) => {
            info!("Executing simulate command");
            commands::simulate(args).await?;
        }
    }

    info!("compressor completed successfully");
    Ok(())
}
