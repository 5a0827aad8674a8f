//! CLI module for compressx
//!
//! This module handles command-line argument parsing and command execution.

use clap::{Parser, Subcommand};

use crate::utils::logging::{LogFormat, LogLevel};

pub mod args;
pub mod commands;

pub use args::{ConfigArgs, PlanArgs, SimulateArgs};

/// Video compression planner and transcode simulator
#[derive(Parser, Debug)]
#[command(name = "compressor")]
#[command(about = "Plan and run video compression with trimming, resizing and frame-rate reduction")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (RUST_LOG overrides it)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    /// Log output format (pretty, compact, json)
    #[arg(long, default_value = "compact", global = true)]
    pub log_format: LogFormat,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the resolved trim window and derived target settings as JSON
    Plan(PlanArgs),
    /// Run a full transcode session with the synthetic decoder and encoder
    Simulate(SimulateArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::try_parse_from([
            "compressor",
            "--log-level",
            "debug",
            "simulate",
            "in.mov",
            "--start",
            "0:01.5",
            "--max-dimension",
            "720",
            "--reducer",
            "random",
        ])
        .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.settings.start.unwrap().as_seconds(), 1.5);
                assert_eq!(args.settings.max_dimension, Some(720));
                assert_eq!(args.settings.reducer, crate::engine::ReductionStrategy::Random);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bitrate_conflicts_with_quality() {
        let result = Cli::try_parse_from([
            "compressor", "plan", "--profile", "p.json", "--bitrate", "1000", "--quality", "0.5",
        ]);
        assert!(result.is_err());
    }
}
