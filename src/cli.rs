// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `initdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "initdag",
    version,
    about = "Run a batch of initialization tasks honoring priorities, dependencies, delays and timeouts.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the batch file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Initdag.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `INITDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the tasks and dependency problems, but don't
    /// run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
