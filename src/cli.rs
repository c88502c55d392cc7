// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every flag here is optional; unset flags fall back to the TOML config file
//! and then to built-in defaults (see [`crate::config::resolve_params`]).

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `docwatch`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "docwatch",
    version,
    about = "Build documents, and rebuild them when their sources change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Docwatch.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Re-run the build automatically when files change.
    #[arg(short = 'd', long)]
    pub daemon: bool,

    /// Time after which daemon mode checks for changes (in seconds).
    #[arg(long, value_name = "SECS")]
    pub listen_interval: Option<f64>,

    /// Job identifier; names the ignore file shared with sibling jobs.
    #[arg(long, value_name = "NAME")]
    pub jobname: Option<String>,

    /// Working directory to watch (default: current directory).
    #[arg(long, value_name = "DIR")]
    pub jobpath: Option<PathBuf>,

    /// Temporary build directory; files vanishing from the working directory
    /// are removed from here before each rebuild.
    #[arg(long, value_name = "DIR")]
    pub tmpdir: Option<PathBuf>,

    /// Extra path or glob to ignore (may be repeated).
    #[arg(long = "ignore", value_name = "PATTERN")]
    pub ignore: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DOCWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Build command, e.g. `docwatch -d -- latexmk -pdf main.tex`.
    #[arg(last = true, value_name = "CMD")]
    pub build: Vec<String>,
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
