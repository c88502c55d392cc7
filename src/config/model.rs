// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Default for `listen-interval`, in seconds.
pub const DEFAULT_LISTEN_INTERVAL: f64 = 0.5;

/// Smallest accepted `listen-interval`; the watcher ticks at this period.
pub const MIN_LISTEN_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration as read from a TOML file.
///
/// ```toml
/// daemon = true
/// listen-interval = 0.5
/// jobname = "main"
/// ignore = ["out.pdf", "out.log", "build/**"]
/// build = "latexmk -pdf main.tex"
/// ```
///
/// Every key is optional; CLI flags take precedence.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    /// Re-run the build whenever files change.
    #[serde(default)]
    pub daemon: bool,

    /// Watch latency in seconds.
    #[serde(default = "default_listen_interval")]
    pub listen_interval: f64,

    #[serde(default)]
    pub jobname: Option<String>,

    #[serde(default)]
    pub jobpath: Option<PathBuf>,

    #[serde(default)]
    pub tmpdir: Option<PathBuf>,

    /// Paths or globs (relative to `jobpath`) this job generates and that
    /// must never trigger a rebuild, here or in sibling jobs.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Shell command performing one build.
    #[serde(default)]
    pub build: Option<String>,
}

fn default_listen_interval() -> f64 {
    DEFAULT_LISTEN_INTERVAL
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            daemon: false,
            listen_interval: default_listen_interval(),
            jobname: None,
            jobpath: None,
            tmpdir: None,
            ignore: Vec::new(),
            build: None,
        }
    }
}

/// Fully resolved parameters: config file + CLI + defaults.
#[derive(Debug, Clone)]
pub struct Params {
    pub daemon: bool,
    pub listen_interval: Duration,
    pub jobname: String,
    /// Absolute working directory.
    pub jobpath: PathBuf,
    /// Absolute temporary build directory.
    pub tmpdir: PathBuf,
    pub ignore: Vec<String>,
    pub build: String,
}
