// src/logging.rs

//! Logging setup for `docwatch` using `tracing` + `tracing-subscriber`.
//!
//! Filter selection:
//! 1. `--log-level` CLI flag (if provided) sets one global level
//! 2. `DOCWATCH_LOG` holds `EnvFilter` directives, e.g. `debug` or
//!    `info,docwatch::watch=trace`
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that stdout stays free for build output and
//! the daemon prompt.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable holding filter directives.
pub const LOG_ENV: &str = "DOCWATCH_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

/// The CLI level wins; otherwise the env directives, if they parse.
fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(directive(level));
    }
    match env.map(EnvFilter::try_new) {
        Some(Ok(filter)) => filter,
        Some(Err(err)) => {
            eprintln!("docwatch: ignoring invalid {LOG_ENV}: {err}");
            EnvFilter::new("info")
        }
        None => EnvFilter::new("info"),
    }
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shown(filter: EnvFilter) -> String {
        filter.to_string().to_lowercase()
    }

    #[test]
    fn per_module_directives_come_from_the_environment() {
        let filter = shown(build_filter(None, Some("info,docwatch::watch=debug")));
        assert!(filter.contains("docwatch::watch=debug"), "{filter}");
    }

    #[test]
    fn cli_level_overrides_environment() {
        let filter = shown(build_filter(Some(LogLevel::Trace), Some("docwatch::watch=debug")));
        assert!(filter.contains("trace"), "{filter}");
        assert!(!filter.contains("docwatch::watch"), "{filter}");
    }

    #[test]
    fn invalid_or_missing_environment_falls_back_to_info() {
        assert!(shown(build_filter(None, None)).contains("info"));
        let filter = shown(build_filter(None, Some("docwatch=loudest")));
        assert!(filter.contains("info"), "{filter}");
        assert!(!filter.contains("docwatch"), "{filter}");
    }
}
