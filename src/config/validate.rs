// src/config/validate.rs

use globset::Glob;

use crate::config::model::Params;
use crate::errors::{DocwatchError, Result};
use crate::watch::patterns::is_glob;

/// Run semantic validation against resolved parameters.
///
/// This checks:
/// - a build command is present
/// - the job name is usable as part of a file name
/// - every glob-style ignore pattern compiles
pub fn validate_params(params: &Params) -> Result<()> {
    ensure_has_build(params)?;
    validate_jobname(&params.jobname)?;
    validate_ignore_patterns(&params.ignore)?;
    Ok(())
}

fn ensure_has_build(params: &Params) -> Result<()> {
    if params.build.trim().is_empty() {
        return Err(DocwatchError::ConfigError(
            "no build command given (pass it after `--` or set `build` in the config)"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_jobname(jobname: &str) -> Result<()> {
    if jobname.is_empty() {
        return Err(DocwatchError::ConfigError(
            "jobname must not be empty".to_string(),
        ));
    }
    if jobname.contains(['/', '\\']) || jobname == "." || jobname == ".." {
        return Err(DocwatchError::ConfigError(format!(
            "jobname '{}' must be a plain name, not a path",
            jobname
        )));
    }
    Ok(())
}

fn validate_ignore_patterns(patterns: &[String]) -> Result<()> {
    for pat in patterns.iter().filter(|p| is_glob(p)) {
        Glob::new(pat).map_err(|e| {
            DocwatchError::ConfigError(format!("invalid ignore pattern '{}': {}", pat, e))
        })?;
    }
    Ok(())
}
