// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, Params, MIN_LISTEN_INTERVAL};
use crate::config::validate::validate_params;
use crate::errors::{DocwatchError, Result};

/// Load a configuration file from a given path and return the raw `ConfigFile`.
///
/// This only performs TOML deserialization; semantic checks happen on the
/// resolved [`Params`] in [`resolve_params`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        DocwatchError::ConfigError(format!("reading config file at {:?}: {e}", path))
    })?;

    let config: ConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Helper to resolve the default config path (`Docwatch.toml` in the
/// current working directory).
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Docwatch.toml")
}

/// Combine CLI arguments, the optional config file and built-in defaults into
/// validated [`Params`].
///
/// An explicitly named config file must exist; the default one is optional.
pub fn resolve_params(args: &CliArgs) -> Result<Params> {
    let cfg = match &args.config {
        Some(path) => load_from_path(path)?,
        None => {
            let path = default_config_path();
            if path.is_file() {
                debug!(?path, "loading default config file");
                load_from_path(&path)?
            } else {
                ConfigFile::default()
            }
        }
    };

    let cwd = std::env::current_dir()?;
    let jobpath = args
        .jobpath
        .clone()
        .or(cfg.jobpath)
        .map(|p| absolutize(&cwd, p))
        .unwrap_or_else(|| cwd.clone());

    let (build, fallback_jobname) = if args.build.is_empty() {
        let build = cfg.build.unwrap_or_default();
        let jobname = default_jobname(build.split_whitespace());
        (build, jobname)
    } else {
        (
            join_argv(&args.build)?,
            default_jobname(args.build.iter().map(String::as_str)),
        )
    };

    let jobname = args.jobname.clone().or(cfg.jobname).unwrap_or(fallback_jobname);

    let tmpdir = args
        .tmpdir
        .clone()
        .or(cfg.tmpdir)
        .map(|p| absolutize(&jobpath, p))
        .unwrap_or_else(|| jobpath.join(format!("{jobname}_docwatchtmp")));

    let listen_interval = listen_interval(args.listen_interval.unwrap_or(cfg.listen_interval))?;

    let mut ignore = cfg.ignore;
    for pattern in &args.ignore {
        if !ignore.contains(pattern) {
            ignore.push(pattern.clone());
        }
    }

    let params = Params {
        daemon: args.daemon || cfg.daemon,
        listen_interval,
        jobname,
        jobpath,
        tmpdir,
        ignore,
        build,
    };

    validate_params(&params)?;
    Ok(params)
}

/// Seconds from the config into a latency. Anything below
/// [`MIN_LISTEN_INTERVAL`] or too large for a `Duration` is rejected.
fn listen_interval(secs: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(latency) if latency >= MIN_LISTEN_INTERVAL => Ok(latency),
        _ => Err(DocwatchError::ConfigError(format!(
            "listen-interval must be at least {} seconds and fit in a duration (got {secs})",
            MIN_LISTEN_INTERVAL.as_secs_f64(),
        ))),
    }
}

/// Join a build command given as separate arguments into one shell command
/// line, quoting each argument so `-- sh -c "make all"` survives `sh -c`.
fn join_argv(argv: &[String]) -> Result<String> {
    shlex::try_join(argv.iter().map(String::as_str)).map_err(|e| {
        DocwatchError::ConfigError(format!("build command cannot be quoted for the shell: {e}"))
    })
}

fn absolutize(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Job name derived from the build command: the stem of the last argument
/// that looks like a file (`latexmk -pdf thesis.tex` → `thesis`).
fn default_jobname<'a>(words: impl DoubleEndedIterator<Item = &'a str>) -> String {
    words
        .rev()
        .filter(|arg| !arg.starts_with('-'))
        .map(Path::new)
        .find(|p| p.extension().is_some())
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "job".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobname_comes_from_the_build_target() {
        let from = |cmd: &str| default_jobname(cmd.split_whitespace());
        assert_eq!(from("latexmk -pdf thesis.tex"), "thesis");
        assert_eq!(from("pandoc notes.md -o notes.pdf"), "notes");
        assert_eq!(from("make"), "job");
        assert_eq!(from(""), "job");
        assert_eq!(default_jobname(["latexmk", "my thesis.tex"].into_iter()), "my thesis");
    }

    #[test]
    fn cli_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("Docwatch.toml");
        fs::write(
            &cfg_path,
            "listen-interval = 2.0\njobname = \"fromfile\"\nignore = [\"a.log\"]\nbuild = \"make\"\n",
        )
        .unwrap();

        let args = CliArgs {
            config: Some(cfg_path),
            jobpath: Some(dir.path().to_path_buf()),
            listen_interval: Some(0.25),
            ignore: vec!["b.pdf".into(), "a.log".into()],
            ..CliArgs::default()
        };

        let params = resolve_params(&args).unwrap();
        assert_eq!(params.listen_interval, Duration::from_millis(250));
        assert_eq!(params.jobname, "fromfile");
        assert_eq!(params.ignore, vec!["a.log".to_string(), "b.pdf".to_string()]);
        assert_eq!(params.build, "make");
        assert!(!params.daemon);
        assert_eq!(params.tmpdir, dir.path().join("fromfile_docwatchtmp"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let args = CliArgs {
            config: Some(PathBuf::from("/definitely/not/here/Docwatch.toml")),
            build: vec!["make".into()],
            ..CliArgs::default()
        };
        assert!(matches!(
            resolve_params(&args),
            Err(DocwatchError::ConfigError(_))
        ));
    }

    #[test]
    fn non_positive_interval_is_rejected() {
        let args = CliArgs {
            listen_interval: Some(0.0),
            build: vec!["make".into()],
            ..CliArgs::default()
        };
        assert!(matches!(
            resolve_params(&args),
            Err(DocwatchError::ConfigError(msg)) if msg.contains("listen-interval")
        ));
    }

    #[test]
    fn interval_below_one_millisecond_is_rejected() {
        for secs in [1e-10, 0.0009, -1.0, f64::NAN] {
            let args = CliArgs {
                listen_interval: Some(secs),
                build: vec!["make".into()],
                ..CliArgs::default()
            };
            assert!(
                matches!(resolve_params(&args), Err(DocwatchError::ConfigError(_))),
                "accepted listen-interval {secs}"
            );
        }
    }

    #[test]
    fn interval_too_large_for_a_duration_is_rejected() {
        for secs in [1e20, f64::INFINITY] {
            let args = CliArgs {
                listen_interval: Some(secs),
                build: vec!["make".into()],
                ..CliArgs::default()
            };
            assert!(matches!(
                resolve_params(&args),
                Err(DocwatchError::ConfigError(msg)) if msg.contains("listen-interval")
            ));
        }
    }

    #[test]
    fn smallest_interval_is_accepted() {
        let args = CliArgs {
            listen_interval: Some(0.001),
            build: vec!["make".into()],
            ..CliArgs::default()
        };
        let params = resolve_params(&args).unwrap();
        assert_eq!(params.listen_interval, MIN_LISTEN_INTERVAL);
    }

    #[test]
    fn build_arguments_keep_their_quoting() {
        let args = CliArgs {
            build: vec!["sh".into(), "-c".into(), "make all".into()],
            ..CliArgs::default()
        };
        let params = resolve_params(&args).unwrap();
        assert_eq!(
            shlex::split(&params.build).unwrap(),
            vec!["sh".to_string(), "-c".to_string(), "make all".to_string()]
        );
    }

    #[test]
    fn build_from_argv_names_the_job_after_its_target() {
        let args = CliArgs {
            build: vec!["latexmk".into(), "-pdf".into(), "my thesis.tex".into()],
            ..CliArgs::default()
        };
        let params = resolve_params(&args).unwrap();
        assert_eq!(params.jobname, "my thesis");
        assert_eq!(
            shlex::split(&params.build).unwrap(),
            vec!["latexmk".to_string(), "-pdf".to_string(), "my thesis.tex".to_string()]
        );
    }
}
