// src/watch/ignore.rs

//! Ignore files: the sentinel files through which jobs sharing a working
//! directory tell each other which paths they generate.
//!
//! A job `main` writes `.docwatchignore_main` into the working directory,
//! one pattern per line. Sibling jobs read it and stop reacting to those
//! paths.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::Result;

/// Every ignore file name starts with this.
pub const IGNORE_FILE_PREFIX: &str = ".docwatchignore_";

/// Ignore-file name for a job: `.docwatchignore_<job>`.
pub fn ignore_file_name(job: &str) -> String {
    format!("{IGNORE_FILE_PREFIX}{job}")
}

/// Inverse of [`ignore_file_name`]: the job a file name belongs to, if it is
/// an ignore file at all.
pub fn job_of_ignore_file(file_name: &str) -> Option<&str> {
    file_name
        .strip_prefix(IGNORE_FILE_PREFIX)
        .filter(|job| !job.is_empty() && !job.contains(['/', '\\']))
}

pub fn is_ignore_file_name(file_name: &str) -> bool {
    job_of_ignore_file(file_name).is_some()
}

/// Patterns read from one sibling's ignore file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingIgnoreFile {
    pub job: String,
    pub path: PathBuf,
    pub patterns: Vec<String>,
}

/// The local job's ignore patterns, and the persisted file advertising them.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRegistry {
    patterns: Vec<String>,
}

impl IgnoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern. Returns false if it was already registered.
    pub fn register(&mut self, pattern: impl Into<String>) -> bool {
        let pattern = pattern.into();
        let pattern = pattern.trim();
        if pattern.is_empty() || self.patterns.iter().any(|p| p == pattern) {
            return false;
        }
        self.patterns.push(pattern.to_string());
        true
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Write the pattern set to the job's ignore file in `dir`, replacing any
    /// earlier file of the same job.
    ///
    /// The ignore file itself is registered first, so a job never reacts to
    /// the file it just wrote.
    pub fn persist(&mut self, job: &str, dir: &Path) -> Result<PathBuf> {
        self.register(ignore_file_name(job));

        let path = dir.join(ignore_file_name(job));
        fs::write(&path, self.patterns.join("\n"))?;

        info!(file = ?path, patterns = self.patterns.len(), "persisted ignore file");
        Ok(path)
    }

    /// Read the ignore files of every other job in `dir`.
    ///
    /// Only the top level of `dir` is scanned. A sibling file that disappears
    /// between listing and reading (its job exited) is skipped.
    pub fn discover_siblings(&self, job: &str, dir: &Path) -> Result<Vec<SiblingIgnoreFile>> {
        let mut siblings = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    debug!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            let name = entry.file_name();
            let Some(sibling) = name.to_str().and_then(job_of_ignore_file) else {
                continue;
            };
            if sibling == job {
                continue;
            }

            let path = entry.path();
            if let Some(patterns) = read_ignore_file(&path) {
                debug!(sibling, count = patterns.len(), "discovered sibling job");
                siblings.push(SiblingIgnoreFile {
                    job: sibling.to_string(),
                    path,
                    patterns,
                });
            }
        }

        siblings.sort_by(|a, b| a.job.cmp(&b.job));
        Ok(siblings)
    }
}

/// Parse an ignore file: one pattern per line, surrounding whitespace and
/// blank lines dropped.
///
/// Returns `None` if the file cannot be read; a vanished file is expected
/// when a sibling shuts down.
pub fn read_ignore_file(path: &Path) -> Option<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Some(parse_ignore_lines(&contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(file = ?path, "ignore file vanished before it could be read");
            None
        }
        Err(err) => {
            warn!(file = ?path, error = %err, "failed to read ignore file; skipping");
            None
        }
    }
}

fn parse_ignore_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_round_trips_through_job_parsing() {
        let name = ignore_file_name("main");
        assert_eq!(name, ".docwatchignore_main");
        assert_eq!(job_of_ignore_file(&name), Some("main"));
        assert_eq!(job_of_ignore_file(".docwatchignore_"), None);
        assert_eq!(job_of_ignore_file("main.tex"), None);
    }

    #[test]
    fn register_is_idempotent() {
        let mut reg = IgnoreRegistry::new();
        assert!(reg.register("out.pdf"));
        assert!(!reg.register("out.pdf"));
        assert!(!reg.register("  out.pdf "));
        assert!(!reg.register(""));
        assert_eq!(reg.patterns(), ["out.pdf"]);
    }

    #[test]
    fn persist_includes_own_file_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = IgnoreRegistry::new();
        reg.register("out.pdf");
        reg.register("out.log");

        let path = reg.persist("main", dir.path()).unwrap();
        assert_eq!(path, dir.path().join(".docwatchignore_main"));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "out.pdf\nout.log\n.docwatchignore_main"
        );

        let mut other = IgnoreRegistry::new();
        other.register("other.pdf");
        other.persist("main", dir.path()).unwrap();
        assert_eq!(
            read_ignore_file(&path).unwrap(),
            vec!["other.pdf".to_string(), ".docwatchignore_main".to_string()]
        );
    }

    #[test]
    fn discovery_skips_own_file_and_unrelated_entries() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".docwatchignore_main"), "main.pdf").unwrap();
        fs::write(dir.path().join(".docwatchignore_aux"), "aux.pdf\n\n  aux.log  \n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not an ignore file").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/.docwatchignore_deep"), "deep.pdf").unwrap();

        let reg = IgnoreRegistry::new();
        let siblings = reg.discover_siblings("main", dir.path()).unwrap();

        assert_eq!(siblings.len(), 1);
        assert_eq!(siblings[0].job, "aux");
        assert_eq!(siblings[0].patterns, vec!["aux.pdf", "aux.log"]);
    }

    #[test]
    fn vanished_sibling_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_ignore_file(&dir.path().join(".docwatchignore_gone")), None);
    }
}
