// src/watch/patterns.rs

use std::fmt;

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use tracing::warn;

use crate::watch::ignore::is_ignore_file_name;

/// Returns true if `pattern` uses glob syntax rather than naming a literal
/// path prefix.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Compiled exclusion set for the primary watcher.
///
/// Patterns are relative to the working directory; the watcher passes
/// relative paths (e.g. `"chapters/intro.tex"`) into [`IgnoreSet::is_ignored`].
///
/// - A literal pattern excludes every path starting with it, so `out.pdf`
///   also covers `out.pdf.bak`, and `build` covers `build/x.aux`.
/// - A glob pattern (`*`, `?`, `[..]`, `{..}`) is matched against the whole
///   relative path.
/// - Ignore files of any job are always excluded.
///
/// The set only grows: patterns are added by the local job at start and by
/// siblings as they are discovered, and never removed.
#[derive(Clone)]
pub struct IgnoreSet {
    patterns: Vec<String>,
    literal: Option<Regex>,
    globs: GlobSet,
}

impl fmt::Debug for IgnoreSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IgnoreSet")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            literal: None,
            globs: GlobSet::empty(),
        }
    }
}

impl IgnoreSet {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        set.extend(patterns);
        set
    }

    /// Add patterns and recompile. Returns how many were new.
    pub fn extend<I, S>(&mut self, patterns: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for pat in patterns {
            let pat = normalize(pat.as_ref());
            if pat.is_empty() || self.patterns.iter().any(|p| p == pat) {
                continue;
            }
            self.patterns.push(pat.to_string());
            added += 1;
        }

        if added > 0 {
            self.literal = build_literal_regex(&self.patterns);
            self.globs = build_globset(&self.patterns);
        }
        added
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn contains(&self, pattern: &str) -> bool {
        let pattern = normalize(pattern);
        self.patterns.iter().any(|p| p == pattern)
    }

    /// Returns true if a change to `rel_path` must not trigger a rebuild.
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        let rel_path = rel_path.strip_prefix("./").unwrap_or(rel_path);

        let first = rel_path.split('/').next().unwrap_or(rel_path);
        if is_ignore_file_name(first) {
            return true;
        }

        if let Some(re) = &self.literal {
            if re.is_match(rel_path) {
                return true;
            }
        }
        self.globs.is_match(rel_path)
    }
}

fn normalize(pattern: &str) -> &str {
    let pattern = pattern.trim();
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    pattern.trim_end_matches('/')
}

/// One anchored alternation of all literal patterns: `^(?:a|b|c)`.
fn build_literal_regex(patterns: &[String]) -> Option<Regex> {
    let literals: Vec<String> = patterns
        .iter()
        .filter(|p| !is_glob(p))
        .map(|p| regex::escape(p))
        .collect();
    if literals.is_empty() {
        return None;
    }

    let source = format!("^(?:{})", literals.join("|"));
    match Regex::new(&source) {
        Ok(re) => Some(re),
        Err(err) => {
            warn!(error = %err, "failed to compile literal ignore patterns");
            None
        }
    }
}

/// Build a GlobSet from the glob-style patterns, skipping invalid ones.
///
/// Local patterns are validated up front; invalid ones can only come from a
/// sibling's ignore file, which must not take this job down.
fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns.iter().filter(|p| is_glob(p)) {
        match Glob::new(pat) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(err) => warn!(pattern = %pat, error = %err, "ignoring invalid glob pattern"),
        }
    }
    builder.build().unwrap_or_else(|err| {
        warn!(error = %err, "failed to build ignore globset");
        GlobSet::empty()
    })
}
