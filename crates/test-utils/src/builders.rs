#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use docwatch::daemon::SessionOptions;

/// Builder for `SessionOptions` to simplify test setup.
pub struct SessionOptionsBuilder {
    options: SessionOptions,
}

impl SessionOptionsBuilder {
    /// Job `job` watching `jobpath`, tmp dir `<jobpath>/<job>_docwatchtmp`,
    /// 100ms latency.
    pub fn new(job: &str, jobpath: &Path) -> Self {
        Self {
            options: SessionOptions {
                job: job.to_string(),
                jobpath: jobpath.to_path_buf(),
                tmpdir: jobpath.join(format!("{job}_docwatchtmp")),
                latency: Duration::from_millis(100),
                ignore: Vec::new(),
            },
        }
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.options.ignore.push(pattern.to_string());
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.options.latency = latency;
        self
    }

    pub fn tmpdir(mut self, tmpdir: &Path) -> Self {
        self.options.tmpdir = tmpdir.to_path_buf();
        self
    }

    pub fn build(self) -> SessionOptions {
        self.options
    }
}
