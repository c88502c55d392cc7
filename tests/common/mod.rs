#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

pub use docwatch_test_utils::{eventually, init_tracing, with_timeout};

/// Comfortably longer than a 100ms latency batch plus notify delivery.
pub const QUIET: Duration = Duration::from_millis(800);

pub fn write(path: &Path, contents: &str) {
    std::fs::write(path, contents).expect("writing test file");
}
