//! Append-only hardware debug log.
//!
//! Each loop appends lifecycle and fault lines to a single shared file.
//! Writes are best-effort: a missing directory or full disk must never take
//! a control loop down, so all failures are swallowed.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Best-effort appender for the shared debug file.
#[derive(Debug, Clone)]
pub struct DebugLog {
    path: Option<PathBuf>,
}

impl DebugLog {
    /// Appender writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Appender that drops everything (debug file disabled).
    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// Build from the configured path; an empty path disables the log.
    pub fn from_config(debug_file: &str) -> Self {
        if debug_file.is_empty() {
            Self::disabled()
        } else {
            Self::new(debug_file)
        }
    }

    /// Append one line, prefixed with a coarse timestamp. Failures ignored.
    pub fn append(&self, msg: &str) {
        let Some(path) = &self.path else {
            return;
        };

        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        let _ = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| writeln!(f, "[{:.3}] {}", secs, msg));
    }
}
