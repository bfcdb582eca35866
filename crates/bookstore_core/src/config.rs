//! Host-supplied configuration for the catalog core.
//!
//! # Responsibility
//! - Describe where the catalog database lives and how long catalog
//!   transactions may wait on SQLite locks.
//! - Carry logging settings consumed by [`crate::logging::init_logging`].
//!
//! # Invariants
//! - Every field has a default, so partial documents deserialize.
//! - Loading the document itself (env, files) belongs to the host.

use crate::logging::{default_log_level, init_logging, LoggingError};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Catalog core settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// SQLite database file. `None` selects a private in-memory database.
    pub db_path: Option<PathBuf>,
    /// Maximum lock wait per statement, in milliseconds.
    pub busy_timeout_ms: u64,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CatalogConfig {
    /// Config for a file-backed database with default settings.
    pub fn with_db_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Starts file logging when `log_dir` is configured.
    ///
    /// Returns `Ok(false)` when no directory is configured.
    ///
    /// # Errors
    /// - Propagates [`init_logging`] errors (bad level, relative directory,
    ///   conflicting re-initialization).
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        match self.log_dir.as_deref() {
            Some(log_dir) => init_logging(&self.log_level, log_dir).map(|()| true),
            None => Ok(false),
        }
    }
}
