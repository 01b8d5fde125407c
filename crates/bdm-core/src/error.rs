//! Error types shared across the core.
//!
//! `ConfigError` aborts a batch before any task starts. `DestinationError` is
//! scoped to a single task and ends up in that task's failure detail.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Problems detected before any task is started.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parallelism must be at least 1 (got {0})")]
    InvalidParallelism(usize),

    #[error("no locators given")]
    NoLocators,

    #[error("invalid locator '{locator}': {reason}")]
    InvalidLocator { locator: String, reason: String },

    #[error("destination '{}' is not usable: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: DestinationError,
    },

    #[error("retrieval command '{0}' not found in PATH")]
    ToolNotFound(String),
}

/// Failure to prepare a task's target directory.
#[derive(Debug, Error)]
pub enum DestinationError {
    #[error("could not determine current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("could not create directory '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("directory '{}' is not writable: {source}", path.display())]
    NotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{}' exists and is not a directory", path.display())]
    NotADirectory { path: PathBuf },
}
