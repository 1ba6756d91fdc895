// src/errors.rs

//! Crate-wide error types.
//!
//! Setup failures get a structured type so `main` can tell a bad invocation
//! (print usage, exit 1) apart from a fatal startup error (report and exit 1).
//! Everything past startup flows through `anyhow`.

use thiserror::Error;

/// Errors that can occur before the watch loop starts.
///
/// All of these are fatal: the program never starts watching with a partial
/// setup.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Invalid command line. The message is shown together with the usage line.
    #[error("{0}")]
    Usage(String),

    /// A command token named an existing path we could not stat.
    #[error("cannot stat '{path}': {source}")]
    Stat {
        path: String,
        source: std::io::Error,
    },

    /// The current working directory could not be resolved for the
    /// watch-everything fallback.
    #[error("cannot resolve working directory: {0}")]
    WorkingDir(#[source] std::io::Error),

    /// The filesystem notification subscription could not be created or a
    /// watch path could not be added to it.
    #[error("failed to start file watcher: {0}")]
    Watch(#[from] notify::Error),
}

pub use anyhow::{Error, Result};
