//! Error types for the installer.

use std::path::PathBuf;

use thiserror::Error;

use crate::solver::{RequestError, SolverError};

/// Errors that abort an install or update run.
#[derive(Error, Debug)]
pub enum InstallerError {
    /// The solver could not produce a consistent operation list.
    #[error("Your requirements could not be resolved to an installable set of packages.\n{0}")]
    Unsatisfiable(#[from] SolverError),

    /// A pre or post hook listener failed.
    #[error("Hook \"{event}\" failed for operation #{index} ({package})")]
    Hook {
        event: String,
        index: usize,
        package: String,
        #[source]
        source: anyhow::Error,
    },

    /// A run-level hook listener failed (outside the operation loop).
    #[error("Hook \"{event}\" failed")]
    RunHook {
        event: String,
        #[source]
        source: anyhow::Error,
    },

    /// The materializer failed to apply an operation.
    #[error("Operation #{index} failed: {operation}")]
    Materialization {
        index: usize,
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Request(#[from] RequestError),

    /// The lock was written without dev information but dev packages were requested.
    #[error("The lock file does not contain require-dev information, run install with dev mode disabled or delete it and run it again.")]
    MissingDevLockData,

    #[error("Invalid root package: {0}")]
    InvalidRoot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Atomic replacement of a persisted file failed.
    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Version(#[from] lockstep_semver::ParseError),
}

/// Result type for installer operations.
pub type Result<T> = std::result::Result<T, InstallerError>;
