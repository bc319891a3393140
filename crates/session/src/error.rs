//! Session error types

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::SessionState;

/// Exit status for filesystem preparation failures (`-1` as a process status)
pub const EXIT_PREPARE_FAILED: u8 = 255;

/// Exit status when the engine cannot be loaded
pub const EXIT_ENGINE_LOAD: u8 = 2;

/// Filesystem error carrying the offending path
#[derive(Debug, Error)]
pub enum PathError {
    /// The underlying system call failed
    #[error("{} - {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Something other than a directory already occupies the path
    #[error("{} - exists and is not a directory", path.display())]
    NotADirectory { path: PathBuf },
}

impl PathError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Path the failing operation was applied to
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::NotADirectory { path } => path,
        }
    }
}

/// Shutdown step that failed while preparing the output session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareStep {
    /// Creating the base directory and its parents
    BaseDirectory,
    /// Creating the timestamped session directory
    SessionDirectory,
    /// Creating one of the output files
    OutputFile,
}

impl std::fmt::Display for PrepareStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let step = match self {
            Self::BaseDirectory | Self::SessionDirectory => "Failed to create directory",
            Self::OutputFile => "Failed to create file",
        };
        f.write_str(step)
    }
}

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Engine could not be constructed
    #[error("engine load failed: {0}")]
    EngineLoad(#[source] contracts::ContractError),

    /// Subscription could not be established
    #[error("subscription failed: {0}")]
    Subscribe(#[from] ingestion::IngestionError),

    /// Output directory or file preparation failed; export skipped
    #[error("{step} {source}")]
    PrepareOutput {
        step: PrepareStep,
        #[source]
        source: PathError,
    },

    /// Operation called in the wrong lifecycle state
    #[error("invalid session transition from {from} to {to}")]
    InvalidTransition { from: SessionState, to: SessionState },

    /// Blocking shutdown task did not complete
    #[error("shutdown task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl SessionError {
    pub fn prepare(step: PrepareStep, source: PathError) -> Self {
        Self::PrepareOutput { step, source }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::EngineLoad(_) => EXIT_ENGINE_LOAD,
            Self::PrepareOutput { .. } => EXIT_PREPARE_FAILED,
            Self::Subscribe(_) | Self::InvalidTransition { .. } | Self::Join(_) => 1,
        }
    }
}

/// Session Result 类型别名
pub type Result<T> = std::result::Result<T, SessionError>;
