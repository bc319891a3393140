//! Error types for CLI operations.

use clap::error::ErrorKind;
use session::SessionError;
use thiserror::Error;

/// Exit status for argument errors and unclassified failures
pub const EXIT_FAILURE: u8 = 1;

/// Exit status after clap rejected the arguments or printed help / version
pub fn parse_exit(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => EXIT_FAILURE,
    }
}

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Session failed; carries its own exit status
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Generic error wrapper
    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Session(e) => e.exit_code(),
            Self::Other(_) => EXIT_FAILURE,
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
