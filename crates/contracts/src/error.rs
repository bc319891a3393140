//! Layered error definitions
//!
//! Categorized by source: engine / export / io

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Engine Errors =====
    /// Engine could not be constructed from its resources
    #[error("engine load error for '{}': {message}", path.display())]
    EngineLoad {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Engine failed to write an export artifact
    #[error("export '{artifact}' to '{}' failed: {message}", path.display())]
    Export {
        artifact: String,
        path: PathBuf,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create engine load error
    pub fn engine_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::EngineLoad {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create engine load error with the underlying io error
    pub fn engine_load_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::EngineLoad {
            path: path.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create export error
    pub fn export(
        artifact: impl Into<String>,
        path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self::Export {
            artifact: artifact.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}
