//! # Session
//!
//! Session lifecycle for the monocular frame bridge.
//!
//! Responsibilities:
//! - Own the tracking engine for the whole session
//! - Subscribe the frame grabber while streaming
//! - On shutdown: unsubscribe, stop the engine, prepare the timestamped
//!   output directory, then ask the engine to export
//!
//! Filesystem failures during preparation abort the export and map to exit
//! status 255.

mod controller;
mod error;
mod output;
pub mod paths;

pub use controller::{SessionConfig, SessionController, SessionReport, SessionState};
pub use error::{
    PathError, PrepareStep, Result, SessionError, EXIT_ENGINE_LOAD, EXIT_PREPARE_FAILED,
};
pub use output::{
    prepare as prepare_output, session_dir_name, OutputFileSet, OutputSession,
    DEFAULT_OUTPUT_ROOT, IMAGES_FILE, POINTS_FILE, TRAJECTORY_FILE,
};
