//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only, never on each other's internals.
//!
//! ## Time Model
//! - Frame timestamps are seconds (`f64`) taken from the transport header stamp
//! - Output sessions are named from local wall-clock time at shutdown

mod engine;
mod error;
mod frame_source;
mod image;
mod shutdown;

pub use engine::*;
pub use error::*;
pub use frame_source::{FrameCallback, FrameSource};
pub use image::*;
pub use shutdown::ShutdownToken;
