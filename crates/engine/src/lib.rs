//! # Engine
//!
//! `RecordingEngine`: a `TrackingEngine` that records frame arrival and
//! keyframe selection on a background mapping thread and exports them in the
//! standard text formats. It does not estimate motion; every tracked frame
//! gets the identity pose. It lets the bridge run end to end without an
//! external SLAM engine linked in.

mod export;
mod recording;

pub use export::{write_images, write_points3d, write_trajectory_tum, KeyFrame};
pub use recording::{RecordingConfig, RecordingEngine};
