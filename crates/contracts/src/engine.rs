//! TrackingEngine trait - the external tracking/mapping collaborator
//!
//! The engine owns its background threads (mapping, loop closing) and its
//! own synchronisation. Callers only see the entry points below.

use std::path::{Path, PathBuf};

use nalgebra::Isometry3;

use crate::{ContractError, ImageView};

/// Camera pose (world from camera)
pub type Pose = Isometry3<f64>;

/// Resources an engine is loaded from. Both are opaque to this workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineResources {
    /// Visual vocabulary file
    pub vocabulary: PathBuf,

    /// Camera / tracker settings file
    pub settings: PathBuf,
}

impl EngineResources {
    pub fn new(vocabulary: impl Into<PathBuf>, settings: impl Into<PathBuf>) -> Self {
        Self {
            vocabulary: vocabulary.into(),
            settings: settings.into(),
        }
    }
}

/// Monocular tracking engine
///
/// All methods take `&self`: the engine serialises access to its own state.
/// `track_monocular` is called at most once at a time, in frame arrival order.
pub trait TrackingEngine: Send + Sync {
    /// Track one frame. Returns `None` when tracking is lost.
    fn track_monocular(&self, image: &ImageView<'_>, timestamp: f64) -> Option<Pose>;

    /// Stop all engine threads, blocking until they have quiesced
    fn shutdown(&self);

    /// Write the keyframe trajectory (TUM format)
    fn save_keyframe_trajectory(&self, path: &Path) -> Result<(), ContractError>;

    /// Write the per-keyframe keypoint / map-point index
    fn save_keypoints_and_map_points(&self, path: &Path) -> Result<(), ContractError>;

    /// Write the map point cloud
    fn save_point_cloud(&self, path: &Path) -> Result<(), ContractError>;
}
