//! Recording engine - tracking entry point plus a background mapping thread

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use async_channel::{Receiver, Sender};
use contracts::{ContractError, EngineResources, ImageView, Pose, TrackingEngine};
use tracing::{debug, info, instrument, warn};

use crate::export::{write_images, write_points3d, write_trajectory_tum, KeyFrame};

/// Capacity of the keyframe channel between tracking and mapping.
/// When the channel is full, tracking blocks briefly.
const KEYFRAME_CHANNEL_CAPACITY: usize = 5;

/// Recording engine configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Every N-th tracked frame becomes a keyframe (the first always does)
    pub keyframe_interval: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            keyframe_interval: 5,
        }
    }
}

#[derive(Debug, Default)]
struct TrackingState {
    tracked: u64,
    next_keyframe_id: u64,
    last_timestamp: Option<f64>,
}

/// Engine that records keyframes without estimating motion
pub struct RecordingEngine {
    config: RecordingConfig,
    tracking: Mutex<TrackingState>,
    keyframes: Arc<Mutex<Vec<KeyFrame>>>,
    kf_sender: Sender<KeyFrame>,
    mapping_handle: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingEngine {
    /// Load the engine from its resources and start the mapping thread
    ///
    /// # Errors
    /// Returns `ContractError::EngineLoad` if either resource cannot be opened
    /// or the mapping thread cannot be spawned.
    #[instrument(name = "engine_load", skip_all, fields(
        vocabulary = %resources.vocabulary.display(),
        settings = %resources.settings.display()
    ))]
    pub fn load(resources: &EngineResources, config: RecordingConfig) -> Result<Self, ContractError> {
        for path in [&resources.vocabulary, &resources.settings] {
            let metadata = File::open(path)
                .and_then(|file| file.metadata())
                .map_err(|e| ContractError::engine_load_io(path, e))?;
            if !metadata.is_file() {
                return Err(ContractError::engine_load(path, "not a regular file"));
            }
        }

        let engine = Self::start(config)?;
        info!("engine loaded");
        Ok(engine)
    }

    /// Start without resource files
    pub fn start(config: RecordingConfig) -> Result<Self, ContractError> {
        let (kf_sender, kf_receiver) = async_channel::bounded(KEYFRAME_CHANNEL_CAPACITY);
        let keyframes = Arc::new(Mutex::new(Vec::new()));

        let mapping_handle = Self::spawn_mapping(kf_receiver, keyframes.clone())
            .map_err(|e| ContractError::engine_load_io("mapping thread", e))?;

        Ok(Self {
            config,
            tracking: Mutex::new(TrackingState::default()),
            keyframes,
            kf_sender,
            mapping_handle: Mutex::new(Some(mapping_handle)),
        })
    }

    fn spawn_mapping(
        kf_receiver: Receiver<KeyFrame>,
        keyframes: Arc<Mutex<Vec<KeyFrame>>>,
    ) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("local-mapping".to_string())
            .spawn(move || {
                // Drains until the tracking side closes the channel
                while let Ok(kf) = kf_receiver.recv_blocking() {
                    debug!(keyframe_id = kf.id, timestamp = kf.timestamp, "keyframe inserted");
                    lock(&keyframes).push(kf);
                }
                debug!("mapping thread finished");
            })
    }

    /// Keyframes inserted so far
    pub fn keyframes(&self) -> Vec<KeyFrame> {
        lock(&self.keyframes).clone()
    }

    /// Frames that were tracked (timestamps strictly increasing)
    pub fn tracked_frames(&self) -> u64 {
        lock(&self.tracking).tracked
    }

    fn save_with<F>(&self, artifact: &str, path: &Path, write: F) -> Result<(), ContractError>
    where
        F: FnOnce(&mut BufWriter<File>, &[KeyFrame]) -> std::io::Result<()>,
    {
        let keyframes = self.keyframes();
        let result = File::create(path).and_then(|file| {
            let mut out = BufWriter::new(file);
            write(&mut out, &keyframes)?;
            out.flush()
        });

        match result {
            Ok(()) => {
                info!(artifact, path = %path.display(), keyframes = keyframes.len(), "saved");
                Ok(())
            }
            Err(e) => Err(ContractError::export(artifact, path, e.to_string())),
        }
    }
}

impl TrackingEngine for RecordingEngine {
    fn track_monocular(&self, image: &ImageView<'_>, timestamp: f64) -> Option<Pose> {
        let keyframe = {
            let mut state = lock(&self.tracking);
            if state.last_timestamp.is_some_and(|last| timestamp <= last) {
                warn!(timestamp, "non-increasing timestamp, frame not tracked");
                return None;
            }
            state.last_timestamp = Some(timestamp);
            state.tracked += 1;

            let interval = self.config.keyframe_interval.max(1);
            if (state.tracked - 1) % interval != 0 {
                None
            } else {
                let id = state.next_keyframe_id;
                state.next_keyframe_id += 1;
                Some(KeyFrame {
                    id,
                    timestamp,
                    pose: Pose::identity(),
                    width: image.width,
                    height: image.height,
                })
            }
        };

        if let Some(kf) = keyframe {
            if self.kf_sender.send_blocking(kf).is_err() {
                debug!(timestamp, "mapping stopped, keyframe discarded");
            }
        }

        Some(Pose::identity())
    }

    fn shutdown(&self) {
        // Closing lets the mapping thread drain pending keyframes and exit.
        self.kf_sender.close();
        let handle = lock(&self.mapping_handle).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("mapping thread panicked");
            }
            info!(keyframes = lock(&self.keyframes).len(), "engine stopped");
        }
    }

    fn save_keyframe_trajectory(&self, path: &Path) -> Result<(), ContractError> {
        self.save_with("keyframe trajectory", path, |out, kfs| {
            write_trajectory_tum(out, kfs)
        })
    }

    fn save_keypoints_and_map_points(&self, path: &Path) -> Result<(), ContractError> {
        self.save_with("keypoints and map points", path, |out, kfs| {
            write_images(out, kfs)
        })
    }

    fn save_point_cloud(&self, path: &Path) -> Result<(), ContractError> {
        self.save_with("point cloud", path, |out, _| write_points3d(out, 0))
    }
}

impl Drop for RecordingEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
