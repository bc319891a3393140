//! Frame grabber - forwards transport frames to the tracking engine

use std::sync::{Arc, Weak};

use contracts::{ImageMessage, TrackingEngine};
use tracing::{debug, error, trace};

use crate::adapter::FrameHandler;
use crate::config::IngestionMetrics;
use crate::converter::to_image_view;

/// Frame ingestion adapter
///
/// Holds a non-owning handle to exactly one engine. The session controller
/// owns the engine; once the controller has dropped it, frames are discarded.
/// Conversion failures are logged and the frame is dropped; they never end
/// the session.
pub struct FrameGrabber<E: TrackingEngine> {
    engine: Weak<E>,
    metrics: Arc<IngestionMetrics>,
}

impl<E: TrackingEngine> FrameGrabber<E> {
    pub fn new(engine: &Arc<E>, metrics: Arc<IngestionMetrics>) -> Self {
        Self {
            engine: Arc::downgrade(engine),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }

    /// Forward one frame to the engine
    pub fn grab(&self, msg: &ImageMessage) {
        let view = match to_image_view(msg) {
            Ok(view) => view,
            Err(e) => {
                self.metrics.record_conversion_error();
                error!(
                    frame_id = %msg.header.frame_id,
                    encoding = %msg.encoding,
                    error = %e,
                    "image conversion failed, frame dropped"
                );
                return;
            }
        };

        let Some(engine) = self.engine.upgrade() else {
            debug!("engine released, frame dropped");
            return;
        };

        let timestamp = msg.timestamp();
        let pose = engine.track_monocular(&view, timestamp);
        self.metrics.record_tracked(pose.is_some());
        trace!(timestamp, tracked = pose.is_some(), "frame forwarded");
    }
}

impl<E: TrackingEngine> FrameHandler for FrameGrabber<E> {
    fn on_frame(&mut self, msg: &ImageMessage) {
        self.grab(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    use bytes::Bytes;
    use contracts::{ContractError, Header, ImageView, Pose, Stamp};

    #[derive(Default)]
    struct TimestampLog {
        timestamps: Mutex<Vec<f64>>,
    }

    impl TrackingEngine for TimestampLog {
        fn track_monocular(&self, image: &ImageView<'_>, timestamp: f64) -> Option<Pose> {
            assert!(image.width > 0);
            self.timestamps.lock().unwrap().push(timestamp);
            Some(Pose::identity())
        }

        fn shutdown(&self) {}

        fn save_keyframe_trajectory(&self, _path: &Path) -> Result<(), ContractError> {
            Ok(())
        }

        fn save_keypoints_and_map_points(&self, _path: &Path) -> Result<(), ContractError> {
            Ok(())
        }

        fn save_point_cloud(&self, _path: &Path) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn frame(secs: f64, encoding: &str, len: usize) -> ImageMessage {
        ImageMessage {
            header: Header {
                stamp: Stamp::from_secs_f64(secs),
                frame_id: "camera".to_string(),
            },
            height: 2,
            width: 2,
            encoding: encoding.to_string(),
            is_bigendian: false,
            step: 2,
            data: Bytes::from(vec![0u8; len]),
        }
    }

    #[test]
    fn test_forwards_timestamp_in_seconds() {
        let engine = Arc::new(TimestampLog::default());
        let mut grabber = FrameGrabber::new(&engine, Arc::new(IngestionMetrics::new()));

        grabber.on_frame(&frame(1.25, "mono8", 4));

        let timestamps = engine.timestamps.lock().unwrap();
        assert_eq!(timestamps.len(), 1);
        assert!((timestamps[0] - 1.25).abs() < 1e-9);
        assert_eq!(grabber.metrics().snapshot().tracked, 1);
    }

    #[test]
    fn test_malformed_frame_dropped_and_stream_continues() {
        let engine = Arc::new(TimestampLog::default());
        let mut grabber = FrameGrabber::new(&engine, Arc::new(IngestionMetrics::new()));

        grabber.on_frame(&frame(1.0, "mono8", 4));
        grabber.on_frame(&frame(2.0, "mono8", 1));
        grabber.on_frame(&frame(3.0, "not_an_encoding", 4));
        grabber.on_frame(&frame(4.0, "mono8", 4));

        let timestamps = engine.timestamps.lock().unwrap().clone();
        assert_eq!(timestamps, vec![1.0, 4.0]);

        let snapshot = grabber.metrics().snapshot();
        assert_eq!(snapshot.conversion_errors, 2);
        assert_eq!(snapshot.tracked, 2);
    }

    #[test]
    fn test_does_not_own_engine() {
        let engine = Arc::new(TimestampLog::default());
        let mut grabber = FrameGrabber::new(&engine, Arc::new(IngestionMetrics::new()));
        assert_eq!(Arc::strong_count(&engine), 1);

        drop(engine);
        grabber.on_frame(&frame(1.0, "mono8", 4));
        assert_eq!(grabber.metrics().snapshot().tracked, 0);
    }
}
