//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 会话关闭流程的文件系统场景
//! - 损坏帧不中断流
//! - 模拟相机 e2e 测试（无需真实相机）

#[cfg(test)]
mod support {
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;
    use contracts::{
        ContractError, EngineResources, FrameCallback, FrameSource, Header, ImageMessage,
        ImageView, Pose, Stamp, TrackingEngine,
    };
    use engine::{RecordingConfig, RecordingEngine};

    /// Recording engine that notes each artifact's size right before it is exported
    pub struct SizeRecordingEngine {
        pub inner: RecordingEngine,
        pub sizes_before_export: Mutex<Vec<u64>>,
    }

    impl SizeRecordingEngine {
        pub fn load(resources: &EngineResources) -> Result<Self, ContractError> {
            Ok(Self {
                inner: RecordingEngine::load(resources, RecordingConfig::default())?,
                sizes_before_export: Mutex::new(Vec::new()),
            })
        }

        pub fn sizes(&self) -> Vec<u64> {
            self.sizes_before_export.lock().unwrap().clone()
        }

        fn record_size(&self, path: &Path) {
            let len = std::fs::metadata(path).map(|m| m.len()).unwrap_or(u64::MAX);
            self.sizes_before_export.lock().unwrap().push(len);
        }
    }

    impl TrackingEngine for SizeRecordingEngine {
        fn track_monocular(&self, image: &ImageView<'_>, timestamp: f64) -> Option<Pose> {
            self.inner.track_monocular(image, timestamp)
        }

        fn shutdown(&self) {
            self.inner.shutdown();
        }

        fn save_keyframe_trajectory(&self, path: &Path) -> Result<(), ContractError> {
            self.record_size(path);
            self.inner.save_keyframe_trajectory(path)
        }

        fn save_keypoints_and_map_points(&self, path: &Path) -> Result<(), ContractError> {
            self.record_size(path);
            self.inner.save_keypoints_and_map_points(path)
        }

        fn save_point_cloud(&self, path: &Path) -> Result<(), ContractError> {
            self.record_size(path);
            self.inner.save_point_cloud(path)
        }
    }

    /// Vocabulary and settings files inside `dir`
    pub fn resources(dir: &Path) -> EngineResources {
        let vocabulary = dir.join("ORBvoc.txt");
        let settings = dir.join("camera.yaml");
        std::fs::write(&vocabulary, "vocabulary").unwrap();
        std::fs::write(&settings, "Camera.fx: 500.0\n").unwrap();
        EngineResources::new(vocabulary, settings)
    }

    /// Source that publishes only when the test says so
    #[derive(Clone, Default)]
    pub struct ManualSource {
        callback: Arc<Mutex<Option<FrameCallback>>>,
        listening: Arc<AtomicBool>,
    }

    impl ManualSource {
        pub fn publish(&self, msg: ImageMessage) {
            let callback = self.callback.lock().unwrap().clone();
            if let Some(callback) = callback {
                callback(msg);
            }
        }
    }

    impl FrameSource for ManualSource {
        fn topic(&self) -> &str {
            ingestion::DEFAULT_IMAGE_TOPIC
        }

        fn listen(&self, callback: FrameCallback) {
            if !self.listening.swap(true, Ordering::SeqCst) {
                *self.callback.lock().unwrap() = Some(callback);
            }
        }

        fn stop(&self) {
            self.listening.store(false, Ordering::SeqCst);
            self.callback.lock().unwrap().take();
        }

        fn is_listening(&self) -> bool {
            self.listening.load(Ordering::SeqCst)
        }
    }

    /// 4x4 mono8 frame; `malformed` drops the last row
    pub fn frame(secs: f64, malformed: bool) -> ImageMessage {
        let len = if malformed { 12 } else { 16 };
        ImageMessage {
            header: Header {
                stamp: Stamp::from_secs_f64(secs),
                frame_id: "camera".to_string(),
            },
            height: 4,
            width: 4,
            encoding: "mono8".to_string(),
            is_bigendian: false,
            step: 4,
            data: Bytes::from(vec![128u8; len]),
        }
    }

    pub fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..400 {
            if condition() {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        panic!("condition not reached");
    }
}

#[cfg(test)]
mod shutdown_tests {
    use std::fs;

    use chrono::{Local, TimeZone};
    use contracts::ShutdownToken;
    use ingestion::{MockFrameConfig, MockFrameSource};
    use session::{
        PathError, PrepareStep, SessionConfig, SessionController, SessionError, SessionState,
        EXIT_PREPARE_FAILED, IMAGES_FILE, POINTS_FILE, TRAJECTORY_FILE,
    };
    use tempfile::tempdir;

    use crate::support::{resources, SizeRecordingEngine};

    fn camera(max_frames: u64) -> MockFrameSource {
        MockFrameSource::new(MockFrameConfig {
            frequency_hz: 200.0,
            width: 8,
            height: 6,
            max_frames: Some(max_frames),
            ..Default::default()
        })
    }

    /// Scenario A: no output root yet
    #[test]
    fn test_fresh_directory_gets_one_session_with_empty_artifacts() {
        let root = tempdir().unwrap();
        let output_root = root.path().join("dataset");
        let config = SessionConfig {
            output_root: output_root.clone(),
            ..SessionConfig::new(resources(root.path()))
        };

        let mut controller = SessionController::new(config);
        controller
            .start(SizeRecordingEngine::load, Box::new(camera(10)))
            .unwrap();
        crate::support::wait_until(|| controller.metrics().snapshot().received == 10);
        controller.stop().unwrap();

        let files = controller.prepare_output(&Local::now()).unwrap();
        controller.export(&files).unwrap();

        let sessions: Vec<_> = fs::read_dir(&output_root).unwrap().collect();
        assert_eq!(sessions.len(), 1);

        let engine = controller.engine().unwrap();
        assert_eq!(engine.sizes(), vec![0, 0, 0]);

        // exports landed in the prepared files
        let trajectory = fs::read_to_string(&files.trajectory).unwrap();
        assert!(!trajectory.is_empty());
        assert_eq!(
            trajectory.lines().count(),
            engine.inner.keyframes().len()
        );
        assert!(fs::read_to_string(&files.images)
            .unwrap()
            .starts_with("# Image list"));
    }

    /// Scenario B: the output root is a regular file
    #[test]
    fn test_output_root_is_file_aborts_before_any_other_step() {
        let root = tempdir().unwrap();
        let output_root = root.path().join("dataset");
        fs::write(&output_root, "occupied").unwrap();

        let config = SessionConfig {
            output_root: output_root.clone(),
            ..SessionConfig::new(resources(root.path()))
        };
        let mut controller = SessionController::new(config);
        controller
            .start(SizeRecordingEngine::load, Box::new(camera(3)))
            .unwrap();
        controller.stop().unwrap();

        let err = controller.prepare_output(&Local::now()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::PrepareOutput {
                step: PrepareStep::BaseDirectory,
                source: PathError::NotADirectory { .. },
            }
        ));
        assert_eq!(err.exit_code(), EXIT_PREPARE_FAILED);
        assert_eq!(controller.state(), SessionState::Terminated);

        assert!(matches!(
            controller.export(&session::OutputSession::new(&output_root, &Local::now()).files()),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert!(controller.engine().unwrap().sizes().is_empty());
        assert_eq!(fs::read_to_string(&output_root).unwrap(), "occupied");
    }

    /// Scenario D: two artifacts already exist with content
    #[test]
    fn test_existing_artifacts_are_not_truncated() {
        let root = tempdir().unwrap();
        let output_root = root.path().join("dataset");
        let now = Local.with_ymd_and_hms(2024, 5, 1, 10, 20, 30).unwrap();
        let dir = output_root.join("20240501_102030");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(TRAJECTORY_FILE), "0.0 0 0 0 0 0 0 1\n").unwrap();
        fs::write(dir.join(IMAGES_FILE), "# previous run\n").unwrap();

        let config = SessionConfig {
            output_root,
            ..SessionConfig::new(resources(root.path()))
        };
        let mut controller = SessionController::new(config);
        controller
            .start(SizeRecordingEngine::load, Box::new(camera(3)))
            .unwrap();
        controller.stop().unwrap();

        let files = controller.prepare_output(&now).unwrap();
        assert_eq!(files.points, dir.join(POINTS_FILE));
        controller.export(&files).unwrap();

        assert_eq!(controller.engine().unwrap().sizes(), vec![18, 15, 0]);
    }

    /// Full run, ended by the camera's own stop request
    #[tokio::test]
    async fn test_run_with_mock_camera() {
        let root = tempdir().unwrap();
        let token = ShutdownToken::new();
        let source = camera(20).with_stop_request(token.clone());
        let config = SessionConfig {
            output_root: root.path().join("out/nested/dataset"),
            ..SessionConfig::new(resources(root.path()))
        };

        let report = SessionController::new(config)
            .run(SizeRecordingEngine::load, Box::new(source), token)
            .await
            .unwrap();

        assert_eq!(report.ingestion.received, 20);
        assert_eq!(report.ingestion.conversion_errors, 0);
        for path in report.files.iter() {
            assert!(path.is_file());
        }
        let first_line = fs::read_to_string(&report.files.trajectory).unwrap();
        assert!(first_line.lines().next().is_some());
    }

    #[tokio::test]
    async fn test_run_missing_vocabulary_is_engine_load_error() {
        let root = tempdir().unwrap();
        let mut resources = resources(root.path());
        resources.vocabulary = root.path().join("missing.txt");
        let config = SessionConfig {
            output_root: root.path().join("dataset"),
            ..SessionConfig::new(resources)
        };

        let err = SessionController::new(config)
            .run(SizeRecordingEngine::load, Box::new(camera(1)), ShutdownToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), session::EXIT_ENGINE_LOAD);
        assert!(!root.path().join("dataset").exists());
    }
}

#[cfg(test)]
mod streaming_tests {
    use std::sync::Arc;

    use contracts::TrackingEngine;
    use ingestion::{FrameGrabber, IngestionMetrics, Subscription, SubscriptionConfig};

    use crate::support::{frame, resources, wait_until, ManualSource, SizeRecordingEngine};

    /// Scenario C: a malformed frame mid-stream
    #[test]
    fn test_malformed_frame_does_not_interrupt_stream() {
        let root = tempfile::tempdir().unwrap();
        let engine = Arc::new(SizeRecordingEngine::load(&resources(root.path())).unwrap());
        let metrics = Arc::new(IngestionMetrics::new());
        let source = ManualSource::default();

        let subscription = Subscription::subscribe(
            SubscriptionConfig::default(),
            Box::new(source.clone()),
            FrameGrabber::new(&engine, metrics.clone()),
            metrics.clone(),
        )
        .unwrap();

        for (i, malformed) in [false, false, true, false, false].into_iter().enumerate() {
            source.publish(frame(1.0 + i as f64 * 0.1, malformed));
            wait_until(|| metrics.snapshot().delivered == i as u64 + 1);
        }

        let snapshot = subscription.unsubscribe();
        assert_eq!(snapshot.conversion_errors, 1);
        assert_eq!(snapshot.tracked, 4);
        // same engine instance kept tracking after the bad frame
        assert_eq!(engine.inner.tracked_frames(), 4);
        assert_eq!(Arc::strong_count(&engine), 1);
        assert_eq!(Arc::weak_count(&engine), 0);

        engine.shutdown();
    }
}
