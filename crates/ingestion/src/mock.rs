//! Mock 图像源
//!
//! 用于无相机环境的测试与演示。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::Bytes;
use contracts::{
    FrameCallback, FrameSource, Header, ImageEncoding, ImageMessage, ShutdownToken, Stamp,
};
use tracing::{debug, info, trace};

use crate::config::DEFAULT_IMAGE_TOPIC;

/// Mock 图像源配置
#[derive(Debug, Clone)]
pub struct MockFrameConfig {
    /// Topic 名称
    pub topic: String,

    /// 发送频率 (Hz)
    pub frequency_hz: f64,

    /// 图像宽度
    pub width: u32,

    /// 图像高度
    pub height: u32,

    /// 像素编码
    pub encoding: ImageEncoding,

    /// 发送帧数上限，达到后请求关闭会话 (None = 无限)
    pub max_frames: Option<u64>,

    /// 每 N 帧发送一个损坏帧 (None = 从不)
    pub malformed_every: Option<u64>,
}

impl Default for MockFrameConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_IMAGE_TOPIC.to_string(),
            frequency_hz: 30.0,
            width: 640,
            height: 480,
            encoding: ImageEncoding::Mono8,
            max_frames: None,
            malformed_every: None,
        }
    }
}

/// Mock 图像源
///
/// Publishes synthetic frames from a background thread at the configured
/// rate. When `max_frames` is reached it stops and, if a stop request token
/// was attached, cancels it the way a transport-level stop would.
pub struct MockFrameSource {
    config: MockFrameConfig,
    stop_request: Option<ShutdownToken>,
    listening: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MockFrameSource {
    /// 创建新的 Mock 图像源
    pub fn new(config: MockFrameConfig) -> Self {
        Self {
            config,
            stop_request: None,
            listening: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    /// Cancel `token` once `max_frames` have been published
    pub fn with_stop_request(mut self, token: ShutdownToken) -> Self {
        self.stop_request = Some(token);
        self
    }

    pub fn config(&self) -> &MockFrameConfig {
        &self.config
    }

    /// Generate frame `seq`
    ///
    /// Malformed frames carry a buffer one row short, so conversion fails.
    pub fn generate_frame(config: &MockFrameConfig, seq: u64, timestamp: f64) -> ImageMessage {
        let bytes_per_pixel = config.encoding.channels() * config.encoding.bytes_per_channel();
        let step = config.width * bytes_per_pixel;
        let mut data = Vec::with_capacity(step as usize * config.height as usize);
        for y in 0..config.height {
            for x in 0..step {
                data.push(((x as u64 / bytes_per_pixel as u64 + y as u64 + seq) % 256) as u8);
            }
        }

        let malformed = config
            .malformed_every
            .is_some_and(|every| every > 0 && seq % every == 0);
        if malformed {
            data.truncate(data.len().saturating_sub(step as usize));
        }

        ImageMessage {
            header: Header {
                stamp: Stamp::from_secs_f64(timestamp),
                frame_id: "mock_camera".to_string(),
            },
            height: config.height,
            width: config.width,
            encoding: config.encoding.as_str().to_string(),
            is_bigendian: false,
            step,
            data: Bytes::from(data),
        }
    }
}

impl FrameSource for MockFrameSource {
    fn topic(&self) -> &str {
        &self.config.topic
    }

    fn listen(&self, callback: FrameCallback) {
        // Idempotent: if already listening, don't start again
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let config = self.config.clone();
        let listening = self.listening.clone();
        let stop_request = self.stop_request.clone();
        let interval = Duration::from_secs_f64(1.0 / config.frequency_hz.max(f64::EPSILON));

        let handle = thread::spawn(move || {
            let start_time = Instant::now();
            let mut seq: u64 = 0;

            debug!(
                topic = %config.topic,
                frequency_hz = config.frequency_hz,
                width = config.width,
                height = config.height,
                "mock frame source started"
            );

            while listening.load(Ordering::Relaxed) {
                seq += 1;
                let timestamp = start_time.elapsed().as_secs_f64();
                callback(Self::generate_frame(&config, seq, timestamp));
                trace!(seq, timestamp, "mock frame published");

                if config.max_frames.is_some_and(|max| seq >= max) {
                    info!(frames = seq, "mock frame source reached max frames");
                    listening.store(false, Ordering::SeqCst);
                    if let Some(token) = &stop_request {
                        token.cancel();
                    }
                    break;
                }

                thread::sleep(interval);
            }

            debug!(topic = %config.topic, frames = seq, "mock frame source stopped");
        });

        *self.worker.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
        let handle = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

impl Drop for MockFrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}
