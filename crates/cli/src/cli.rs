//! CLI argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Mono Bridge - feed a camera image topic into a monocular tracking engine
#[derive(Parser, Debug)]
#[command(
    name = "mono-bridge",
    author,
    version,
    about = "Monocular camera to tracking engine bridge",
    long_about = "Subscribes to a camera image topic, forwards every frame to the tracking \n\
                  engine and, on shutdown, exports the keyframe trajectory, image index \n\
                  and point cloud into a timestamped directory under the output root."
)]
pub struct Cli {
    /// Path to the engine vocabulary file
    pub vocabulary: PathBuf,

    /// Path to the camera / engine settings file
    pub settings: PathBuf,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, env = "MONO_BRIDGE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        env = "MONO_BRIDGE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Image topic to subscribe to
    #[arg(long, default_value = ingestion::DEFAULT_IMAGE_TOPIC, env = "MONO_BRIDGE_TOPIC")]
    pub topic: String,

    /// Base directory for output sessions
    #[arg(long, default_value = session::DEFAULT_OUTPUT_ROOT, env = "MONO_BRIDGE_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "MONO_BRIDGE_METRICS_PORT")]
    pub metrics_port: u16,

    /// Stop streaming after this many seconds (0 = wait for a signal)
    #[arg(long, default_value = "0", env = "MONO_BRIDGE_TIMEOUT")]
    pub timeout: u64,

    /// Every N-th tracked frame becomes a keyframe
    #[arg(long, default_value = "5", env = "MONO_BRIDGE_KEYFRAME_INTERVAL")]
    pub keyframe_interval: u64,

    /// Mock camera frame rate (Hz)
    #[arg(long, default_value = "30", env = "MONO_BRIDGE_FPS")]
    pub fps: f64,

    /// Mock camera image width
    #[arg(long, default_value = "640", env = "MONO_BRIDGE_WIDTH")]
    pub width: u32,

    /// Mock camera image height
    #[arg(long, default_value = "480", env = "MONO_BRIDGE_HEIGHT")]
    pub height: u32,

    /// Frames published before the camera requests shutdown (0 = unlimited)
    #[arg(long, default_value = "0", env = "MONO_BRIDGE_MAX_FRAMES")]
    pub max_frames: u64,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
