//! ImageMessage - transport 输入
//!
//! Raw image message as delivered by the transport, and the borrowed view the
//! engine reads from.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Transport timestamp (seconds + nanoseconds)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub sec: i32,
    pub nanosec: u32,
}

impl Stamp {
    /// Build a stamp from floating-point seconds
    pub fn from_secs_f64(secs: f64) -> Self {
        let sec = secs.floor();
        let nanosec = ((secs - sec) * 1e9).round().min(999_999_999.0);
        Self {
            sec: sec as i32,
            nanosec: nanosec as u32,
        }
    }

    /// Stamp as seconds (the engine's clock)
    pub fn to_secs(self) -> f64 {
        self.sec as f64 + self.nanosec as f64 * 1e-9
    }
}

/// Message header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Acquisition time
    pub stamp: Stamp,

    /// Camera frame name
    pub frame_id: String,
}

/// 原始图像消息
///
/// Owned by the transport. The ingestion adapter only borrows it for the
/// duration of one forwarding call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMessage {
    pub header: Header,

    /// Rows
    pub height: u32,

    /// Columns
    pub width: u32,

    /// Pixel encoding name (`mono8`, `bgr8`, ...)
    pub encoding: String,

    pub is_bigendian: bool,

    /// Row length in bytes
    pub step: u32,

    /// Pixel data (zero-copy)
    pub data: Bytes,
}

impl ImageMessage {
    /// Frame timestamp in seconds
    pub fn timestamp(&self) -> f64 {
        self.header.stamp.to_secs()
    }
}

/// Pixel encodings understood by the ingestion adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageEncoding {
    Mono8,
    Mono16,
    Rgb8,
    Bgr8,
    Rgba8,
    Bgra8,
}

impl ImageEncoding {
    /// Channels per pixel
    pub fn channels(self) -> u32 {
        match self {
            Self::Mono8 | Self::Mono16 => 1,
            Self::Rgb8 | Self::Bgr8 => 3,
            Self::Rgba8 | Self::Bgra8 => 4,
        }
    }

    /// Bytes per channel
    pub fn bytes_per_channel(self) -> u32 {
        match self {
            Self::Mono16 => 2,
            _ => 1,
        }
    }

    /// Minimum row length for `width` pixels
    pub fn min_step(self, width: u32) -> u64 {
        width as u64 * self.channels() as u64 * self.bytes_per_channel() as u64
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mono8 => "mono8",
            Self::Mono16 => "mono16",
            Self::Rgb8 => "rgb8",
            Self::Bgr8 => "bgr8",
            Self::Rgba8 => "rgba8",
            Self::Bgra8 => "bgra8",
        }
    }
}

impl fmt::Display for ImageEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mono8" | "8UC1" => Ok(Self::Mono8),
            "mono16" | "16UC1" => Ok(Self::Mono16),
            "rgb8" => Ok(Self::Rgb8),
            "bgr8" | "8UC3" => Ok(Self::Bgr8),
            "rgba8" => Ok(Self::Rgba8),
            "bgra8" | "8UC4" => Ok(Self::Bgra8),
            other => Err(other.to_string()),
        }
    }
}

/// Read-only view over a validated image message
///
/// Borrows the transport buffer; valid only for one forwarding call.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    pub width: u32,
    pub height: u32,
    pub encoding: ImageEncoding,
    pub step: u32,
    pub data: &'a [u8],
}

impl<'a> ImageView<'a> {
    /// Bytes of row `y`, trimmed to the pixel payload
    pub fn row(&self, y: u32) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.step as usize;
        let len = self.encoding.min_step(self.width) as usize;
        self.data.get(start..start + len)
    }
}
