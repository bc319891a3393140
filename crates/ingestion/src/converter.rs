//! Image message 转换
//!
//! Validates a transport `ImageMessage` and exposes it as a borrowed
//! `ImageView` without copying the pixel buffer.

use contracts::{ImageEncoding, ImageMessage, ImageView};

use crate::error::{IngestionError, Result};

/// 将 ImageMessage 转换为 ImageView
///
/// Checks, in order: encoding is known, dimensions are non-zero, multi-byte
/// data is little-endian, the row step covers one row of pixels, and the
/// buffer covers `step * height` bytes.
pub fn to_image_view(msg: &ImageMessage) -> Result<ImageView<'_>> {
    let encoding: ImageEncoding = msg
        .encoding
        .parse()
        .map_err(|encoding| IngestionError::UnsupportedEncoding { encoding })?;

    if msg.width == 0 || msg.height == 0 {
        return Err(IngestionError::EmptyImage {
            width: msg.width,
            height: msg.height,
        });
    }

    if msg.is_bigendian && encoding.bytes_per_channel() > 1 {
        return Err(IngestionError::BigEndian {
            encoding: msg.encoding.clone(),
        });
    }

    let required = encoding.min_step(msg.width);
    if (msg.step as u64) < required {
        return Err(IngestionError::StepTooShort {
            step: msg.step,
            width: msg.width,
            required,
        });
    }

    let expected = msg.step as u64 * msg.height as u64;
    if (msg.data.len() as u64) < expected {
        return Err(IngestionError::BufferTooShort {
            expected,
            actual: msg.data.len(),
        });
    }

    Ok(ImageView {
        width: msg.width,
        height: msg.height,
        encoding,
        step: msg.step,
        data: &msg.data[..expected as usize],
    })
}
