//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 不支持的像素编码
    #[error("unsupported image encoding '{encoding}'")]
    UnsupportedEncoding {
        /// 编码名称
        encoding: String,
    },

    /// 图像尺寸为零
    #[error("image has zero dimension: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    /// 行步长小于像素数据长度
    #[error("row step {step} is shorter than {required} bytes required for width {width}")]
    StepTooShort { step: u32, width: u32, required: u64 },

    /// 数据缓冲区不足
    #[error("image buffer holds {actual} bytes, {expected} expected")]
    BufferTooShort { expected: u64, actual: usize },

    /// 大端多字节编码不支持
    #[error("big-endian '{encoding}' data is not supported")]
    BigEndian {
        /// 编码名称
        encoding: String,
    },

    /// 投递线程启动失败
    #[error("failed to start delivery thread for topic {topic}: {source}")]
    DeliveryThread {
        /// topic 名称
        topic: String,
        #[source]
        source: std::io::Error,
    },
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
