//! # Ingestion
//!
//! Camera frame ingestion.
//!
//! Responsibilities:
//! - Subscribe to an image topic through the `FrameSource` interface
//! - Newest-wins delivery queue (depth 1 by default)
//! - Serialised delivery of each frame to the `FrameGrabber`
//! - Convert messages to `ImageView` and forward them to the tracking engine
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{FrameGrabber, IngestionMetrics, Subscription, SubscriptionConfig};
//!
//! let metrics = Arc::new(IngestionMetrics::new());
//! let grabber = FrameGrabber::new(&engine, metrics.clone());
//! let sub = Subscription::subscribe(SubscriptionConfig::default(), source, grabber, metrics)?;
//! // ... wait for shutdown ...
//! let snapshot = sub.unsubscribe();
//! ```

mod adapter;
mod config;
mod converter;
mod error;
mod grabber;
mod mock;
mod subscription;

// Re-exports
pub use adapter::FrameHandler;
pub use config::{IngestionMetrics, IngestionSnapshot, SubscriptionConfig, DEFAULT_IMAGE_TOPIC};
pub use contracts::ImageMessage;
pub use converter::to_image_view;
pub use error::{IngestionError, Result};
pub use grabber::FrameGrabber;
pub use mock::{MockFrameConfig, MockFrameSource};
pub use subscription::Subscription;
