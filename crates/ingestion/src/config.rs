//! Subscription configuration and metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Default camera topic
pub const DEFAULT_IMAGE_TOPIC: &str = "/camera/image_raw";

/// Subscription configuration
#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    /// Topic to subscribe to
    pub topic: String,

    /// Pending frames kept while the adapter is busy; the oldest is evicted when full
    pub queue_depth: usize,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_IMAGE_TOPIC.to_string(),
            queue_depth: 1,
        }
    }
}

impl SubscriptionConfig {
    /// Create new subscription configuration
    pub fn new(topic: impl Into<String>, queue_depth: usize) -> Self {
        Self {
            topic: topic.into(),
            queue_depth,
        }
    }
}

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Frames published by the transport
    pub received: AtomicU64,

    /// Pending frames evicted by a newer one
    pub replaced: AtomicU64,

    /// Frames handed to the adapter
    pub delivered: AtomicU64,

    /// Frames dropped because they could not be converted
    pub conversion_errors: AtomicU64,

    /// Frames the engine returned a pose for
    pub tracked: AtomicU64,

    /// Frames the engine could not track
    pub lost: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
        observability::record_frame_received();
    }

    pub fn record_replaced(&self) {
        self.replaced.fetch_add(1, Ordering::Relaxed);
        observability::record_frame_replaced();
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_conversion_error(&self) {
        self.conversion_errors.fetch_add(1, Ordering::Relaxed);
        observability::record_conversion_error();
    }

    pub fn record_tracked(&self, tracked: bool) {
        if tracked {
            self.tracked.fetch_add(1, Ordering::Relaxed);
        } else {
            self.lost.fetch_add(1, Ordering::Relaxed);
        }
        observability::record_frame_tracked(tracked);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> IngestionSnapshot {
        IngestionSnapshot {
            received: self.received.load(Ordering::Relaxed),
            replaced: self.replaced.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            conversion_errors: self.conversion_errors.load(Ordering::Relaxed),
            tracked: self.tracked.load(Ordering::Relaxed),
            lost: self.lost.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionSnapshot {
    pub received: u64,
    pub replaced: u64,
    pub delivered: u64,
    pub conversion_errors: u64,
    pub tracked: u64,
    pub lost: u64,
}
