//! Topic subscription with a serialised delivery thread

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use async_channel::{bounded, Receiver, Sender};
use contracts::{FrameCallback, FrameSource, ImageMessage};
use tracing::{debug, info, instrument, trace, warn};

use crate::adapter::FrameHandler;
use crate::config::{IngestionMetrics, IngestionSnapshot, SubscriptionConfig};
use crate::error::{IngestionError, Result};

/// Active subscription to one image topic
///
/// The transport callback force-sends into a bounded channel, evicting the
/// oldest pending frame when full; a single delivery thread receives and calls
/// the handler, so the handler is never re-entered. Dropping the subscription
/// unsubscribes.
pub struct Subscription {
    topic: String,
    source: Box<dyn FrameSource>,
    tx: Sender<ImageMessage>,
    rx: Receiver<ImageMessage>,
    metrics: Arc<IngestionMetrics>,
    worker: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Subscribe `handler` to the frames produced by `source`
    ///
    /// # Errors
    /// Returns an error if the delivery thread cannot be spawned.
    #[instrument(
        name = "subscription_subscribe",
        skip(config, source, handler, metrics),
        fields(topic = %config.topic, queue_depth = config.queue_depth)
    )]
    pub fn subscribe<H>(
        config: SubscriptionConfig,
        source: Box<dyn FrameSource>,
        mut handler: H,
        metrics: Arc<IngestionMetrics>,
    ) -> Result<Self>
    where
        H: FrameHandler + 'static,
    {
        if source.topic() != config.topic {
            warn!(
                source_topic = %source.topic(),
                "frame source publishes on a different topic"
            );
        }

        let (tx, rx) = bounded::<ImageMessage>(config.queue_depth.max(1));

        let worker = {
            let rx = rx.clone();
            let metrics = metrics.clone();
            thread::Builder::new()
                .name("frame-delivery".to_string())
                .spawn(move || {
                    while let Ok(msg) = rx.recv_blocking() {
                        // frames still pending at unsubscribe are not delivered
                        if rx.is_closed() {
                            break;
                        }
                        metrics.record_delivered();
                        handler.on_frame(&msg);
                    }
                    debug!("delivery thread finished");
                })
                .map_err(|e| IngestionError::DeliveryThread {
                    topic: config.topic.clone(),
                    source: e,
                })?
        };

        let callback: FrameCallback = {
            let tx = tx.clone();
            let metrics = metrics.clone();
            Arc::new(move |msg: ImageMessage| {
                metrics.record_received();
                match tx.force_send(msg) {
                    Ok(None) => trace!("frame queued"),
                    Ok(Some(_)) => {
                        metrics.record_replaced();
                        trace!("pending frame replaced by newer frame");
                    }
                    Err(_) => trace!("frame after unsubscribe discarded"),
                }
            })
        };
        source.listen(callback);

        info!("subscribed");

        Ok(Self {
            topic: config.topic,
            source,
            tx,
            rx,
            metrics,
            worker: Some(worker),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }

    /// Stop the source, discard pending frames and wait for the handler to return
    ///
    /// After this returns the handler has been dropped.
    #[instrument(name = "subscription_unsubscribe", skip(self), fields(topic = %self.topic))]
    pub fn unsubscribe(mut self) -> IngestionSnapshot {
        self.teardown();
        let snapshot = self.metrics.snapshot();
        info!(
            received = snapshot.received,
            delivered = snapshot.delivered,
            replaced = snapshot.replaced,
            conversion_errors = snapshot.conversion_errors,
            "unsubscribed"
        );
        snapshot
    }

    fn teardown(&mut self) {
        self.source.stop();
        self.tx.close();

        let mut discarded = 0usize;
        while self.rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!(discarded, "pending frames discarded");
        }

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(topic = %self.topic, "delivery thread panicked");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.teardown();
    }
}
