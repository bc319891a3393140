//! FrameSource trait - transport abstraction
//!
//! Decouples the subscription from the concrete transport. Real transports and
//! the mock generator implement the same callback-based interface.

use std::sync::Arc;

use crate::ImageMessage;

/// Frame callback type
///
/// Invoked by the transport for every message published on the topic.
pub type FrameCallback = Arc<dyn Fn(ImageMessage) + Send + Sync>;

/// Image topic producer
///
/// # Example
///
/// ```ignore
/// let source: Box<dyn FrameSource> = transport.image_source("/camera/image_raw");
/// source.listen(Arc::new(|msg| {
///     println!("frame at {}", msg.timestamp());
/// }));
/// // ...
/// source.stop();
/// ```
pub trait FrameSource: Send + Sync {
    /// Topic name this source publishes on
    fn topic(&self) -> &str;

    /// Register the data callback
    ///
    /// Repeated calls while listening are ignored.
    fn listen(&self, callback: FrameCallback);

    /// Stop producing frames. The callback is not invoked after this returns.
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
