//! 帧处理 trait

use contracts::ImageMessage;

/// Frame handler trait
///
/// Receives frames from a `Subscription`. Calls are serialised by the
/// subscription's delivery thread, in arrival order, and never overlap.
pub trait FrameHandler: Send {
    /// Handle one frame. The message is only borrowed for this call.
    fn on_frame(&mut self, msg: &ImageMessage);
}

impl<F> FrameHandler for F
where
    F: FnMut(&ImageMessage) + Send,
{
    fn on_frame(&mut self, msg: &ImageMessage) {
        self(msg)
    }
}
