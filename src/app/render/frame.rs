/// Coalesces repaint requests. Any number of `request` calls between two
/// `take` calls produce a single frame.
#[derive(Debug, Default)]
pub(in crate::app) struct FrameScheduler {
    pending: bool,
}

impl FrameScheduler {
    /// Returns true only when this call scheduled a new frame.
    pub(in crate::app) fn request(&mut self) -> bool {
        !std::mem::replace(&mut self.pending, true)
    }

    /// Consumes the pending frame, if any.
    pub(in crate::app) fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub(in crate::app) fn is_pending(&self) -> bool {
        self.pending
    }
}
