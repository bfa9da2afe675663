//! Animation-frame scheduling seam used to coalesce pointer-driven surface updates.

use std::{cell::RefCell, rc::Rc};

/// Callback run on the next animation frame.
pub type FrameCallback = Box<dyn FnOnce()>;

/// Host service that runs a callback before the next repaint.
pub trait FrameScheduler {
    /// Queues `callback` for the next animation frame.
    fn request_frame(&self, callback: FrameCallback);
}

#[derive(Clone, Default)]
/// Test scheduler that holds callbacks until [`ManualFrameScheduler::run_frame`] is called.
pub struct ManualFrameScheduler {
    pending: Rc<RefCell<Vec<FrameCallback>>>,
}

impl ManualFrameScheduler {
    /// Returns the number of callbacks waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Runs every callback queued before this call. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        let queued = std::mem::take(&mut *self.pending.borrow_mut());
        let count = queued.len();
        for callback in queued {
            callback();
        }
        count
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&self, callback: FrameCallback) {
        self.pending.borrow_mut().push(callback);
    }
}
