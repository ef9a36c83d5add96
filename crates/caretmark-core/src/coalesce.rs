#![forbid(unsafe_code)]

//! Frame coalescing for measurement requests.
//!
//! Input events can arrive many times per frame. Measuring on each one would
//! repeat the same layout work and, worse, could run before the engine has
//! applied the edit. [`FrameCoalescer`] keeps at most one request pending per
//! scheduling quantum:
//!
//! - A new request cancels the pending one and takes its place (newest wins).
//! - When a frame fires, only the pending handle is honoured; stale handles
//!   from schedulers that cannot cancel are ignored.
//!
//! The quantum is whatever the [`FrameScheduler`] provides. The web host uses
//! `requestAnimationFrame`; [`ManualFrames`] is a host-driven scheduler for
//! native embedders and tests.
//!
//! ```
//! use caretmark_core::coalesce::{FrameCoalescer, ManualFrames};
//!
//! let mut frames = ManualFrames::new();
//! let mut coalescer = FrameCoalescer::new();
//! for _ in 0..5 {
//!     coalescer.schedule(&mut frames).unwrap();
//! }
//! let fired = frames.advance();
//! assert_eq!(fired.len(), 1);
//! assert!(coalescer.fire(fired[0]));
//! ```

use std::fmt;

use tracing::trace;

/// Scheduler failed to queue a frame callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleError(pub String);

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame request failed: {}", self.0)
    }
}

impl std::error::Error for ScheduleError {}

/// Source of "run once at the next frame" callbacks.
pub trait FrameScheduler {
    type Handle: Copy + PartialEq + fmt::Debug;

    /// Queue a callback for the next frame.
    fn request(&mut self) -> Result<Self::Handle, ScheduleError>;

    /// Cancel a queued callback. Cancelling a handle that already ran is a
    /// no-op.
    fn cancel(&mut self, handle: Self::Handle);
}

/// Newest-wins holder of at most one pending frame request.
#[derive(Debug, Clone)]
pub struct FrameCoalescer<H> {
    pending: Option<H>,
    requested: u64,
    superseded: u64,
}

impl<H> Default for FrameCoalescer<H> {
    fn default() -> Self {
        Self {
            pending: None,
            requested: 0,
            superseded: 0,
        }
    }
}

impl<H: Copy + PartialEq + fmt::Debug> FrameCoalescer<H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a frame, cancelling any request still pending.
    pub fn schedule<S>(&mut self, scheduler: &mut S) -> Result<H, ScheduleError>
    where
        S: FrameScheduler<Handle = H>,
    {
        if let Some(previous) = self.pending.take() {
            scheduler.cancel(previous);
            self.superseded += 1;
            trace!(?previous, "superseded pending frame request");
        }
        let handle = scheduler.request()?;
        self.pending = Some(handle);
        self.requested += 1;
        Ok(handle)
    }

    /// A frame fired for `handle`. Returns `true` (and clears the pending
    /// slot) only if `handle` is the newest request.
    pub fn fire(&mut self, handle: H) -> bool {
        if self.pending == Some(handle) {
            self.pending = None;
            true
        } else {
            trace!(?handle, "ignoring stale frame");
            false
        }
    }

    /// Clear and return the pending request, for schedulers whose callbacks
    /// do not know their own handle.
    pub fn take_pending(&mut self) -> Option<H> {
        self.pending.take()
    }

    /// Cancel the pending request, if any.
    pub fn cancel<S>(&mut self, scheduler: &mut S)
    where
        S: FrameScheduler<Handle = H>,
    {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Total requests made.
    #[must_use]
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Requests cancelled because a newer one arrived first.
    #[must_use]
    pub fn superseded(&self) -> u64 {
        self.superseded
    }
}

/// Handle issued by [`ManualFrames`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// Host-driven frame scheduler: callbacks run when the host calls
/// [`advance`](Self::advance).
#[derive(Debug, Clone, Default)]
pub struct ManualFrames {
    next_id: u64,
    queued: Vec<FrameHandle>,
    frames: u64,
}

impl ManualFrames {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// End the current frame; returns the handles whose callbacks run now,
    /// in request order.
    pub fn advance(&mut self) -> Vec<FrameHandle> {
        self.frames += 1;
        std::mem::take(&mut self.queued)
    }

    #[must_use]
    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    /// Number of frames advanced so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FrameScheduler for ManualFrames {
    type Handle = FrameHandle;

    fn request(&mut self) -> Result<FrameHandle, ScheduleError> {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.queued.push(handle);
        Ok(handle)
    }

    fn cancel(&mut self, handle: FrameHandle) {
        self.queued.retain(|&queued| queued != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scheduler that cannot cancel, to exercise stale-handle filtering.
    #[derive(Default)]
    struct Uncancellable {
        inner: ManualFrames,
    }

    impl FrameScheduler for Uncancellable {
        type Handle = FrameHandle;

        fn request(&mut self) -> Result<FrameHandle, ScheduleError> {
            self.inner.request()
        }

        fn cancel(&mut self, _handle: FrameHandle) {}
    }

    struct Failing;

    impl FrameScheduler for Failing {
        type Handle = u32;

        fn request(&mut self) -> Result<u32, ScheduleError> {
            Err(ScheduleError("no window".into()))
        }

        fn cancel(&mut self, _handle: u32) {}
    }

    #[test]
    fn burst_coalesces_to_one_frame() {
        let mut frames = ManualFrames::new();
        let mut coalescer = FrameCoalescer::new();
        let mut last = None;
        for _ in 0..10 {
            last = Some(coalescer.schedule(&mut frames).unwrap());
        }
        assert_eq!(frames.queued(), 1);
        assert_eq!(coalescer.requested(), 10);
        assert_eq!(coalescer.superseded(), 9);

        let fired = frames.advance();
        assert_eq!(fired, vec![last.unwrap()]);
        assert!(coalescer.fire(fired[0]));
        assert!(!coalescer.is_pending());
    }

    #[test]
    fn stale_handles_are_ignored() {
        let mut frames = Uncancellable::default();
        let mut coalescer = FrameCoalescer::new();
        let first = coalescer.schedule(&mut frames).unwrap();
        let second = coalescer.schedule(&mut frames).unwrap();

        let fired = frames.inner.advance();
        assert_eq!(fired, vec![first, second]);
        assert!(!coalescer.fire(first));
        assert!(coalescer.fire(second));
    }

    #[test]
    fn requests_in_separate_frames_each_fire() {
        let mut frames = ManualFrames::new();
        let mut coalescer = FrameCoalescer::new();
        coalescer.schedule(&mut frames).unwrap();
        let a = frames.advance();
        assert!(coalescer.fire(a[0]));
        coalescer.schedule(&mut frames).unwrap();
        let b = frames.advance();
        assert!(coalescer.fire(b[0]));
        assert_eq!(coalescer.superseded(), 0);
        assert_eq!(frames.frames(), 2);
    }

    #[test]
    fn cancel_drops_pending() {
        let mut frames = ManualFrames::new();
        let mut coalescer = FrameCoalescer::new();
        coalescer.schedule(&mut frames).unwrap();
        coalescer.cancel(&mut frames);
        assert!(!coalescer.is_pending());
        assert!(frames.advance().is_empty());
    }

    #[test]
    fn take_pending_clears_slot() {
        let mut frames = ManualFrames::new();
        let mut coalescer = FrameCoalescer::new();
        let handle = coalescer.schedule(&mut frames).unwrap();
        assert_eq!(coalescer.take_pending(), Some(handle));
        assert_eq!(coalescer.take_pending(), None);
    }

    #[test]
    fn failed_request_leaves_nothing_pending() {
        let mut coalescer: FrameCoalescer<u32> = FrameCoalescer::new();
        let err = coalescer.schedule(&mut Failing).unwrap_err();
        assert_eq!(err.to_string(), "frame request failed: no window");
        assert!(!coalescer.is_pending());
    }
}
