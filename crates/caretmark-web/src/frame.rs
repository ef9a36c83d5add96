#![forbid(unsafe_code)]

//! `requestAnimationFrame` as a [`FrameScheduler`].

use caretmark_core::{FrameScheduler, ScheduleError};
use js_sys::Function;
use tracing::trace;
use web_sys::Window;

/// Schedules one fixed callback on the browser's next animation frame.
///
/// The callback does not learn its request id, so owners drain the
/// coalescer with `run_pending` rather than `on_frame`.
#[derive(Debug, Clone)]
pub struct AnimationFrames {
    window: Window,
    callback: Function,
}

impl AnimationFrames {
    #[must_use]
    pub fn new(window: Window, callback: Function) -> Self {
        Self { window, callback }
    }
}

impl FrameScheduler for AnimationFrames {
    type Handle = i32;

    fn request(&mut self) -> Result<i32, ScheduleError> {
        self.window
            .request_animation_frame(&self.callback)
            .map_err(|err| ScheduleError(format!("{err:?}")))
    }

    fn cancel(&mut self, handle: i32) {
        if let Err(err) = self.window.cancel_animation_frame(handle) {
            trace!(handle, ?err, "cancelAnimationFrame failed");
        }
    }
}
