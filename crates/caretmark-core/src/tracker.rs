#![forbid(unsafe_code)]

//! Per-association lifecycle: lazy mirror, last result, coalesced triggers.
//!
//! # State machine
//!
//! ```text
//! Uninitialized ──first measurement──▶ Ready ──teardown──▶ (dropped)
//! ```
//!
//! The mirror is created on the first measurement that has a live target and
//! is reused until the association ends. Skipped or failed measurements
//! never touch the published coordinates; the last good result (initially
//! all zeros) stays in effect.

use tracing::{debug, warn};

use crate::coalesce::{FrameCoalescer, FrameScheduler};
use crate::geometry::CaretCoordinates;
use crate::host::{MirrorHost, TargetElement};
use crate::measure::measure_once;
use crate::options::CaretOptions;

/// Observable mirror state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorState {
    Uninitialized,
    Ready,
}

/// Why a measurement did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Target reference is unset.
    NoTarget,
    /// Target is no longer attached to a document.
    Detached,
    /// The host could not create a mirror.
    MirrorUnavailable,
    /// The host failed mid-measurement.
    HostError,
}

/// Result of one measurement attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasureOutcome {
    Skipped(SkipReason),
    /// Measured; same coordinates as already published.
    Unchanged(CaretCoordinates),
    /// Measured; new coordinates published.
    Changed(CaretCoordinates),
}

impl MeasureOutcome {
    /// Coordinates if a measurement ran.
    #[must_use]
    pub fn coordinates(&self) -> Option<CaretCoordinates> {
        match *self {
            Self::Skipped(_) => None,
            Self::Unchanged(c) | Self::Changed(c) => Some(c),
        }
    }

    #[must_use]
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

/// Caret tracker for one target association.
pub struct CaretTracker<H: MirrorHost> {
    host: H,
    options: CaretOptions,
    mirror: Option<H::Mirror>,
    last: CaretCoordinates,
    measurements: u64,
}

impl<H: MirrorHost> CaretTracker<H> {
    #[must_use]
    pub fn new(host: H, options: CaretOptions) -> Self {
        Self {
            host,
            options,
            mirror: None,
            last: CaretCoordinates::zero(),
            measurements: 0,
        }
    }

    /// Last published coordinates.
    #[must_use]
    pub fn coordinates(&self) -> CaretCoordinates {
        self.last
    }

    #[must_use]
    pub fn options(&self) -> &CaretOptions {
        &self.options
    }

    /// Replace the options; they apply from the next measurement on.
    pub fn set_options(&mut self, options: CaretOptions) {
        self.options = options;
    }

    #[must_use]
    pub fn state(&self) -> MirrorState {
        if self.mirror.is_some() {
            MirrorState::Ready
        } else {
            MirrorState::Uninitialized
        }
    }

    #[must_use]
    pub fn mirror(&self) -> Option<&H::Mirror> {
        self.mirror.as_ref()
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Successful measurements so far.
    #[must_use]
    pub fn measurements(&self) -> u64 {
        self.measurements
    }

    /// Measure `target` now.
    pub fn measure(&mut self, target: Option<&H::Target>) -> MeasureOutcome {
        let Some(target) = target else {
            debug!("no target; keeping last coordinates");
            return MeasureOutcome::Skipped(SkipReason::NoTarget);
        };
        if !target.is_connected() {
            debug!("target detached; keeping last coordinates");
            return MeasureOutcome::Skipped(SkipReason::Detached);
        }

        if self.mirror.is_none() {
            match self.host.create_mirror() {
                Ok(mirror) => {
                    debug!("mirror created");
                    self.mirror = Some(mirror);
                }
                Err(err) => {
                    warn!(%err, "mirror creation failed");
                    return MeasureOutcome::Skipped(SkipReason::MirrorUnavailable);
                }
            }
        }
        let Some(mirror) = self.mirror.as_mut() else {
            return MeasureOutcome::Skipped(SkipReason::MirrorUnavailable);
        };

        match measure_once(mirror, target, &self.options, self.host.engine()) {
            Ok(coords) => {
                self.measurements += 1;
                if coords == self.last {
                    MeasureOutcome::Unchanged(coords)
                } else {
                    debug!(
                        top = coords.top,
                        left = coords.left,
                        height = coords.height,
                        "caret moved"
                    );
                    self.last = coords;
                    MeasureOutcome::Changed(coords)
                }
            }
            Err(err) => {
                warn!(%err, "caret measurement failed");
                MeasureOutcome::Skipped(SkipReason::HostError)
            }
        }
    }

    /// End the association: drop the mirror. The last coordinates remain
    /// readable.
    pub fn teardown(&mut self) {
        if self.mirror.take().is_some() {
            debug!("mirror released");
        }
    }
}

/// [`CaretTracker`] driven by a frame scheduler: change notifications are
/// coalesced to at most one measurement per frame.
pub struct CoalescedTracker<H: MirrorHost, S: FrameScheduler> {
    tracker: CaretTracker<H>,
    scheduler: S,
    coalescer: FrameCoalescer<S::Handle>,
}

impl<H: MirrorHost, S: FrameScheduler> CoalescedTracker<H, S> {
    #[must_use]
    pub fn new(tracker: CaretTracker<H>, scheduler: S) -> Self {
        Self {
            tracker,
            scheduler,
            coalescer: FrameCoalescer::new(),
        }
    }

    #[must_use]
    pub fn tracker(&self) -> &CaretTracker<H> {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut CaretTracker<H> {
        &mut self.tracker
    }

    #[must_use]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    #[must_use]
    pub fn coalescer(&self) -> &FrameCoalescer<S::Handle> {
        &self.coalescer
    }

    /// A change signal arrived; request a measurement at the next frame,
    /// superseding any request not yet run.
    ///
    /// Returns `false` if the scheduler refused the request.
    pub fn notify_change(&mut self) -> bool {
        match self.coalescer.schedule(&mut self.scheduler) {
            Ok(_) => true,
            Err(err) => {
                warn!(%err, "could not schedule caret measurement");
                false
            }
        }
    }

    /// Frame callback for `handle`. Measures only if `handle` is the newest
    /// request.
    pub fn on_frame(
        &mut self,
        handle: S::Handle,
        target: Option<&H::Target>,
    ) -> Option<MeasureOutcome> {
        self.coalescer
            .fire(handle)
            .then(|| self.tracker.measure(target))
    }

    /// Frame callback for schedulers that do not pass a handle: runs the
    /// pending measurement, if any.
    pub fn run_pending(&mut self, target: Option<&H::Target>) -> Option<MeasureOutcome> {
        self.coalescer
            .take_pending()
            .map(|_| self.tracker.measure(target))
    }

    /// Cancel the pending request and release the mirror.
    pub fn teardown(&mut self) {
        self.coalescer.cancel(&mut self.scheduler);
        self.tracker.teardown();
    }
}
