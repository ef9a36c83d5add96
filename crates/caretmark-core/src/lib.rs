#![forbid(unsafe_code)]

//! Core: caret coordinate measurement for text-entry controls.
//!
//! # Role in caretmark
//! Browsers expose no API that reports the pixel position of an arbitrary
//! character inside an `<input>` or `<textarea>`. `caretmark-core` rebuilds
//! that answer with the mirror technique: the target's layout-affecting style
//! is copied onto an off-screen clone, the text before the caret is written
//! into the clone, a marker holding the rest of the text is appended, and the
//! marker's offset is read back.
//!
//! # Pipeline
//! Every measurement runs three stages in order:
//! - **Style replication** ([`style`]): computed style → [`MirrorStyle`].
//! - **Content mirroring** ([`mirror`]): value + caret → [`MirrorContent`].
//! - **Coordinate resolution** ([`resolve`]): marker offset → [`CaretCoordinates`].
//!
//! The stages talk to the rendering engine only through the traits in
//! [`host`]. `caretmark-web` implements them over the DOM; [`oracle`] ships a
//! deterministic fixed-advance implementation for native hosts and tests.
//!
//! # Lifecycle
//! [`CaretTracker`] owns one mirror per target association, keeps the last
//! published coordinates, and coalesces change notifications through
//! [`FrameCoalescer`] so at most one measurement runs per frame.
//!
//! ```
//! use caretmark_core::oracle::{GridHost, StaticTarget};
//! use caretmark_core::{CaretOptions, CaretTracker, ControlKind};
//!
//! let target = StaticTarget::new(ControlKind::SingleLine, "hello").with_caret(5);
//! let mut tracker = CaretTracker::new(GridHost::default(), CaretOptions::default().with_relative(true));
//! tracker.measure(Some(&target));
//! assert!(tracker.coordinates().left > 0.0);
//! ```

pub mod coalesce;
pub mod control;
pub mod geometry;
pub mod host;
pub mod measure;
pub mod mirror;
pub mod options;
pub mod oracle;
pub mod resolve;
pub mod style;
pub mod tracker;

pub use coalesce::{FrameCoalescer, FrameHandle, FrameScheduler, ManualFrames, ScheduleError};
pub use control::{ControlKind, ControlProfile, LineHeightSource};
pub use geometry::{CaretCoordinates, MarkerOffset, ScrollOffset, ViewportRect};
pub use host::{MirrorError, MirrorHost, MirrorSurface, TargetElement};
pub use measure::measure_once;
pub use mirror::{MARKER_PLACEHOLDER, MirrorContent};
pub use options::{CaretOptions, CoordinateSpace, TrackedEvent};
pub use resolve::TargetMetrics;
pub use style::{ComputedStyle, LayoutEngine, MirrorStyle, StyleProperty};
pub use tracker::{CaretTracker, CoalescedTracker, MeasureOutcome, MirrorState, SkipReason};

/// DOM id given to the mirror element.
pub const MIRROR_ELEMENT_ID: &str = "textarea-caret-position-mirror";
