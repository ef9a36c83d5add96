#![forbid(unsafe_code)]

//! Measurement options.
//!
//! With the `serde` feature, [`CaretOptions`] reads from camelCase JSON with
//! every field optional:
//!
//! ```json
//! { "debug": false, "relative": true, "trackEvents": ["input", "keyup"] }
//! ```

/// Coordinate space of a [`CaretCoordinates`](crate::CaretCoordinates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateSpace {
    /// Offset by the target's bounding rectangle (overlay positioning).
    #[default]
    Viewport,
    /// Relative to the target's border box, independent of page scroll.
    ContentBox,
}

/// Change signal on the target that schedules a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(rename_all = "lowercase")
)]
pub enum TrackedEvent {
    Input,
    KeyUp,
    KeyDown,
    Click,
    Scroll,
    Focus,
    SelectionChange,
}

impl TrackedEvent {
    /// DOM event type name.
    #[must_use]
    pub const fn dom_name(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::KeyUp => "keyup",
            Self::KeyDown => "keydown",
            Self::Click => "click",
            Self::Scroll => "scroll",
            Self::Focus => "focus",
            Self::SelectionChange => "selectionchange",
        }
    }
}

/// Options for one target association.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(default, rename_all = "camelCase")
)]
pub struct CaretOptions {
    /// Render the mirror visibly and highlight the marker. Never changes
    /// the computed coordinates.
    pub debug: bool,
    /// Report content-box-relative instead of viewport coordinates.
    pub relative: bool,
    /// Signals that schedule a measurement.
    pub track_events: Vec<TrackedEvent>,
}

impl Default for CaretOptions {
    fn default() -> Self {
        Self {
            debug: false,
            relative: false,
            track_events: vec![TrackedEvent::Input],
        }
    }
}

impl CaretOptions {
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_relative(mut self, relative: bool) -> Self {
        self.relative = relative;
        self
    }

    #[must_use]
    pub fn with_track_events(mut self, events: impl IntoIterator<Item = TrackedEvent>) -> Self {
        self.track_events = events.into_iter().collect();
        self.track_events.dedup();
        self
    }

    #[must_use]
    pub const fn coordinate_space(&self) -> CoordinateSpace {
        if self.relative {
            CoordinateSpace::ContentBox
        } else {
            CoordinateSpace::Viewport
        }
    }
}
