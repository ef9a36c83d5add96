#![forbid(unsafe_code)]

//! Host seam: the rendering engine that acts as the layout oracle.
//!
//! The measurement stages never lay out text themselves. They hand a style
//! and content to a [`MirrorSurface`] and read back where the engine put the
//! marker. A browser host implements these traits over DOM elements; a
//! native host can implement them over any text shaper.

use std::fmt;

use crate::control::ControlKind;
use crate::geometry::{MarkerOffset, ScrollOffset, ViewportRect};
use crate::mirror::MirrorContent;
use crate::style::{ComputedStyle, LayoutEngine, MirrorStyle};

/// Host failure while creating or driving a mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    /// No document (or no body) to attach the mirror to.
    NoDocument,
    /// Engine-reported failure.
    Host(String),
}

impl fmt::Display for MirrorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDocument => write!(f, "no document available for the mirror element"),
            Self::Host(msg) => write!(f, "host error: {msg}"),
        }
    }
}

impl std::error::Error for MirrorError {}

/// Read-only view of the live text-entry control.
pub trait TargetElement {
    fn control_kind(&self) -> ControlKind;

    /// Current text value.
    fn value(&self) -> String;

    /// Caret (selection start) as a UTF-16 offset, if the control reports one.
    fn selection_start(&self) -> Option<u32>;

    fn scroll_offset(&self) -> ScrollOffset;

    /// Border box in viewport coordinates.
    fn bounding_rect(&self) -> ViewportRect;

    fn computed_style(&self) -> ComputedStyle;

    /// Whether the element is still attached to a document.
    fn is_connected(&self) -> bool {
        true
    }
}

/// Off-screen clone owned by one target association.
///
/// Between measurements the surface must be empty.
pub trait MirrorSurface {
    /// Replace the surface's style with `style`.
    fn apply_style(&mut self, style: &MirrorStyle);

    /// Write `content.prefix` as direct text and append a marker holding
    /// `content.marker`. `highlight` is a marker background for debugging.
    fn set_content(
        &mut self,
        content: &MirrorContent,
        highlight: Option<&str>,
    ) -> Result<(), MirrorError>;

    /// Marker offset from the surface's padding edge.
    fn marker_offset(&self) -> MarkerOffset;

    /// Remove the marker and all text.
    fn clear(&mut self);

    fn is_empty(&self) -> bool;
}

/// Factory for mirrors plus engine identification.
pub trait MirrorHost {
    type Target: TargetElement;
    type Mirror: MirrorSurface;

    /// Create the mirror for a new association.
    fn create_mirror(&mut self) -> Result<Self::Mirror, MirrorError>;

    fn engine(&self) -> LayoutEngine;
}
