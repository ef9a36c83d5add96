#![forbid(unsafe_code)]

//! Coordinate resolution: marker offset → caret coordinates.
//!
//! ```text
//! local_top  = marker.top  - scroll.top  + border_top
//! local_left = marker.left - scroll.left + border_left
//! ```
//!
//! Content-box mode reports the local offsets; viewport mode adds the
//! target's bounding-rectangle origin.

use crate::geometry::{CaretCoordinates, MarkerOffset, ScrollOffset, ViewportRect};
use crate::host::TargetElement;
use crate::options::CoordinateSpace;
use crate::style::{ComputedStyle, StyleProperty};

/// Target measurements needed to place the marker offset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetMetrics {
    pub scroll: ScrollOffset,
    /// Computed `border-top-width`, whole pixels.
    pub border_top: f64,
    /// Computed `border-left-width`, whole pixels.
    pub border_left: f64,
    /// Computed line height, whole pixels.
    pub line_height: f64,
    pub rect: ViewportRect,
}

impl TargetMetrics {
    /// Derive metrics from a computed style plus scroll and rectangle reads.
    ///
    /// Unparseable lengths count as zero.
    #[must_use]
    pub fn from_style(style: &ComputedStyle, scroll: ScrollOffset, rect: ViewportRect) -> Self {
        let px = |prop| f64::from(style.px_int(prop).unwrap_or(0));
        Self {
            scroll,
            border_top: px(StyleProperty::BorderTopWidth),
            border_left: px(StyleProperty::BorderLeftWidth),
            line_height: f64::from(style.line_height_px().unwrap_or(0)),
            rect,
        }
    }

    /// Read metrics from a live target.
    pub fn read<T: TargetElement + ?Sized>(target: &T, style: &ComputedStyle) -> Self {
        Self::from_style(style, target.scroll_offset(), target.bounding_rect())
    }
}

/// Resolve a marker offset into the requested coordinate space.
#[must_use]
pub fn resolve(
    marker: MarkerOffset,
    metrics: &TargetMetrics,
    space: CoordinateSpace,
) -> CaretCoordinates {
    let local = CaretCoordinates {
        top: marker.top - metrics.scroll.top + metrics.border_top,
        left: marker.left - metrics.scroll.left + metrics.border_left,
        height: metrics.line_height,
    };
    match space {
        CoordinateSpace::ContentBox => local,
        CoordinateSpace::Viewport => local.translate(metrics.rect.left, metrics.rect.top),
    }
}
