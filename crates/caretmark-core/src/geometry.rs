#![forbid(unsafe_code)]

//! Pixel geometry shared by the measurement stages.
//!
//! All values are CSS pixels as `f64`, matching what the DOM reports.

/// Caret position and line height in pixels.
///
/// `top`/`left` are either content-box-relative or viewport-absolute,
/// depending on [`CoordinateSpace`](crate::CoordinateSpace); never a mix.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CaretCoordinates {
    /// Offset of the caret's top edge.
    pub top: f64,
    /// Offset of the caret's left edge.
    pub left: f64,
    /// Resolved line height of the text.
    pub height: f64,
}

impl CaretCoordinates {
    /// Create coordinates with explicit fields.
    #[must_use]
    pub const fn new(top: f64, left: f64, height: f64) -> Self {
        Self { top, left, height }
    }

    /// The zero value published before the first successful measurement.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Shift `top`/`left` by the given deltas, keeping `height`.
    #[must_use]
    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self {
            top: self.top + dy,
            left: self.left + dx,
            height: self.height,
        }
    }
}

/// Border-box rectangle of the target in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewportRect {
    #[must_use]
    pub const fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// `(left, top)` of the rectangle.
    #[must_use]
    pub const fn origin(&self) -> (f64, f64) {
        (self.left, self.top)
    }
}

/// Internal scroll position of the target.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub top: f64,
    pub left: f64,
}

impl ScrollOffset {
    #[must_use]
    pub const fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }
}

/// Offset of the marker relative to the mirror's padding edge.
///
/// Same semantics as `HTMLElement.offsetTop` / `offsetLeft` when the mirror
/// is the marker's offset parent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarkerOffset {
    pub top: f64,
    pub left: f64,
}

impl MarkerOffset {
    #[must_use]
    pub const fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }
}
