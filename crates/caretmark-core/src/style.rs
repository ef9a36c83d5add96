#![forbid(unsafe_code)]

//! Style replication: computed style of the target → mirror declarations.
//!
//! The copied property list is fixed and covers every property that affects
//! where text wraps and how wide each glyph is. After the copy, the control
//! profile ([`ControlKind::profile`]) and a handful of fixed declarations
//! move the mirror out of flow and hide it.
//!
//! The mirror must be resynchronized on every measurement; element size,
//! theme and web fonts can all change between two calls.

use crate::control::{ControlKind, LineHeightSource};

/// Line height used by engines for `line-height: normal`, as a multiple of
/// the font size.
pub const NORMAL_LINE_HEIGHT_RATIO: f64 = 1.2;

/// Background of the marker when debugging.
pub const DEBUG_MARKER_BACKGROUND: &str = "#ff0";

/// Horizontal offset that keeps the mirror outside the viewport.
pub const OFFSCREEN_LEFT: &str = "-9999px";

/// Layout-affecting properties copied from the target onto the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    Direction,
    BoxSizing,
    Width,
    Height,
    OverflowX,
    OverflowY,
    BorderTopWidth,
    BorderRightWidth,
    BorderBottomWidth,
    BorderLeftWidth,
    BorderStyle,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,
    FontStyle,
    FontVariant,
    FontWeight,
    FontStretch,
    FontSize,
    FontSizeAdjust,
    LineHeight,
    FontFamily,
    TextAlign,
    TextTransform,
    TextIndent,
    TextDecoration,
    LetterSpacing,
    WordSpacing,
    TabSize,
    /// Gecko's prefixed `tab-size`; reads as empty on other engines.
    MozTabSize,
}

impl StyleProperty {
    pub const COUNT: usize = 31;

    /// Copy order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Direction,
        Self::BoxSizing,
        Self::Width,
        Self::Height,
        Self::OverflowX,
        Self::OverflowY,
        Self::BorderTopWidth,
        Self::BorderRightWidth,
        Self::BorderBottomWidth,
        Self::BorderLeftWidth,
        Self::BorderStyle,
        Self::PaddingTop,
        Self::PaddingRight,
        Self::PaddingBottom,
        Self::PaddingLeft,
        Self::FontStyle,
        Self::FontVariant,
        Self::FontWeight,
        Self::FontStretch,
        Self::FontSize,
        Self::FontSizeAdjust,
        Self::LineHeight,
        Self::FontFamily,
        Self::TextAlign,
        Self::TextTransform,
        Self::TextIndent,
        Self::TextDecoration,
        Self::LetterSpacing,
        Self::WordSpacing,
        Self::TabSize,
        Self::MozTabSize,
    ];

    /// CSS property name, as accepted by `getPropertyValue`/`setProperty`.
    #[must_use]
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::Direction => "direction",
            Self::BoxSizing => "box-sizing",
            Self::Width => "width",
            Self::Height => "height",
            Self::OverflowX => "overflow-x",
            Self::OverflowY => "overflow-y",
            Self::BorderTopWidth => "border-top-width",
            Self::BorderRightWidth => "border-right-width",
            Self::BorderBottomWidth => "border-bottom-width",
            Self::BorderLeftWidth => "border-left-width",
            Self::BorderStyle => "border-style",
            Self::PaddingTop => "padding-top",
            Self::PaddingRight => "padding-right",
            Self::PaddingBottom => "padding-bottom",
            Self::PaddingLeft => "padding-left",
            Self::FontStyle => "font-style",
            Self::FontVariant => "font-variant",
            Self::FontWeight => "font-weight",
            Self::FontStretch => "font-stretch",
            Self::FontSize => "font-size",
            Self::FontSizeAdjust => "font-size-adjust",
            Self::LineHeight => "line-height",
            Self::FontFamily => "font-family",
            Self::TextAlign => "text-align",
            Self::TextTransform => "text-transform",
            Self::TextIndent => "text-indent",
            Self::TextDecoration => "text-decoration",
            Self::LetterSpacing => "letter-spacing",
            Self::WordSpacing => "word-spacing",
            Self::TabSize => "tab-size",
            Self::MozTabSize => "-moz-tab-size",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Snapshot of a target's computed style, restricted to [`StyleProperty`].
///
/// Missing properties read as the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedStyle {
    values: Vec<String>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            values: vec![String::new(); StyleProperty::COUNT],
        }
    }
}

impl ComputedStyle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot by reading every property through `read`.
    pub fn from_fn(mut read: impl FnMut(StyleProperty) -> String) -> Self {
        Self {
            values: StyleProperty::ALL.iter().map(|&prop| read(prop)).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, prop: StyleProperty) -> &str {
        &self.values[prop.index()]
    }

    pub fn set(&mut self, prop: StyleProperty, value: impl Into<String>) {
        self.values[prop.index()] = value.into();
    }

    #[must_use]
    pub fn with(mut self, prop: StyleProperty, value: impl Into<String>) -> Self {
        self.set(prop, value);
        self
    }

    /// Integer pixel value of a length property (`parseInt` semantics).
    #[must_use]
    pub fn px_int(&self, prop: StyleProperty) -> Option<i32> {
        css_px_int(self.get(prop))
    }

    /// Computed line height in whole pixels, resolving `normal` and unitless
    /// values against the font size.
    #[must_use]
    pub fn line_height_px(&self) -> Option<i32> {
        resolve_line_height(self.get(StyleProperty::LineHeight), self.get(StyleProperty::FontSize))
    }
}

/// One `property: value` pair applied to the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDeclaration {
    pub name: &'static str,
    pub value: String,
}

/// Ordered, de-duplicated declarations for the mirror element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MirrorStyle {
    declarations: Vec<StyleDeclaration>,
}

impl MirrorStyle {
    /// Set `name`, replacing an earlier declaration of the same property.
    /// Empty values are ignored.
    pub fn set(&mut self, name: &'static str, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        match self.declarations.iter_mut().find(|d| d.name == name) {
            Some(existing) => existing.value = value,
            None => self.declarations.push(StyleDeclaration { name, value }),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleDeclaration> {
        self.declarations.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Pixel value of a declared length.
    #[must_use]
    pub fn px(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(css_px)
    }
}

/// Rendering engine family, for the one engine-specific shim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutEngine {
    #[default]
    Standard,
    /// Engines exposing `window.mozInnerScreenX`. They reserve scrollbar
    /// space differently, so the mirror uses `overflow: scroll` there.
    Gecko,
}

impl LayoutEngine {
    #[must_use]
    pub const fn mirror_overflow(self) -> &'static str {
        match self {
            Self::Standard => "hidden",
            Self::Gecko => "scroll",
        }
    }
}

/// Build the mirror style for a target.
///
/// `debug` only toggles visibility.
#[must_use]
pub fn replicate(
    computed: &ComputedStyle,
    kind: ControlKind,
    debug: bool,
    engine: LayoutEngine,
) -> MirrorStyle {
    let mut style = MirrorStyle::default();
    for prop in StyleProperty::ALL {
        style.set(prop.css_name(), computed.get(prop));
    }

    let profile = kind.profile();
    if profile.line_height == LineHeightSource::ElementHeight {
        style.set(
            StyleProperty::LineHeight.css_name(),
            computed.get(StyleProperty::Height),
        );
    }
    style.set("white-space", "pre-wrap");
    if let Some(word_wrap) = profile.word_wrap {
        style.set("word-wrap", word_wrap);
    }

    style.set("position", "absolute");
    style.set("visibility", if debug { "visible" } else { "hidden" });
    style.set("top", "0");
    style.set("left", OFFSCREEN_LEFT);
    style.set("overflow", engine.mirror_overflow());
    style
}

/// Leading number of a CSS value and the unit text after it.
fn split_number(value: &str) -> Option<(f64, &str)> {
    let s = value.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    let number = &s[..end];
    if !number[digits_start..].bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    number.parse::<f64>().ok().map(|n| (n, s[end..].trim()))
}

/// Pixel length as `f64` (`"12.5px"` → `12.5`).
#[must_use]
pub fn css_px(value: &str) -> Option<f64> {
    split_number(value).map(|(n, _)| n)
}

/// Pixel length truncated to an integer (`"12.7px"` → `12`, `"thin"` → `None`).
#[must_use]
pub fn css_px_int(value: &str) -> Option<i32> {
    css_px(value).map(|n| n.trunc() as i32)
}

/// Resolve a computed `line-height` to pixels.
///
/// `normal` becomes [`NORMAL_LINE_HEIGHT_RATIO`] × font size, unitless
/// numbers multiply the font size, percentages scale it.
#[must_use]
pub fn line_height_px(line_height: &str, font_size: &str) -> Option<f64> {
    let font_size = css_px(font_size);
    if line_height.trim().eq_ignore_ascii_case("normal") {
        return Some(font_size? * NORMAL_LINE_HEIGHT_RATIO);
    }
    let (n, unit) = split_number(line_height)?;
    match unit {
        "" => Some(n * font_size?),
        "%" => Some(n * font_size? / 100.0),
        _ => Some(n),
    }
}

/// [`line_height_px`] truncated to whole pixels.
#[must_use]
pub fn resolve_line_height(line_height: &str, font_size: &str) -> Option<i32> {
    line_height_px(line_height, font_size).map(|px| px.trunc() as i32)
}
