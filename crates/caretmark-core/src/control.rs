#![forbid(unsafe_code)]

//! Control kinds and their per-kind mirror profile.
//!
//! Single-line and multi-line controls differ in three ways when mirrored.
//! Those differences live in a static table ([`ControlProfile`]) instead of
//! conditionals spread through the pipeline.

/// Kind of text-entry control being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ControlKind {
    /// `<input>`: one line, text never wraps.
    SingleLine,
    /// `<textarea>`: wraps at the content width.
    #[default]
    MultiLine,
}

/// Where the mirror's `line-height` comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineHeightSource {
    /// Copy the computed `line-height`.
    Computed,
    /// Use the element's computed `height`.
    ElementHeight,
}

/// Per-kind overrides applied on top of the copied style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlProfile {
    pub line_height: LineHeightSource,
    /// Value for `word-wrap`, or `None` to leave it unset.
    pub word_wrap: Option<&'static str>,
    /// Replace whitespace with U+00A0 in mirrored text.
    pub substitute_whitespace: bool,
}

const SINGLE_LINE_PROFILE: ControlProfile = ControlProfile {
    line_height: LineHeightSource::ElementHeight,
    word_wrap: None,
    substitute_whitespace: true,
};

const MULTI_LINE_PROFILE: ControlProfile = ControlProfile {
    line_height: LineHeightSource::Computed,
    word_wrap: Some("break-word"),
    substitute_whitespace: false,
};

impl ControlKind {
    /// Classify an element by its DOM node name.
    ///
    /// `INPUT` is single-line; anything else is treated as a textarea.
    #[must_use]
    pub fn from_node_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("input") {
            Self::SingleLine
        } else {
            Self::MultiLine
        }
    }

    #[must_use]
    pub const fn profile(self) -> &'static ControlProfile {
        match self {
            Self::SingleLine => &SINGLE_LINE_PROFILE,
            Self::MultiLine => &MULTI_LINE_PROFILE,
        }
    }

    #[must_use]
    pub const fn is_single_line(self) -> bool {
        matches!(self, Self::SingleLine)
    }
}
