#![forbid(unsafe_code)]

//! Mirror content: the text before the caret plus a marker holding the rest.
//!
//! The marker's rendered position is the caret's position. It is never empty:
//! an empty suffix is replaced by [`MARKER_PLACEHOLDER`] so the marker keeps
//! measurable dimensions.

use std::borrow::Cow;

use crate::control::ControlKind;

/// Marker text used when the caret is at the end of the value.
pub const MARKER_PLACEHOLDER: &str = ".";

/// Replacement for whitespace in single-line mirrors.
pub const NBSP: char = '\u{00A0}';

/// Text written into the mirror for one measurement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MirrorContent {
    /// Direct text content of the mirror (`value[..caret]`).
    pub prefix: String,
    /// Text of the marker node (`value[caret..]`, or the placeholder).
    pub marker: String,
}

impl MirrorContent {
    /// Build mirror content for `value` with the caret at UTF-16 offset
    /// `caret`.
    ///
    /// Out-of-range offsets clamp to the end of the value.
    #[must_use]
    pub fn build(value: &str, caret: u32, kind: ControlKind) -> Self {
        let split = utf16_to_byte_offset(value, caret);
        let (before, after) = value.split_at(split);
        let substitute = kind.profile().substitute_whitespace;

        let marker = if after.is_empty() {
            Cow::Borrowed(MARKER_PLACEHOLDER)
        } else if substitute {
            substitute_whitespace(after)
        } else {
            Cow::Borrowed(after)
        };
        let prefix = if substitute {
            substitute_whitespace(before)
        } else {
            Cow::Borrowed(before)
        };

        Self {
            prefix: prefix.into_owned(),
            marker: marker.into_owned(),
        }
    }

    /// Whether the marker holds the placeholder rather than real text.
    #[must_use]
    pub fn marker_is_placeholder(&self) -> bool {
        self.marker == MARKER_PLACEHOLDER
    }
}

/// Replace every whitespace character with a non-breaking space.
///
/// A block-level mirror would otherwise collapse or wrap at whitespace that a
/// single-line control renders verbatim.
#[must_use]
pub fn substitute_whitespace(text: &str) -> Cow<'_, str> {
    if !text.chars().any(is_breakable_space) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| if is_breakable_space(c) { NBSP } else { c })
            .collect(),
    )
}

/// The ECMAScript `WhiteSpace` and `LineTerminator` sets (regex `\s`).
///
/// Unlike [`char::is_whitespace`] this excludes U+0085 and includes U+FEFF.
#[must_use]
pub const fn is_breakable_space(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{000B}'
            | '\u{000C}'
            | '\r'
            | ' '
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// Convert a UTF-16 code unit offset (DOM selection index) to a byte offset.
///
/// Offsets past the end clamp to `text.len()`. An offset inside a surrogate
/// pair snaps down to the start of that character.
#[must_use]
pub fn utf16_to_byte_offset(text: &str, offset: u32) -> usize {
    let target = offset as usize;
    let mut units = 0usize;
    for (byte, ch) in text.char_indices() {
        let next = units + ch.len_utf16();
        if next > target {
            return byte;
        }
        units = next;
    }
    text.len()
}

/// Length of `text` in UTF-16 code units.
#[must_use]
pub fn utf16_len(text: &str) -> u32 {
    text.chars().map(|c| c.len_utf16() as u32).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_at_end_uses_placeholder() {
        let content = MirrorContent::build("hello", 5, ControlKind::SingleLine);
        assert_eq!(content.prefix, "hello");
        assert_eq!(content.marker, ".");
        assert!(content.marker_is_placeholder());
    }

    #[test]
    fn caret_at_start_moves_everything_to_marker() {
        let content = MirrorContent::build("hello", 0, ControlKind::MultiLine);
        assert_eq!(content.prefix, "");
        assert_eq!(content.marker, "hello");
    }

    #[test]
    fn empty_value() {
        let content = MirrorContent::build("", 0, ControlKind::MultiLine);
        assert_eq!(content, MirrorContent {
            prefix: String::new(),
            marker: ".".to_string(),
        });
    }

    #[test]
    fn single_line_whitespace_becomes_nbsp() {
        let content = MirrorContent::build("a b", 1, ControlKind::SingleLine);
        assert_eq!(content.prefix, "a");
        assert_eq!(content.marker, "\u{a0}b");

        let content = MirrorContent::build("a b\tc", 4, ControlKind::SingleLine);
        assert_eq!(content.prefix, "a\u{a0}b\u{a0}");
        assert_eq!(content.marker, "c");
    }

    #[test]
    fn multi_line_whitespace_is_verbatim() {
        let content = MirrorContent::build("line1\nline2", 6, ControlKind::MultiLine);
        assert_eq!(content.prefix, "line1\n");
        assert_eq!(content.marker, "line2");
    }

    #[test]
    fn caret_past_end_clamps() {
        let content = MirrorContent::build("abc", 99, ControlKind::MultiLine);
        assert_eq!(content.prefix, "abc");
        assert!(content.marker_is_placeholder());
    }

    #[test]
    fn utf16_offsets_map_to_char_boundaries() {
        // "é" is one UTF-16 unit and two bytes; "😀" is two units and four bytes.
        let text = "é😀x";
        assert_eq!(utf16_to_byte_offset(text, 0), 0);
        assert_eq!(utf16_to_byte_offset(text, 1), 2);
        assert_eq!(utf16_to_byte_offset(text, 2), 2); // inside the surrogate pair
        assert_eq!(utf16_to_byte_offset(text, 3), 6);
        assert_eq!(utf16_to_byte_offset(text, 4), 7);
        assert_eq!(utf16_len(text), 4);
    }

    #[test]
    fn substitution_borrows_when_nothing_to_replace() {
        assert!(matches!(substitute_whitespace("abc"), Cow::Borrowed(_)));
    }

    #[test]
    fn substitution_follows_ecmascript_space_set() {
        assert_eq!(substitute_whitespace("a\u{FEFF}b"), "a\u{A0}b");
        assert_eq!(substitute_whitespace("a\u{3000}\u{2009}b"), "a\u{A0}\u{A0}b");
        assert!(matches!(
            substitute_whitespace("a\u{0085}b"),
            Cow::Borrowed("a\u{0085}b")
        ));
    }
}
