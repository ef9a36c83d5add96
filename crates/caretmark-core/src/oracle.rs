#![forbid(unsafe_code)]

//! Fixed-advance layout oracle for hosts without a rendering engine.
//!
//! [`GridHost`] implements the host traits with a deterministic text layout:
//! every grapheme advances by its cell width (via `unicode-width`) times
//! [`GridMetrics::advance_em`] times the font size. It reads the replicated
//! mirror style the same way a browser would, so the whole pipeline can run
//! natively:
//!
//! - font size, line height (`normal`, unitless, px), letter and word spacing
//! - padding, border, `box-sizing` and `width` for the content width
//! - `tab-size` / `-moz-tab-size`, `text-indent`, `text-align`, `direction`
//! - `white-space: pre-wrap`: hard breaks at `\n`, soft breaks after spaces,
//!   trailing spaces hang
//! - `word-wrap: break-word`: words wider than a line break between graphemes
//!
//! Offsets are rounded to whole pixels like `offsetTop`/`offsetLeft`.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::control::ControlKind;
use crate::geometry::{MarkerOffset, ScrollOffset, ViewportRect};
use crate::host::{MirrorError, MirrorHost, MirrorSurface, TargetElement};
use crate::mirror::MirrorContent;
use crate::style::{ComputedStyle, LayoutEngine, MirrorStyle, StyleProperty, css_px, line_height_px};

const DEFAULT_FONT_SIZE: f64 = 16.0;
const DEFAULT_TAB_SIZE: f64 = 8.0;

/// Font metrics of the oracle's fixed-advance font.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    /// Advance of a one-cell grapheme, in ems.
    pub advance_em: f64,
    /// Height of the glyph content area, in ems.
    pub content_em: f64,
    /// Width reserved by a scrolling mirror.
    pub scrollbar_width: f64,
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self {
            advance_em: 0.5,
            content_em: 1.2,
            scrollbar_width: 0.0,
        }
    }
}

/// Host backed by the fixed-advance layout.
#[derive(Debug, Clone, Default)]
pub struct GridHost {
    metrics: GridMetrics,
    engine: LayoutEngine,
    created: usize,
}

impl GridHost {
    #[must_use]
    pub fn new(metrics: GridMetrics) -> Self {
        Self {
            metrics,
            ..Self::default()
        }
    }

    /// Pretend to be a specific engine family.
    #[must_use]
    pub fn with_engine(mut self, engine: LayoutEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Mirrors created so far.
    #[must_use]
    pub fn mirrors_created(&self) -> usize {
        self.created
    }
}

impl MirrorHost for GridHost {
    type Target = StaticTarget;
    type Mirror = GridMirror;

    fn create_mirror(&mut self) -> Result<GridMirror, MirrorError> {
        self.created += 1;
        Ok(GridMirror::new(self.metrics))
    }

    fn engine(&self) -> LayoutEngine {
        self.engine
    }
}

/// Mirror surface laid out by the oracle.
#[derive(Debug, Clone)]
pub struct GridMirror {
    metrics: GridMetrics,
    style: MirrorStyle,
    content: Option<MirrorContent>,
    highlight: Option<String>,
    marker: MarkerOffset,
}

impl GridMirror {
    #[must_use]
    pub fn new(metrics: GridMetrics) -> Self {
        Self {
            metrics,
            style: MirrorStyle::default(),
            content: None,
            highlight: None,
            marker: MarkerOffset::default(),
        }
    }

    #[must_use]
    pub fn style(&self) -> &MirrorStyle {
        &self.style
    }

    #[must_use]
    pub fn content(&self) -> Option<&MirrorContent> {
        self.content.as_ref()
    }

    #[must_use]
    pub fn highlight(&self) -> Option<&str> {
        self.highlight.as_deref()
    }
}

impl MirrorSurface for GridMirror {
    fn apply_style(&mut self, style: &MirrorStyle) {
        self.style = style.clone();
    }

    fn set_content(
        &mut self,
        content: &MirrorContent,
        highlight: Option<&str>,
    ) -> Result<(), MirrorError> {
        let frame = TextFrame::from_style(&self.style, &self.metrics);
        self.marker = frame.place_marker(&content.prefix, &content.marker);
        self.content = Some(content.clone());
        self.highlight = highlight.map(str::to_owned);
        Ok(())
    }

    fn marker_offset(&self) -> MarkerOffset {
        self.marker
    }

    fn clear(&mut self) {
        self.content = None;
        self.highlight = None;
        self.marker = MarkerOffset::default();
    }

    fn is_empty(&self) -> bool {
        self.content.is_none()
    }
}

// ── Layout ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

/// Resolved layout parameters of a mirror.
#[derive(Debug, Clone, Copy)]
struct TextFrame {
    advance: f64,
    letter_spacing: f64,
    word_spacing: f64,
    tab_width: f64,
    line_height: f64,
    half_leading: f64,
    padding_top: f64,
    padding_left: f64,
    content_width: f64,
    indent: f64,
    break_word: bool,
    align: Align,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GlyphClass {
    Newline,
    Space,
    Tab,
    Word,
}

#[derive(Debug, Clone, Copy)]
struct Glyph {
    byte: usize,
    class: GlyphClass,
    width: f64,
}

impl TextFrame {
    fn from_style(style: &MirrorStyle, metrics: &GridMetrics) -> Self {
        let px = |name: &str| style.px(name).unwrap_or(0.0);
        let font_size = style.px("font-size").unwrap_or(DEFAULT_FONT_SIZE);
        let advance = font_size * metrics.advance_em;
        let line_height = line_height_px(
            style.get("line-height").unwrap_or("normal"),
            style.get("font-size").unwrap_or("16px"),
        )
        .unwrap_or(font_size * crate::style::NORMAL_LINE_HEIGHT_RATIO);

        let tab_spec = style
            .get("tab-size")
            .or_else(|| style.get("-moz-tab-size"))
            .unwrap_or("8");
        let tab_width = match tab_spec.trim().strip_suffix("px") {
            Some(len) => css_px(len).unwrap_or(0.0),
            None => css_px(tab_spec).unwrap_or(DEFAULT_TAB_SIZE) * advance,
        };

        let horizontal_insets = px("padding-left") + px("padding-right");
        let horizontal_borders = px("border-left-width") + px("border-right-width");
        let mut content_width = match style.px("width") {
            Some(width) if style.get("box-sizing") == Some("border-box") => {
                width - horizontal_insets - horizontal_borders
            }
            Some(width) => width,
            None => f64::INFINITY,
        };
        if style.get("overflow") == Some("scroll") {
            content_width -= metrics.scrollbar_width;
        }

        let rtl = style.get("direction") == Some("rtl");
        let align = match style.get("text-align").unwrap_or("start") {
            "right" => Align::Right,
            "center" => Align::Center,
            "end" if !rtl => Align::Right,
            "start" if rtl => Align::Right,
            "left" | "start" | "end" | "justify" => Align::Left,
            _ if rtl => Align::Right,
            _ => Align::Left,
        };

        Self {
            advance,
            letter_spacing: px("letter-spacing"),
            word_spacing: px("word-spacing"),
            tab_width,
            line_height,
            half_leading: (line_height - font_size * metrics.content_em) / 2.0,
            padding_top: px("padding-top"),
            padding_left: px("padding-left"),
            content_width: content_width.max(0.0),
            indent: px("text-indent"),
            break_word: style.get("word-wrap") == Some("break-word"),
            align,
        }
    }

    fn glyphs(&self, text: &str) -> Vec<Glyph> {
        text.grapheme_indices(true)
            .map(|(byte, g)| {
                let class = match g {
                    "\n" | "\r\n" | "\r" => GlyphClass::Newline,
                    " " => GlyphClass::Space,
                    "\t" => GlyphClass::Tab,
                    _ => GlyphClass::Word,
                };
                let cells = match class {
                    GlyphClass::Newline | GlyphClass::Tab => 0,
                    _ => g.width(),
                };
                let mut width = cells as f64 * self.advance + self.letter_spacing;
                if g == " " || g == "\u{a0}" {
                    width += self.word_spacing;
                }
                Glyph { byte, class, width }
            })
            .collect()
    }

    /// Lay out `prefix + marker` and return the marker's offset.
    fn place_marker(&self, prefix: &str, marker: &str) -> MarkerOffset {
        let mut text = String::with_capacity(prefix.len() + marker.len());
        text.push_str(prefix);
        text.push_str(marker);
        let glyphs = self.glyphs(&text);

        // (line, x) of every glyph, then the content width of every line.
        let mut positions = Vec::with_capacity(glyphs.len());
        let mut line_widths = vec![0.0f64];
        let mut line = 0usize;
        let mut x = self.indent;
        let mut line_has_content = false;

        let new_line = |line: &mut usize, x: &mut f64, has: &mut bool, widths: &mut Vec<f64>| {
            *line += 1;
            *x = 0.0;
            *has = false;
            widths.push(0.0);
        };

        let mut i = 0;
        while i < glyphs.len() {
            let glyph = glyphs[i];
            match glyph.class {
                GlyphClass::Newline => {
                    positions.push((line, x));
                    new_line(&mut line, &mut x, &mut line_has_content, &mut line_widths);
                    i += 1;
                }
                GlyphClass::Space => {
                    positions.push((line, x));
                    x += glyph.width;
                    line_has_content = true;
                    i += 1;
                }
                GlyphClass::Tab => {
                    positions.push((line, x));
                    x = if self.tab_width > 0.0 {
                        ((x / self.tab_width).floor() + 1.0) * self.tab_width
                    } else {
                        x
                    };
                    line_has_content = true;
                    i += 1;
                }
                GlyphClass::Word => {
                    let end = glyphs[i..]
                        .iter()
                        .position(|g| g.class != GlyphClass::Word)
                        .map_or(glyphs.len(), |n| i + n);
                    let run: f64 = glyphs[i..end].iter().map(|g| g.width).sum();
                    if line_has_content && x + run > self.content_width {
                        new_line(&mut line, &mut x, &mut line_has_content, &mut line_widths);
                    }
                    for g in &glyphs[i..end] {
                        if self.break_word && line_has_content && x + g.width > self.content_width {
                            new_line(&mut line, &mut x, &mut line_has_content, &mut line_widths);
                        }
                        positions.push((line, x));
                        x += g.width;
                        line_has_content = true;
                        line_widths[line] = x;
                    }
                    i = end;
                }
            }
        }

        let boundary = prefix.len();
        let index = glyphs
            .iter()
            .rposition(|g| g.byte <= boundary)
            .unwrap_or(0);
        let Some(&(line, x)) = positions.get(index) else {
            return MarkerOffset::new(self.padding_top.round(), self.padding_left.round());
        };

        let slack = if self.content_width.is_finite() {
            (self.content_width - line_widths[line]).max(0.0)
        } else {
            0.0
        };
        let shift = match self.align {
            Align::Left => 0.0,
            Align::Right => slack,
            Align::Center => slack / 2.0,
        };

        let top = self.padding_top + line as f64 * self.line_height + self.half_leading;
        let left = self.padding_left + shift + x;
        MarkerOffset::new(top.round(), left.round())
    }
}

// ── Static target ───────────────────────────────────────────────────────

/// Plain-data text control, for native embedders and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticTarget {
    kind: ControlKind,
    value: String,
    selection_start: Option<u32>,
    scroll: ScrollOffset,
    rect: ViewportRect,
    style: ComputedStyle,
    connected: bool,
}

impl StaticTarget {
    /// A control with a 16px fixed-advance font, 20px line height, 2px
    /// padding and 1px border.
    #[must_use]
    pub fn new(kind: ControlKind, value: impl Into<String>) -> Self {
        let height = match kind {
            ControlKind::SingleLine => "20px",
            ControlKind::MultiLine => "80px",
        };
        let style = ComputedStyle::new()
            .with(StyleProperty::Direction, "ltr")
            .with(StyleProperty::BoxSizing, "content-box")
            .with(StyleProperty::Width, "160px")
            .with(StyleProperty::Height, height)
            .with(StyleProperty::OverflowX, "auto")
            .with(StyleProperty::OverflowY, "auto")
            .with(StyleProperty::BorderTopWidth, "1px")
            .with(StyleProperty::BorderRightWidth, "1px")
            .with(StyleProperty::BorderBottomWidth, "1px")
            .with(StyleProperty::BorderLeftWidth, "1px")
            .with(StyleProperty::BorderStyle, "solid")
            .with(StyleProperty::PaddingTop, "2px")
            .with(StyleProperty::PaddingRight, "2px")
            .with(StyleProperty::PaddingBottom, "2px")
            .with(StyleProperty::PaddingLeft, "2px")
            .with(StyleProperty::FontStyle, "normal")
            .with(StyleProperty::FontWeight, "400")
            .with(StyleProperty::FontSize, "16px")
            .with(StyleProperty::LineHeight, "20px")
            .with(StyleProperty::FontFamily, "monospace")
            .with(StyleProperty::TextAlign, "start")
            .with(StyleProperty::TextIndent, "0px")
            .with(StyleProperty::LetterSpacing, "normal")
            .with(StyleProperty::WordSpacing, "0px")
            .with(StyleProperty::TabSize, "8");
        Self {
            kind,
            value: value.into(),
            selection_start: None,
            scroll: ScrollOffset::default(),
            rect: ViewportRect::new(0.0, 0.0, 166.0, 26.0),
            style,
            connected: true,
        }
    }

    #[must_use]
    pub fn with_caret(mut self, caret: u32) -> Self {
        self.selection_start = Some(caret);
        self
    }

    #[must_use]
    pub fn with_style(mut self, prop: StyleProperty, value: impl Into<String>) -> Self {
        self.style.set(prop, value);
        self
    }

    #[must_use]
    pub fn with_scroll(mut self, scroll: ScrollOffset) -> Self {
        self.scroll = scroll;
        self
    }

    #[must_use]
    pub fn with_rect(mut self, rect: ViewportRect) -> Self {
        self.rect = rect;
        self
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn set_caret(&mut self, caret: Option<u32>) {
        self.selection_start = caret;
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl TargetElement for StaticTarget {
    fn control_kind(&self) -> ControlKind {
        self.kind
    }

    fn value(&self) -> String {
        self.value.clone()
    }

    fn selection_start(&self) -> Option<u32> {
        self.selection_start
    }

    fn scroll_offset(&self) -> ScrollOffset {
        self.scroll
    }

    fn bounding_rect(&self) -> ViewportRect {
        self.rect
    }

    fn computed_style(&self) -> ComputedStyle {
        self.style.clone()
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
