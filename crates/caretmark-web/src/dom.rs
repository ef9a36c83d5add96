#![forbid(unsafe_code)]

//! DOM implementation of the host traits.

use caretmark_core::{
    ComputedStyle, ControlKind, LayoutEngine, MIRROR_ELEMENT_ID, MarkerOffset, MirrorContent,
    MirrorError, MirrorHost, MirrorStyle, MirrorSurface, ScrollOffset, StyleProperty,
    TargetElement, ViewportRect,
};
use js_sys::Reflect;
use tracing::{trace, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlTextAreaElement};

fn js_error(err: JsValue) -> MirrorError {
    MirrorError::Host(format!("{err:?}"))
}

// ── Target ──────────────────────────────────────────────────────────────

/// A live `<input>` or `<textarea>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomTarget {
    Input(HtmlInputElement),
    TextArea(HtmlTextAreaElement),
}

impl DomTarget {
    /// Wrap `element`, handing it back if it is not a text control.
    pub fn from_element(element: Element) -> Result<Self, Element> {
        let element = match element.dyn_into::<HtmlInputElement>() {
            Ok(input) => return Ok(Self::Input(input)),
            Err(other) => other,
        };
        element.dyn_into::<HtmlTextAreaElement>().map(Self::TextArea)
    }

    #[must_use]
    pub fn element(&self) -> &Element {
        match self {
            Self::Input(input) => input.as_ref(),
            Self::TextArea(area) => area.as_ref(),
        }
    }
}

impl TargetElement for DomTarget {
    fn control_kind(&self) -> ControlKind {
        ControlKind::from_node_name(&self.element().node_name())
    }

    fn value(&self) -> String {
        match self {
            Self::Input(input) => input.value(),
            Self::TextArea(area) => area.value(),
        }
    }

    fn selection_start(&self) -> Option<u32> {
        // Inputs of type email/number throw here.
        let start = match self {
            Self::Input(input) => input.selection_start(),
            Self::TextArea(area) => area.selection_start(),
        };
        start.ok().flatten()
    }

    fn scroll_offset(&self) -> ScrollOffset {
        let element = self.element();
        ScrollOffset::new(
            f64::from(element.scroll_top()),
            f64::from(element.scroll_left()),
        )
    }

    fn bounding_rect(&self) -> ViewportRect {
        let rect = self.element().get_bounding_client_rect();
        ViewportRect::new(rect.top(), rect.left(), rect.width(), rect.height())
    }

    fn computed_style(&self) -> ComputedStyle {
        let element = self.element();
        let declaration = element
            .owner_document()
            .and_then(|doc| doc.default_view())
            .map(|window| window.get_computed_style(element));
        match declaration {
            Some(Ok(Some(css))) => ComputedStyle::from_fn(|prop: StyleProperty| {
                css.get_property_value(prop.css_name()).unwrap_or_default()
            }),
            _ => {
                warn!("computed style unavailable; measuring with empty style");
                ComputedStyle::new()
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.element().is_connected()
    }
}

// ── Mirror ──────────────────────────────────────────────────────────────

/// Mirror `<div>` appended to the document body. Removed from the document
/// when dropped.
#[derive(Debug)]
pub struct DomMirror {
    document: Document,
    element: HtmlElement,
    marker: Option<HtmlElement>,
}

impl DomMirror {
    #[must_use]
    pub fn element(&self) -> &HtmlElement {
        &self.element
    }
}

impl MirrorSurface for DomMirror {
    fn apply_style(&mut self, style: &MirrorStyle) {
        let css = self.element.style();
        css.set_css_text("");
        for decl in style.iter() {
            if let Err(err) = css.set_property(decl.name, &decl.value) {
                trace!(property = decl.name, ?err, "mirror rejected declaration");
            }
        }
    }

    fn set_content(
        &mut self,
        content: &MirrorContent,
        highlight: Option<&str>,
    ) -> Result<(), MirrorError> {
        self.element.set_text_content(Some(&content.prefix));
        let span = self
            .document
            .create_element("span")
            .map_err(js_error)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| MirrorError::Host("span is not an HTMLElement".into()))?;
        span.set_text_content(Some(&content.marker));
        if let Some(color) = highlight {
            span.style()
                .set_property("background-color", color)
                .map_err(js_error)?;
        }
        self.element.append_child(&span).map_err(js_error)?;
        self.marker = Some(span);
        Ok(())
    }

    fn marker_offset(&self) -> MarkerOffset {
        self.marker.as_ref().map_or_else(MarkerOffset::default, |span| {
            MarkerOffset::new(f64::from(span.offset_top()), f64::from(span.offset_left()))
        })
    }

    fn clear(&mut self) {
        self.element.set_text_content(None);
        self.marker = None;
    }

    fn is_empty(&self) -> bool {
        self.marker.is_none() && !self.element.has_child_nodes()
    }
}

impl Drop for DomMirror {
    fn drop(&mut self) {
        let Some(parent) = self.element.parent_node() else {
            return;
        };
        if let Err(err) = parent.remove_child(&self.element) {
            warn!(?err, "could not remove mirror element");
        }
    }
}

// ── Host ────────────────────────────────────────────────────────────────

/// The current document, as a [`MirrorHost`].
#[derive(Debug, Clone)]
pub struct DomHost {
    document: Document,
    engine: LayoutEngine,
}

impl DomHost {
    /// Bind to the global window's document.
    pub fn new() -> Result<Self, MirrorError> {
        let window = web_sys::window().ok_or(MirrorError::NoDocument)?;
        let document = window.document().ok_or(MirrorError::NoDocument)?;
        let engine = Self::engine_of(&window);
        Ok(Self { document, engine })
    }

    /// Gecko exposes a non-null `mozInnerScreenX` on its windows.
    #[must_use]
    pub fn engine_of(window: &JsValue) -> LayoutEngine {
        let gecko = Reflect::get(window, &JsValue::from_str("mozInnerScreenX"))
            .is_ok_and(|value| !value.is_undefined() && !value.is_null());
        if gecko {
            LayoutEngine::Gecko
        } else {
            LayoutEngine::Standard
        }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl MirrorHost for DomHost {
    type Target = DomTarget;
    type Mirror = DomMirror;

    fn create_mirror(&mut self) -> Result<DomMirror, MirrorError> {
        let body = self.document.body().ok_or(MirrorError::NoDocument)?;
        let element = self
            .document
            .create_element("div")
            .map_err(js_error)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| MirrorError::Host("div is not an HTMLElement".into()))?;
        element.set_id(MIRROR_ELEMENT_ID);
        let css = element.style();
        css.set_property("position", "absolute").map_err(js_error)?;
        css.set_property("visibility", "hidden").map_err(js_error)?;
        body.append_child(&element).map_err(js_error)?;
        Ok(DomMirror {
            document: self.document.clone(),
            element,
            marker: None,
        })
    }

    fn engine(&self) -> LayoutEngine {
        self.engine
    }
}
