#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use caretmark_core::{
    CaretCoordinates, CaretOptions, CaretTracker, CoalescedTracker, MeasureOutcome,
};
use js_sys::{Function, JSON, Object, Reflect};
use tracing::{debug, trace, warn};
use wasm_bindgen::prelude::*;
use web_sys::{Element, EventTarget};

use crate::dom::{DomHost, DomTarget};
use crate::frame::AnimationFrames;
use crate::options::{ListenerScope, listener_plan, parse_options};

type Session = CoalescedTracker<DomHost, AnimationFrames>;

fn options_from_js(value: &JsValue) -> Result<CaretOptions, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(CaretOptions::default());
    }
    let json = JSON::stringify(value)?;
    parse_options(&String::from(json)).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn target_from_js(element: Option<Element>) -> Result<Option<DomTarget>, JsValue> {
    element
        .map(|element| {
            DomTarget::from_element(element).map_err(|other| {
                JsValue::from_str(&format!(
                    "caret target must be an <input> or <textarea>, got <{}>",
                    other.node_name().to_ascii_lowercase()
                ))
            })
        })
        .transpose()
}

fn coordinates_object(coords: CaretCoordinates) -> JsValue {
    let obj = Object::new();
    let _ = Reflect::set(&obj, &JsValue::from_str("top"), &JsValue::from_f64(coords.top));
    let _ = Reflect::set(&obj, &JsValue::from_str("left"), &JsValue::from_f64(coords.left));
    let _ = Reflect::set(
        &obj,
        &JsValue::from_str("height"),
        &JsValue::from_f64(coords.height),
    );
    obj.into()
}

/// Call the change callback outside any borrow of the tracker, so it may
/// call back into `CaretMark`.
fn notify(pending: Option<(Function, CaretCoordinates)>) {
    let Some((callback, coords)) = pending else {
        return;
    };
    if let Err(err) = callback.call1(&JsValue::NULL, &coordinates_object(coords)) {
        warn!(?err, "caret change callback threw");
    }
}

struct Subscription {
    target: EventTarget,
    event: &'static str,
}

struct Inner {
    session: Session,
    target: Option<DomTarget>,
    subscriptions: Vec<Subscription>,
    on_change: Option<Function>,
    on_event: Closure<dyn FnMut()>,
    _on_frame: Closure<dyn FnMut()>,
}

impl Inner {
    /// Register the change listener for every tracked event.
    fn subscribe(&mut self) {
        let Some(target) = self.target.as_ref() else {
            return;
        };
        let listener: &Function = self.on_event.as_ref().unchecked_ref();
        let tracker = self.session.tracker();
        for (scope, event) in listener_plan(&tracker.options().track_events) {
            let event_target: EventTarget = match scope {
                ListenerScope::Target => target.element().clone().into(),
                ListenerScope::Document => tracker.host().document().clone().into(),
            };
            match event_target.add_event_listener_with_callback(event, listener) {
                Ok(()) => self.subscriptions.push(Subscription {
                    target: event_target,
                    event,
                }),
                Err(err) => warn!(event, ?err, "could not subscribe to caret event"),
            }
        }
        debug!(listeners = self.subscriptions.len(), "caret events subscribed");
    }

    fn unsubscribe(&mut self) {
        let listener: &Function = self.on_event.as_ref().unchecked_ref();
        for sub in self.subscriptions.drain(..) {
            if let Err(err) = sub
                .target
                .remove_event_listener_with_callback(sub.event, listener)
            {
                trace!(event = sub.event, ?err, "could not unsubscribe caret event");
            }
        }
    }

    /// End the current association: listeners, pending frame and mirror.
    fn release(&mut self) {
        self.unsubscribe();
        self.session.teardown();
    }

    fn measure_now(&mut self) -> MeasureOutcome {
        let Self {
            session, target, ..
        } = self;
        session.tracker_mut().measure(target.as_ref())
    }

    fn pending_notification(
        &self,
        outcome: Option<MeasureOutcome>,
    ) -> Option<(Function, CaretCoordinates)> {
        match outcome? {
            MeasureOutcome::Changed(coords) => Some((self.on_change.clone()?, coords)),
            MeasureOutcome::Unchanged(_) | MeasureOutcome::Skipped(_) => None,
        }
    }

    /// Listener body: coalesce onto the next animation frame.
    fn schedule(weak: &Weak<RefCell<Self>>) {
        let Some(rc) = weak.upgrade() else {
            return;
        };
        let Ok(mut inner) = rc.try_borrow_mut() else {
            trace!("caret tracker busy; dropping change signal");
            return;
        };
        inner.session.notify_change();
    }

    /// Animation frame body: run the pending measurement.
    fn run_frame(weak: &Weak<RefCell<Self>>) {
        let Some(rc) = weak.upgrade() else {
            return;
        };
        let pending = {
            let Ok(mut inner) = rc.try_borrow_mut() else {
                trace!("caret tracker busy; skipping frame");
                return;
            };
            let Self {
                session, target, ..
            } = &mut *inner;
            let outcome = session.run_pending(target.as_ref());
            inner.pending_notification(outcome)
        };
        notify(pending);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.release();
        debug!("caret tracker dropped");
    }
}

/// Tracks the caret of one `<input>` or `<textarea>` and reports its pixel
/// coordinates.
///
/// Edits are coalesced to one measurement per animation frame. The last
/// good coordinates (initially all zeros) stay readable through detached
/// or missing targets.
#[wasm_bindgen]
pub struct CaretMark {
    inner: Rc<RefCell<Inner>>,
}

#[wasm_bindgen]
impl CaretMark {
    /// `new CaretMark(element | null, { debug, relative, trackEvents })`.
    ///
    /// Measures once before returning when `element` is given.
    #[wasm_bindgen(constructor)]
    pub fn new(target: Option<Element>, options: JsValue) -> Result<CaretMark, JsValue> {
        let options = options_from_js(&options)?;
        let target = target_from_js(target)?;
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let host = DomHost::new().map_err(|err| JsValue::from_str(&err.to_string()))?;

        let inner = Rc::new_cyclic(|weak: &Weak<RefCell<Inner>>| {
            let on_frame = {
                let weak = weak.clone();
                Closure::<dyn FnMut()>::new(move || Inner::run_frame(&weak))
            };
            let on_event = {
                let weak = weak.clone();
                Closure::<dyn FnMut()>::new(move || Inner::schedule(&weak))
            };
            let frames =
                AnimationFrames::new(window, on_frame.as_ref().unchecked_ref::<Function>().clone());
            RefCell::new(Inner {
                session: CoalescedTracker::new(CaretTracker::new(host, options), frames),
                target,
                subscriptions: Vec::new(),
                on_change: None,
                on_event,
                _on_frame: on_frame,
            })
        });
        inner.borrow_mut().subscribe();

        let mark = Self { inner };
        mark.refresh();
        Ok(mark)
    }

    /// Last published `{ top, left, height }`.
    pub fn coordinates(&self) -> JsValue {
        coordinates_object(self.inner.borrow().session.tracker().coordinates())
    }

    #[wasm_bindgen(js_name = coordinatesJson)]
    pub fn coordinates_json(&self) -> Result<String, JsValue> {
        let coords = self.inner.borrow().session.tracker().coordinates();
        serde_json::to_string(&coords).map_err(|err| JsValue::from_str(&err.to_string()))
    }

    /// Measure immediately, bypassing frame coalescing.
    pub fn refresh(&self) -> JsValue {
        let (pending, coords) = {
            let mut inner = self.inner.borrow_mut();
            let outcome = inner.measure_now();
            (
                inner.pending_notification(Some(outcome)),
                inner.session.tracker().coordinates(),
            )
        };
        notify(pending);
        coordinates_object(coords)
    }

    /// Track a different element (or none). Starts a new association with a
    /// fresh mirror.
    #[wasm_bindgen(js_name = setTarget)]
    pub fn set_target(&self, target: Option<Element>) -> Result<(), JsValue> {
        let target = target_from_js(target)?;
        {
            let mut inner = self.inner.borrow_mut();
            inner.release();
            inner.target = target;
            inner.subscribe();
        }
        self.refresh();
        Ok(())
    }

    /// Replace the options. Takes effect at the next frame.
    #[wasm_bindgen(js_name = setOptions)]
    pub fn set_options(&self, options: JsValue) -> Result<(), JsValue> {
        let options = options_from_js(&options)?;
        let mut inner = self.inner.borrow_mut();
        inner.unsubscribe();
        inner.session.tracker_mut().set_options(options);
        inner.subscribe();
        inner.session.notify_change();
        Ok(())
    }

    /// Call `callback({ top, left, height })` whenever the coordinates
    /// change. Replaces any earlier callback.
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, callback: Function) {
        self.inner.borrow_mut().on_change = Some(callback);
    }

    #[wasm_bindgen(js_name = offChange)]
    pub fn off_change(&self) {
        self.inner.borrow_mut().on_change = None;
    }

    /// Stop tracking. Coordinates keep their last value.
    pub fn detach(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.release();
        inner.target = None;
    }

    /// Successful measurements so far.
    #[wasm_bindgen(getter)]
    pub fn measurements(&self) -> f64 {
        self.inner.borrow().session.tracker().measurements() as f64
    }
}
