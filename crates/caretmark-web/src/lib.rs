#![forbid(unsafe_code)]

//! Browser host for `caretmark-core`.
//!
//! # Role in caretmark
//! `caretmark-core` measures carets against an abstract layout oracle. This
//! crate supplies the real one: the mirror is a `<div>` in the page, the
//! target is a live `<input>` or `<textarea>`, and measurements are
//! coalesced onto `requestAnimationFrame`.
//!
//! JavaScript talks to the [`CaretMark`] class:
//!
//! ```js
//! const mark = new CaretMark(textarea, { relative: true });
//! mark.onChange(({ top, left, height }) => moveMenu(top + height, left));
//! // ...
//! mark.free();
//! ```
//!
//! Option parsing ([`options`]) is target independent; everything touching
//! the DOM only builds for `wasm32`.

pub mod options;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod frame;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use dom::{DomHost, DomMirror, DomTarget};
#[cfg(target_arch = "wasm32")]
pub use frame::AnimationFrames;
pub use options::{ListenerScope, OptionsError, listener_plan, parse_options};
#[cfg(target_arch = "wasm32")]
pub use wasm::CaretMark;
