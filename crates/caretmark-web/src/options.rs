#![forbid(unsafe_code)]

//! JS options object and listener planning.

use std::fmt;

use caretmark_core::{CaretOptions, TrackedEvent};

/// Options object could not be understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    /// Not valid JSON, or a field has the wrong type or an unknown value.
    Invalid(String),
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "invalid caret options: {msg}"),
        }
    }
}

impl std::error::Error for OptionsError {}

/// Parse the JSON form of the JS options object.
///
/// Missing fields take their defaults; an empty string, `null` and
/// `undefined` (which `JSON.stringify` renders as nothing) mean all
/// defaults.
pub fn parse_options(json: &str) -> Result<CaretOptions, OptionsError> {
    let json = json.trim();
    if json.is_empty() || json == "null" {
        return Ok(CaretOptions::default());
    }
    let mut options: CaretOptions =
        serde_json::from_str(json).map_err(|err| OptionsError::Invalid(err.to_string()))?;
    // Non-adjacent duplicates would subscribe the same listener twice.
    let mut seen = Vec::with_capacity(options.track_events.len());
    options.track_events.retain(|event| {
        let fresh = !seen.contains(event);
        if fresh {
            seen.push(*event);
        }
        fresh
    });
    Ok(options)
}

/// Where a listener is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerScope {
    /// On the target element.
    Target,
    /// On the owning document (`selectionchange` only fires there).
    Document,
}

/// Listeners to register for `events`, in order.
#[must_use]
pub fn listener_plan(events: &[TrackedEvent]) -> Vec<(ListenerScope, &'static str)> {
    events
        .iter()
        .map(|event| {
            let scope = match event {
                TrackedEvent::SelectionChange => ListenerScope::Document,
                _ => ListenerScope::Target,
            };
            (scope, event.dom_name())
        })
        .collect()
}
