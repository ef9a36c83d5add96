#![forbid(unsafe_code)]

//! One measurement: replicate style, mirror content, resolve coordinates.

use tracing::trace;

use crate::geometry::CaretCoordinates;
use crate::host::{MirrorError, MirrorSurface, TargetElement};
use crate::mirror::MirrorContent;
use crate::options::CaretOptions;
use crate::resolve::{TargetMetrics, resolve};
use crate::style::{self, DEBUG_MARKER_BACKGROUND, LayoutEngine};

/// Clears the mirror when dropped, so no exit path leaves stale content.
struct ClearOnExit<'a, M: MirrorSurface>(&'a mut M);

impl<M: MirrorSurface> Drop for ClearOnExit<'_, M> {
    fn drop(&mut self) {
        self.0.clear();
    }
}

/// Measure the caret of `target` using `mirror`.
///
/// The mirror is restyled from the target's current computed style and is
/// empty again when this returns, on success and on error.
pub fn measure_once<T, M>(
    mirror: &mut M,
    target: &T,
    options: &CaretOptions,
    engine: LayoutEngine,
) -> Result<CaretCoordinates, MirrorError>
where
    T: TargetElement + ?Sized,
    M: MirrorSurface,
{
    let kind = target.control_kind();
    let value = target.value();
    let caret = target.selection_start().unwrap_or(0);
    let computed = target.computed_style();

    mirror.apply_style(&style::replicate(&computed, kind, options.debug, engine));

    let content = MirrorContent::build(&value, caret, kind);
    let highlight = options.debug.then_some(DEBUG_MARKER_BACKGROUND);
    let marker = {
        let guard = ClearOnExit(mirror);
        guard.0.set_content(&content, highlight)?;
        guard.0.marker_offset()
    };
    trace!(
        ?kind,
        caret,
        marker_top = marker.top,
        marker_left = marker.left,
        "marker placed"
    );

    let metrics = TargetMetrics::read(target, &computed);
    Ok(resolve(marker, &metrics, options.coordinate_space()))
}
