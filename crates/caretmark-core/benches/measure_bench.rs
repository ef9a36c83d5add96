#![forbid(unsafe_code)]

use caretmark_core::mirror::MirrorContent;
use caretmark_core::oracle::{GridHost, StaticTarget};
use caretmark_core::style::replicate;
use caretmark_core::{
    CaretOptions, CaretTracker, CoalescedTracker, ControlKind, LayoutEngine, ManualFrames,
    TargetElement,
};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn paragraph(words: usize) -> String {
    (0..words)
        .map(|i| if i % 9 == 8 { "line\n" } else { "word " })
        .collect()
}

fn bench_pipeline_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("caret/stages");
    let target = StaticTarget::new(ControlKind::MultiLine, paragraph(200)).with_caret(400);
    let computed = target.computed_style();
    let value = target.value();

    group.bench_function("replicate_style", |b| {
        b.iter(|| {
            let style = replicate(
                black_box(&computed),
                ControlKind::MultiLine,
                false,
                LayoutEngine::Standard,
            );
            black_box(style.len());
        });
    });

    group.bench_function("mirror_content_single_line", |b| {
        b.iter(|| {
            let content = MirrorContent::build(black_box(&value), 400, ControlKind::SingleLine);
            black_box(content.marker.len());
        });
    });

    group.finish();
}

fn bench_tracker(c: &mut Criterion) {
    let mut group = c.benchmark_group("caret/tracker");

    group.bench_function("measure_short_input", |b| {
        let mut tracker = CaretTracker::new(GridHost::default(), CaretOptions::default());
        let target = StaticTarget::new(ControlKind::SingleLine, "search query").with_caret(6);
        b.iter(|| black_box(tracker.measure(Some(&target))));
    });

    group.bench_function("measure_long_textarea", |b| {
        let mut tracker = CaretTracker::new(GridHost::default(), CaretOptions::default());
        let target = StaticTarget::new(ControlKind::MultiLine, paragraph(1_000)).with_caret(2_500);
        b.iter(|| black_box(tracker.measure(Some(&target))));
    });

    group.bench_function("typing_burst_32_per_frame", |b| {
        let mut session = CoalescedTracker::new(
            CaretTracker::new(GridHost::default(), CaretOptions::default()),
            ManualFrames::new(),
        );
        let target = StaticTarget::new(ControlKind::MultiLine, paragraph(50)).with_caret(120);
        b.iter(|| {
            for _ in 0..32 {
                session.notify_change();
            }
            for handle in session.scheduler_mut().advance() {
                black_box(session.on_frame(handle, Some(&target)));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline_stages, bench_tracker);
criterion_main!(benches);
