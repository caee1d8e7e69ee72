//! Dispatch throughput benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::path::Path;
use watchdog::{Callbacks, EventDispatcher, PathFilter, RawEvent, WatchOptions};

fn bench_dispatch(c: &mut Criterion) {
    let root = Path::new("/bench");
    let callbacks = Callbacks::new()
        .on_created(|event| {
            black_box(event);
            Ok(())
        })
        .on_modified(|_| anyhow::bail!("always fails"));

    let unfiltered = EventDispatcher::new(callbacks.clone(), PathFilter::allow_all(root));
    let event = RawEvent::created("/bench/models/benchy.3mf", false);

    c.bench_function("dispatch_created", |b| {
        b.iter(|| unfiltered.dispatch(black_box(event.clone())))
    });

    let missing = RawEvent::deleted("/bench/models/benchy.3mf", false);
    c.bench_function("dispatch_unregistered_kind", |b| {
        b.iter(|| unfiltered.dispatch(black_box(missing.clone())))
    });

    let failing = RawEvent::modified("/bench/models/benchy.3mf", false);
    c.bench_function("dispatch_failing_callback", |b| {
        b.iter(|| unfiltered.dispatch(black_box(failing.clone())))
    });

    let options = WatchOptions {
        patterns: vec!["*.gcode".to_string(), "models/".to_string()],
        ..WatchOptions::default()
    };
    let filter = PathFilter::compile(root, &options).expect("patterns compile");
    let filtered = EventDispatcher::new(callbacks, filter);
    let rejected = RawEvent::created("/bench/notes/readme.txt", false);

    c.bench_function("dispatch_with_patterns", |b| {
        b.iter(|| {
            filtered.dispatch(black_box(event.clone()));
            filtered.dispatch(black_box(rejected.clone()));
        })
    });
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
