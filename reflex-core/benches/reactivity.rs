use std::cell::Cell;
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use reflex_core::{create_ref, effect, reactive_object, EffectOptions, Object};

fn tracked_reads(c: &mut Criterion) {
    let target: Object = (0..16).map(|n| (format!("k{n}"), n)).collect();
    let view = reactive_object(&target);

    c.bench_function("untracked view get", |b| {
        b.iter(|| black_box(view.get(black_box("k7"))))
    });

    let reader = view.clone();
    let runner = effect(
        move || {
            for n in 0..16 {
                black_box(reader.get(&format!("k{n}")));
            }
        },
        EffectOptions::lazy(),
    );
    c.bench_function("effect run reading 16 keys", |b| b.iter(|| runner.run()));
}

fn trigger_fan_out(c: &mut Criterion) {
    c.bench_function("ref set with 32 dependents", |b| {
        b.iter_batched(
            || {
                let source = create_ref(0);
                let hits = Rc::new(Cell::new(0u64));
                let runners: Vec<_> = (0..32)
                    .map(|_| {
                        let (reader, hits) = (source.clone(), hits.clone());
                        effect(
                            move || {
                                reader.get();
                                hits.set(hits.get() + 1);
                            },
                            EffectOptions::default(),
                        )
                    })
                    .collect();
                (source, runners)
            },
            |(source, runners)| {
                source.set(1);
                black_box(runners);
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, tracked_reads, trigger_fan_out);
criterion_main!(benches);
