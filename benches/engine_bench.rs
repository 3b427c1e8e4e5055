use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use cosmophone::beat::pattern::BeatStyle;
use cosmophone::engine::{Engine, EngineConfig};
use cosmophone::scene::manager::{Scene, SceneConfig};

fn engine_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");

    group.bench_function("block_8_voices_and_beats", |b| {
        let mut engine = Engine::new(EngineConfig::default());
        engine.init(48_000.0);
        engine.start_beats(174.0, BeatStyle::Dnb, 0);
        for key in ['a', 's', 'd', 'f', 'j', 'k', 'l', 'q'] {
            engine.play_note(key);
        }

        let mut out = vec![0.0f32; 512];
        b.iter(|| {
            engine.process_block(black_box(&mut out));
        });
    });

    group.finish();
}

fn scene_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene");

    group.bench_function("sweep_256_entities", |b| {
        b.iter_batched(
            || {
                let mut scene = Scene::new(SceneConfig::default());
                for i in 0..128 {
                    scene.add_shape_and_friends('x', i as f64 * 0.01);
                }
                scene
            },
            |mut scene| {
                // Half the lifetimes have elapsed; the sweep must filter
                scene.sweep(black_box(8.0));
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, engine_block, scene_sweep);
criterion_main!(benches);
