//! Benchmarks for the per-frame CPU work.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use driftfield::spawn::SpawnContext;
use driftfield::{Config, ParticleField, ProximityGraph, Scene};

const COUNTS: [u32; 3] = [100, 200, 300];

fn config(count: u32) -> Config {
    Config::default().with_particle_count(count).with_seed(42)
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("proximity_graph_rebuild");

    for count in COUNTS {
        group.bench_with_input(BenchmarkId::new("particles", count), &count, |b, &count| {
            let config = config(count);
            let field = ParticleField::new(&config, &mut SpawnContext::new(config.seed)).unwrap();
            let mut graph = ProximityGraph::new(field.len(), config.connection_threshold).unwrap();
            b.iter(|| {
                graph.rebuild(black_box(field.particles()));
                black_box(graph.len())
            })
        });
    }

    group.finish();
}

fn bench_scene_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene_step");

    for count in COUNTS {
        group.bench_with_input(BenchmarkId::new("particles", count), &count, |b, &count| {
            let mut scene = Scene::new(&config(count)).unwrap();
            scene.pointer_move(640.0, 360.0);
            let mut elapsed = 0.0;
            b.iter(|| {
                elapsed += 1.0 / 60.0;
                black_box(scene.step(elapsed).line_vertex_count())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rebuild, bench_scene_step);
criterion_main!(benches);
