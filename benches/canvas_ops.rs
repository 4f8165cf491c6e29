//! Benchmarks for graph store operations
//!
//! Measures node insertion, cascading deletion and timeline planning on
//! graphs of growing size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use agent_designer::canvas::{CanvasStore, Connection, NewNode, NodeData};
use agent_designer::component::NodeKind;
use agent_designer::config::SimulationSettings;
use agent_designer::simulation::Timeline;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

// Store holding a chain of `size` tool nodes in an otherwise empty environment
fn chain_store(size: usize) -> (CanvasStore, Vec<String>) {
    let mut store = CanvasStore::new();
    store.set_current_environment("env-production");
    store.set_current_environment("env-bench");

    let ids: Vec<String> = (0..size)
        .filter_map(|i| store.add_node(NewNode::new(NodeKind::Tool, NodeData::named(format!("tool {}", i)))))
        .collect();
    for pair in ids.windows(2) {
        store.connect(Connection::new(pair[0].clone(), pair[1].clone()));
    }
    (store, ids)
}

fn bench_add_node(c: &mut Criterion) {
    let mut group = c.benchmark_group("canvas_add_node");
    group.measurement_time(Duration::from_secs(5));

    for size in [10, 100, 500].iter() {
        group.bench_with_input(BenchmarkId::new("add", size), size, |b, &size| {
            b.iter_batched(
                || chain_store(size).0,
                |mut store| {
                    black_box(store.add_node(NewNode::new(NodeKind::Actor, NodeData::named("new"))))
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_delete_node(c: &mut Criterion) {
    let mut group = c.benchmark_group("canvas_delete_node");
    group.measurement_time(Duration::from_secs(5));

    for size in [10, 100, 500].iter() {
        group.bench_with_input(BenchmarkId::new("cascade", size), size, |b, &size| {
            b.iter_batched(
                || chain_store(size),
                |(mut store, ids)| black_box(store.delete_node(&ids[ids.len() / 2])),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_timeline(c: &mut Criterion) {
    let settings = SimulationSettings::default();
    let (store, _) = chain_store(100);

    c.bench_function("timeline_random_100", |b| {
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| black_box(Timeline::random(store.nodes(), store.edges(), &settings, &mut rng)))
    });
}

criterion_group!(benches, bench_add_node, bench_delete_node, bench_timeline);
criterion_main!(benches);
