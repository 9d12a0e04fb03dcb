//! Benchmark: evaluation throughput across worker counts.
//!
//! Run with:
//! ```bash
//! cargo bench --bench evaluate
//! ```
//!
//! Two shapes are measured:
//! - wide: many constants fanning into layers of aggregators
//! - deep: a single long chain, where extra workers cannot help

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dagflow_core::graph::{Constant, Graph, GraphBuilder, Max, Sum};

/// `layers` layers of `width` nodes, each node feeding every node of the
/// next layer, topped by a single sum.
fn wide(width: usize, layers: usize) -> Graph {
    let mut builder = GraphBuilder::new();
    let mut below = vec![builder.node("sink", Sum, [])];
    for layer in 0..layers {
        below = (0..width)
            .map(|i| builder.node(format!("l{layer}_{i}"), Max, below.clone()))
            .collect();
    }
    let entries: Vec<_> = (0..width)
        .map(|i| builder.node(format!("c{i}"), Constant(i as i64), below.clone()))
        .collect();
    builder.build(entries).expect("wide graph is valid")
}

fn deep(depth: usize) -> Graph {
    let mut builder = GraphBuilder::new();
    let mut next = builder.node("n0", Sum, []);
    for i in 1..depth {
        next = builder.node(format!("n{i}"), Sum, [next]);
    }
    builder.build([next]).expect("deep graph is valid")
}

fn bench_evaluate(c: &mut Criterion) {
    let shapes = [("wide", wide(16, 8)), ("deep", deep(256))];

    for (name, graph) in &shapes {
        let mut group = c.benchmark_group(format!("evaluate_{name}"));
        group.throughput(Throughput::Elements(graph.len() as u64));
        for workers in [1, 2, 4, 8] {
            group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
                b.iter(|| black_box(graph.evaluate(workers).expect("evaluation succeeds")));
            });
        }
        group.finish();
    }
}

fn bench_build(c: &mut Criterion) {
    c.bench_function("build_wide_16x8", |b| b.iter(|| black_box(wide(16, 8))));
}

criterion_group!(benches, bench_evaluate, bench_build);
criterion_main!(benches);
