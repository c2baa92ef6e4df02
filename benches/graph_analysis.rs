//! Benchmarks for the analysis passes on large synthetic graphs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use depscope::analysis::{calculate_stats, find_cycles, DepthAnalysis};
use depscope::graph::{DependencyEdge, DependencyGraph, DependencyNode, EdgeKind, NodeKind};

/// Layered graph where each node depends on `fan_out` nodes of the next
/// layer, with one back edge per layer to create cycles.
fn create_layered_graph(total_nodes: usize, fan_out: usize) -> DependencyGraph {
    let layer_size = 50;
    let ids: Vec<String> = (0..total_nodes).map(|i| format!("mod-{:06}", i)).collect();

    let mut graph = DependencyGraph::with_capacity(total_nodes, total_nodes * fan_out);
    for id in &ids {
        graph.add_node(DependencyNode::new(id, id, NodeKind::Module));
    }
    for (i, id) in ids.iter().enumerate() {
        let next_layer = (i / layer_size + 1) * layer_size;
        for k in 0..fan_out {
            let target = next_layer + (i + k) % layer_size;
            if target < total_nodes {
                graph.add_edge(DependencyEdge::new(id, &ids[target], EdgeKind::Imports));
            }
        }
        if i % layer_size == 0 && i >= layer_size {
            graph.add_edge(DependencyEdge::new(id, &ids[i - layer_size], EdgeKind::Imports));
        }
    }
    graph
}

fn bench_cycles(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_cycles");

    for size in [500, 2000, 10000].iter() {
        let graph = create_layered_graph(*size, 3);
        group.bench_with_input(BenchmarkId::new("nodes", size), &graph, |b, g| {
            b.iter(|| black_box(find_cycles(g)));
        });
    }

    group.finish();
}

fn bench_critical_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("critical_path");

    for size in [500, 2000, 10000].iter() {
        let graph = create_layered_graph(*size, 3);
        group.bench_with_input(BenchmarkId::new("nodes", size), &graph, |b, g| {
            b.iter(|| black_box(DepthAnalysis::compute(g).critical_path()));
        });
    }

    group.finish();
}

fn bench_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("calculate_stats");

    for size in [500, 2000, 10000].iter() {
        let mut graph = create_layered_graph(*size, 3);
        DepthAnalysis::compute(&graph).apply(&mut graph);
        group.bench_with_input(BenchmarkId::new("nodes", size), &graph, |b, g| {
            b.iter(|| black_box(calculate_stats(g)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cycles, bench_critical_path, bench_stats);
criterion_main!(benches);
