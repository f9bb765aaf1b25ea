use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use dag_service::invariants::graph_violation;
use dag_service::models::{EdgeData, NodeData};

fn lcg_next(state: &mut u64) -> u64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    *state
}

fn node_name(idx: usize) -> String {
    format!("n{idx}")
}

/// Random forward edges only, so every generated graph is acyclic.
fn synthetic_dag(node_count: usize, edge_count: usize) -> (Vec<NodeData>, Vec<EdgeData>) {
    let nodes = (0..node_count)
        .map(|idx| NodeData {
            name: node_name(idx),
        })
        .collect::<Vec<_>>();

    let mut state = 0x1234_5678_9abc_def0u64;
    let mut edges = Vec::with_capacity(edge_count);
    while edges.len() < edge_count {
        let a = (lcg_next(&mut state) as usize) % node_count;
        let b = (lcg_next(&mut state) as usize) % node_count;
        if a == b {
            continue;
        }
        let (from, to) = if a < b { (a, b) } else { (b, a) };
        edges.push(EdgeData {
            source: node_name(from),
            target: node_name(to),
        });
    }

    (nodes, edges)
}

/// A single path through every node, the longest walk the first-successor cycle check can take.
fn chain(node_count: usize) -> (Vec<NodeData>, Vec<EdgeData>) {
    let nodes = (0..node_count)
        .map(|idx| NodeData {
            name: node_name(idx),
        })
        .collect::<Vec<_>>();
    let edges = (1..node_count)
        .map(|idx| EdgeData {
            source: node_name(idx - 1),
            target: node_name(idx),
        })
        .collect::<Vec<_>>();
    (nodes, edges)
}

fn bench_random_dags(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_random_dag");
    for (nodes, edges) in [(1_000usize, 3_000usize), (3_000usize, 9_000usize)] {
        let graph = synthetic_dag(nodes, edges);
        group.throughput(Throughput::Elements(edges as u64));
        group.bench_with_input(
            BenchmarkId::new("graph_violation", format!("{nodes}n_{edges}e")),
            &graph,
            |b, (nodes, edges)| b.iter(|| black_box(graph_violation(nodes, edges))),
        );
    }
    group.finish();
}

fn bench_chains(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_chain");
    for nodes in [100usize, 500usize] {
        let graph = chain(nodes);
        group.throughput(Throughput::Elements(nodes as u64));
        group.bench_with_input(
            BenchmarkId::new("graph_violation", format!("{nodes}n")),
            &graph,
            |b, (nodes, edges)| b.iter(|| black_box(graph_violation(nodes, edges))),
        );
    }
    group.finish();
}

criterion_group!(validation, bench_random_dags, bench_chains);
criterion_main!(validation);
