use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use grid_decomp::algs::adjacency_graph::{GraphKind, build_grid_graph};
use grid_decomp::algs::structured::StructuredDecomposer;
use grid_decomp::field::Field;
use grid_decomp::grid::{Grid, ProcessGrid};
use grid_decomp::partitioning::{GraphPartitioner, GreedyPartitioner};

fn bench_structured(c: &mut Criterion) {
    let mut group = c.benchmark_group("structured");
    let decomposer = StructuredDecomposer::new(ProcessGrid::new(4, 4).unwrap());
    for &n in &[100usize, 400, 1000] {
        let grid = Grid::new(n, n).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &grid, |b, &grid| {
            b.iter(|| decomposer.decompose(grid, 16).unwrap());
        });
    }
    group.finish();
}

fn bench_csr(c: &mut Criterion) {
    let mut group = c.benchmark_group("csr");
    for &n in &[100usize, 400, 1000] {
        let grid = Grid::new(n, n).unwrap();
        group.bench_with_input(BenchmarkId::new("list", n), &grid, |b, &grid| {
            b.iter(|| build_grid_graph(grid, GraphKind::AdjacencyList));
        });
        group.bench_with_input(BenchmarkId::new("matrix", n), &grid, |b, &grid| {
            b.iter(|| build_grid_graph(grid, GraphKind::AdjacencyMatrix));
        });
    }
    group.finish();
}

fn bench_greedy(c: &mut Criterion) {
    let mut group = c.benchmark_group("greedy");
    for &n in &[64usize, 256] {
        let grid = Grid::new(n, n).unwrap();
        let graph = build_grid_graph(grid, GraphKind::AdjacencyList);
        let weights = Field::generate(grid).weights(8.0);
        let partitioner = GraphPartitioner::new(GreedyPartitioner::default());
        for &parts in &[4usize, 16] {
            group.bench_with_input(
                BenchmarkId::new(format!("{n}x{n}"), parts),
                &parts,
                |b, &parts| {
                    b.iter(|| partitioner.partition(&graph, &weights, parts).unwrap());
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_structured, bench_csr, bench_greedy);
criterion_main!(benches);
