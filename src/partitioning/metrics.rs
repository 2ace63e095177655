//! Partitioning metrics utilities.
//!
//! Functions for evaluating the quality of a partition: edge cut (proxy for
//! communication volume) and weight balance. Intended for logging, tests and
//! CI validation of partitioning backends.

use super::{PartitionVector, VertexWeights};
use crate::algs::adjacency_graph::CsrGraph;

/// Computes the edge cut of a partitioning (O(E)).
///
/// The edge cut is the number of undirected edges whose endpoints lie in
/// different parts. Self loops never count.
pub fn edge_cut(graph: &CsrGraph, partition: &PartitionVector) -> usize {
    graph
        .edges()
        .filter(|&(u, v)| u < v && partition.owner(u) != partition.owner(v))
        .count()
}

/// Total vertex weight of every part.
pub fn part_weights(weights: &VertexWeights, partition: &PartitionVector) -> Vec<u64> {
    let mut sums = vec![0u64; partition.num_parts()];
    for (cell, &w) in weights.as_slice().iter().enumerate() {
        sums[partition.owner(cell)] += w;
    }
    sums
}

/// Largest part weight divided by the ideal `total / parts`.
///
/// 1.0 is perfect balance. Returns 1.0 for an empty weight set.
pub fn imbalance(weights: &VertexWeights, partition: &PartitionVector) -> f64 {
    let total = weights.total();
    if total == 0 {
        return 1.0;
    }
    let max = part_weights(weights, partition)
        .into_iter()
        .max()
        .unwrap_or(0);
    max as f64 * partition.num_parts() as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::adjacency_graph::{GraphKind, build_grid_graph};
    use crate::grid::Grid;

    #[test]
    fn edge_cut_of_halves() {
        // 2x4 grid split into left and right halves: 2 horizontal edges cut
        let g = build_grid_graph(Grid::new(2, 4).unwrap(), GraphKind::AdjacencyList);
        let pv = PartitionVector::new(vec![0, 0, 1, 1, 0, 0, 1, 1], 2).unwrap();
        assert_eq!(edge_cut(&g, &pv), 2);

        let all = PartitionVector::single(8);
        assert_eq!(edge_cut(&g, &all), 0);
    }

    #[test]
    fn self_loops_do_not_count() {
        let g = build_grid_graph(Grid::new(2, 2).unwrap(), GraphKind::AdjacencyMatrix);
        let pv = PartitionVector::new(vec![0, 1, 2, 3], 4).unwrap();
        assert_eq!(edge_cut(&g, &pv), 4);
    }

    #[test]
    fn weights_and_imbalance() {
        let w = VertexWeights::new(vec![1, 2, 3, 6]).unwrap();
        let pv = PartitionVector::new(vec![0, 0, 0, 1], 2).unwrap();
        assert_eq!(part_weights(&w, &pv), vec![6, 6]);
        assert!((imbalance(&w, &pv) - 1.0).abs() < 1e-12);

        let skewed = PartitionVector::new(vec![0, 0, 0, 0], 2).unwrap();
        assert!((imbalance(&w, &skewed) - 2.0).abs() < 1e-12);
    }
}
