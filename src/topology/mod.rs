//! Process communication topologies.
//!
//! * [`CartesianTopology`]: the 2D non-periodic process grid of the
//!   structured path. Ranks keep their world numbering (no reordering).
//! * [`GraphTopology`]: an arbitrary symmetric adjacency built from the
//!   partitioner's [`ProcessAdjacencyMap`](crate::partitioning::ProcessAdjacencyMap).
//!   That map only exists on the coordinator, so [`build_graph`] first hands
//!   every rank its own neighbour list.

use itertools::Itertools;

pub mod cartesian;
pub mod graph;

pub use cartesian::{CartesianTopology, Shift, build_cartesian};
pub use graph::{GraphTopology, build_graph, distribute_adjacency};

/// "No neighbour" as printed in reports (MPI's `MPI_PROC_NULL`).
pub const PROC_NULL: i64 = -1;

/// Render an optional rank the way reports print it.
pub fn rank_or_null(rank: Option<usize>) -> i64 {
    rank.map_or(PROC_NULL, |r| r as i64)
}

/// The topology a decomposition run communicates over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topology {
    Cartesian(CartesianTopology),
    Graph(GraphTopology),
}

impl Topology {
    pub fn rank(&self) -> usize {
        match self {
            Topology::Cartesian(t) => t.rank(),
            Topology::Graph(t) => t.rank(),
        }
    }

    /// Ranks the calling rank exchanges data with, ascending.
    pub fn neighbors(&self) -> Vec<usize> {
        match self {
            Topology::Cartesian(t) => t.neighbors().into_iter().sorted_unstable().collect(),
            Topology::Graph(t) => t.sources().to_vec(),
        }
    }

    /// Human-readable results of the topology queries, one line each.
    ///
    /// Cartesian: own coordinates, the rank at `(1, 1)` and the shift by -1
    /// along axis 0. Graph: neighbour counts and the neighbour list.
    pub fn check_report(&self) -> Vec<String> {
        let rank = self.rank();
        match self {
            Topology::Cartesian(t) => {
                let (row, column) = t.coords();
                let centre = match t.rank_of(1, 1) {
                    Ok(r) => format!("rank {rank}: coordinate (1, 1) belongs to rank {r}"),
                    Err(_) => format!("rank {rank}: coordinate (1, 1) is outside the topology"),
                };
                let mut lines = vec![format!("rank {rank}: coordinates ({row}, {column})"), centre];
                if let Ok(shift) = t.shift(0, -1) {
                    lines.push(format!(
                        "rank {rank}: shift along axis 0 by -1: source {}, destination {}",
                        rank_or_null(shift.source),
                        rank_or_null(shift.dest)
                    ));
                }
                lines
            }
            Topology::Graph(t) => {
                let (incoming, outgoing, weighted) = t.neighbors_count();
                vec![
                    format!("rank {rank}: {incoming} incoming, {outgoing} outgoing neighbours (weighted: {weighted})"),
                    format!("rank {rank}: neighbours [{}]", t.sources().iter().join(", ")),
                ]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ProcessGrid;

    #[test]
    fn boundary_shift_is_reported_as_null() {
        let grid = ProcessGrid::new(2, 2).unwrap();
        let topo = Topology::Cartesian(CartesianTopology::for_rank(0, grid).unwrap());
        let report = topo.check_report();
        assert_eq!(report[0], "rank 0: coordinates (0, 0)");
        assert_eq!(report[1], "rank 0: coordinate (1, 1) belongs to rank 3");
        assert_eq!(report[2], "rank 0: shift along axis 0 by -1: source 2, destination -1");
        assert_eq!(topo.neighbors(), vec![1, 2]);
    }

    #[test]
    fn graph_report_lists_neighbours() {
        let topo = Topology::Graph(GraphTopology::from_neighbors(1, vec![3, 0]));
        let report = topo.check_report();
        assert_eq!(report[0], "rank 1: 2 incoming, 2 outgoing neighbours (weighted: false)");
        assert_eq!(report[1], "rank 1: neighbours [0, 3]");
    }

    #[test]
    fn small_grid_has_no_centre() {
        let grid = ProcessGrid::new(1, 1).unwrap();
        let topo = Topology::Cartesian(CartesianTopology::for_rank(0, grid).unwrap());
        assert!(topo.check_report()[1].contains("outside"));
        assert!(topo.neighbors().is_empty());
    }
}
