//! Distributed graph topology built from the partitioner's rank adjacency.

use log::debug;

use crate::algs::communicator::{Communicator, TOPOLOGY_TAG};
use crate::algs::wire::{WireRank, cast_slice, decode_ranks, encode_ranks, recv_vec};
use crate::coordinator::CoordinatorContext;
use crate::decomp_error::DecompError;
use crate::partitioning::ProcessAdjacencyMap;

/// The calling rank's adjacency in a symmetric process graph: every
/// neighbour is both a source and a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphTopology {
    rank: usize,
    neighbors: Vec<usize>,
}

impl GraphTopology {
    /// Topology of `rank` from its (already local) neighbour list.
    pub fn from_neighbors(rank: usize, mut neighbors: Vec<usize>) -> Self {
        neighbors.sort_unstable();
        neighbors.dedup();
        Self { rank, neighbors }
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// `(in-degree, out-degree, weighted)`. The graph is symmetric and unweighted.
    pub fn neighbors_count(&self) -> (usize, usize, bool) {
        (self.neighbors.len(), self.neighbors.len(), false)
    }

    /// Ranks with an edge into this rank.
    pub fn sources(&self) -> &[usize] {
        &self.neighbors
    }

    /// Ranks this rank has an edge to.
    pub fn destinations(&self) -> &[usize] {
        &self.neighbors
    }

    pub fn is_neighbor(&self, rank: usize) -> bool {
        self.neighbors.binary_search(&rank).is_ok()
    }
}

/// Hand every rank its own entry of the coordinator's adjacency map.
///
/// Collective. The coordinator keeps its own list and sends every other rank
/// its list as a variable-length message; the others probe for the length
/// before receiving. `map` is only read on the coordinator.
pub fn distribute_adjacency<C: Communicator>(
    comm: &C,
    ctx: &CoordinatorContext,
    map: Option<&ProcessAdjacencyMap>,
) -> Result<Vec<usize>, DecompError> {
    ctx.check(comm)?;
    let rank = comm.rank();
    let size = comm.size();

    if ctx.is_coordinator(comm) {
        let outcome = match map {
            Some(map) => match map.iter().flat_map(|(_, n)| n).find(|&&n| n >= size) {
                Some(&bad) => Err(DecompError::InvalidConfig(format!(
                    "adjacency map names rank {bad} in a world of {size} ranks"
                ))),
                None => Ok(map),
            },
            None => Err(DecompError::MissingCoordinatorState {
                rank,
                what: "the process adjacency map",
            }),
        };
        let map = match outcome {
            Ok(map) => {
                ctx.agree(comm, Ok(()))?;
                map
            }
            Err(e) => return ctx.agree(comm, Err(e)).map(|_| Vec::new()),
        };

        for peer in (0..size).filter(|&p| p != rank) {
            let wire = encode_ranks(map.neighbors(peer));
            comm.send(peer, TOPOLOGY_TAG, cast_slice(&wire));
        }
        Ok(map.neighbors(rank).to_vec())
    } else {
        ctx.agree(comm, Ok(()))?;
        let wire: Vec<WireRank> = recv_vec(comm, ctx.root(), TOPOLOGY_TAG)?;
        let neighbors = decode_ranks(&wire);
        if let Some(&bad) = neighbors.iter().find(|&&n| n >= size) {
            return Err(DecompError::Protocol {
                peer: ctx.root(),
                detail: format!("received neighbour rank {bad} in a world of {size} ranks"),
            });
        }
        Ok(neighbors)
    }
}

/// Build the symmetric graph topology of the calling rank.
pub fn build_graph<C: Communicator>(
    comm: &C,
    ctx: &CoordinatorContext,
    map: Option<&ProcessAdjacencyMap>,
) -> Result<GraphTopology, DecompError> {
    let neighbors = distribute_adjacency(comm, ctx, map)?;
    debug!("rank {} graph neighbours {:?}", comm.rank(), neighbors);
    Ok(GraphTopology::from_neighbors(comm.rank(), neighbors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::LocalComm;

    #[test]
    fn topology_reports_symmetric_counts() {
        let t = GraphTopology::from_neighbors(2, vec![3, 0, 3]);
        assert_eq!(t.neighbors_count(), (2, 2, false));
        assert_eq!(t.sources(), &[0, 3]);
        assert_eq!(t.sources(), t.destinations());
        assert!(t.is_neighbor(3));
        assert!(!t.is_neighbor(1));
    }

    #[test]
    fn single_rank_needs_no_messages() {
        let world = LocalComm::world(1);
        let ctx = CoordinatorContext::default();
        let map = ProcessAdjacencyMap::from_lists([(0, vec![])]);
        let t = build_graph(&world[0], &ctx, Some(&map)).unwrap();
        assert_eq!(t.neighbors_count(), (0, 0, false));
    }

    #[test]
    fn missing_map_fails_on_every_rank() {
        let world = LocalComm::world(3);
        let ctx = CoordinatorContext::default();
        let results: Vec<_> = std::thread::scope(|s| {
            let hs: Vec<_> = world
                .iter()
                .map(|comm| s.spawn(move || build_graph(comm, &ctx, None)))
                .collect();
            hs.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(matches!(
            results[0],
            Err(DecompError::MissingCoordinatorState { rank: 0, .. })
        ));
        assert!(matches!(results[1], Err(DecompError::Remote(_))));
        assert!(matches!(results[2], Err(DecompError::Remote(_))));
    }
}
