//! Weighted graph partitioning of grid cells across ranks.
//!
//! [`GraphPartitioner`] drives a pluggable [`BalancePartitioner`] (METIS
//! k-way, or the native greedy grower) and derives the
//! [`ProcessAdjacencyMap`] from the result. Everything here runs on the
//! coordinator; nothing communicates.

pub mod error;
pub mod greedy;
#[cfg(feature = "metis-support")]
pub mod metis;
pub mod metrics;

use std::collections::BTreeMap;

use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::algs::adjacency_graph::{CsrGraph, GraphKind};
use crate::partitioning::error::PartitionError;

pub use self::greedy::GreedyPartitioner;
#[cfg(feature = "metis-support")]
pub use self::metis::MetisPartitioner;
pub use self::metrics::{edge_cut, imbalance, part_weights};

/// Owner rank of every global cell, in cell-id order.
///
/// Built once by the coordinator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionVector {
    owners: Vec<usize>,
    num_parts: usize,
}

impl PartitionVector {
    /// Wrap `owners`, checking every entry lies in `0..num_parts`.
    pub fn new(owners: Vec<usize>, num_parts: usize) -> Result<Self, PartitionError> {
        if num_parts == 0 {
            return Err(PartitionError::NoParts);
        }
        if let Some((cell, &part)) = owners.iter().find_position(|&&p| p >= num_parts) {
            return Err(PartitionError::PartOutOfRange {
                cell,
                part,
                num_parts,
            });
        }
        Ok(Self { owners, num_parts })
    }

    /// Every cell owned by part 0.
    pub fn single(num_cells: usize) -> Self {
        Self {
            owners: vec![0; num_cells],
            num_parts: 1,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    #[inline]
    pub fn num_parts(&self) -> usize {
        self.num_parts
    }

    #[inline]
    pub fn owner(&self, cell: usize) -> usize {
        self.owners[cell]
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.owners
    }

    /// Number of cells owned by each part.
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_parts];
        for &p in &self.owners {
            counts[p] += 1;
        }
        counts
    }

    /// Cells owned by `part`, in increasing id order.
    pub fn cells_of(&self, part: usize) -> impl Iterator<Item = usize> + '_ {
        self.owners
            .iter()
            .enumerate()
            .filter(move |&(_, &p)| p == part)
            .map(|(cell, _)| cell)
    }
}

/// One positive compute-cost estimate per vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexWeights(Vec<u64>);

impl VertexWeights {
    pub fn new(weights: Vec<u64>) -> Result<Self, PartitionError> {
        if let Some(v) = weights.iter().position(|&w| w == 0) {
            return Err(PartitionError::NonPositiveWeight(v));
        }
        Ok(Self(weights))
    }

    /// Every vertex weighs 1.
    pub fn uniform(n: usize) -> Self {
        Self(vec![1; n])
    }

    /// Integer weights from real-valued loads: truncated, never below 1.
    pub fn from_loads(loads: &[f64]) -> Self {
        Self(
            loads
                .iter()
                .map(|&l| if l.is_finite() && l >= 1.0 { l as u64 } else { 1 })
                .collect(),
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

/// Rank -> sorted, deduplicated neighbouring ranks.
///
/// Ranks without any cross-partition edge have an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessAdjacencyMap {
    map: BTreeMap<usize, Vec<usize>>,
}

impl ProcessAdjacencyMap {
    /// Scan every edge of `graph`; each edge whose endpoints live in
    /// different parts makes the two parts neighbours of each other.
    pub fn from_partition(graph: &CsrGraph, partition: &PartitionVector) -> Self {
        let mut map: BTreeMap<usize, Vec<usize>> =
            (0..partition.num_parts()).map(|p| (p, Vec::new())).collect();
        for (v, u) in graph.edges() {
            let (pv, pu) = (partition.owner(v), partition.owner(u));
            if pv != pu {
                map.entry(pv).or_default().push(pu);
                map.entry(pu).or_default().push(pv);
            }
        }
        for nbrs in map.values_mut() {
            nbrs.sort_unstable();
            nbrs.dedup();
        }
        Self { map }
    }

    /// Build from explicit lists (sorted and deduplicated here).
    pub fn from_lists(lists: impl IntoIterator<Item = (usize, Vec<usize>)>) -> Self {
        let map = lists
            .into_iter()
            .map(|(rank, nbrs)| (rank, nbrs.into_iter().sorted_unstable().dedup().collect()))
            .collect();
        Self { map }
    }

    /// Neighbours of `rank`.
    pub fn neighbors(&self, rank: usize) -> &[usize] {
        self.map.get(&rank).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.map.iter().map(|(&r, n)| (r, n.as_slice()))
    }

    /// True when every relation `(a, b)` is matched by `(b, a)`.
    pub fn is_symmetric(&self) -> bool {
        self.iter()
            .all(|(a, nbrs)| nbrs.iter().all(|&b| self.neighbors(b).binary_search(&a).is_ok()))
    }
}

/// Which balancing backend a [`GraphPartitioner`] is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionBackend {
    Metis,
    Greedy,
}

impl Default for PartitionBackend {
    fn default() -> Self {
        if cfg!(feature = "metis-support") {
            PartitionBackend::Metis
        } else {
            PartitionBackend::Greedy
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionerConfig {
    /// Allowed imbalance in thousandths: max part weight may reach
    /// `(1 + ufactor / 1000) * total / parts`.
    pub ufactor: i32,
    /// Seed for randomized backends.
    pub seed: Option<i32>,
    /// Number of independent partitionings METIS computes, keeping the best.
    pub ncuts: i32,
    pub backend: PartitionBackend,
}

impl PartitionerConfig {
    /// Imbalance tolerance as a fraction.
    pub fn tolerance(&self) -> f64 {
        f64::from(self.ufactor) / 1000.0
    }
}

impl Default for PartitionerConfig {
    fn default() -> Self {
        Self {
            ufactor: 30,
            seed: None,
            ncuts: 1,
            backend: PartitionBackend::default(),
        }
    }
}

/// A weighted graph partitioning algorithm.
pub trait BalancePartitioner {
    /// Split the vertices of `graph` (adjacency-list flavour, no self loops)
    /// into `num_parts` parts of near-equal total weight with a small edge cut.
    /// Returns one part id per vertex.
    fn balance_partition(
        &self,
        graph: &CsrGraph,
        weights: &VertexWeights,
        num_parts: usize,
    ) -> Result<Vec<usize>, PartitionError>;

    /// Imbalance tolerance the backend works to.
    fn tolerance(&self) -> f64;
}

/// Partition a grid graph and derive the rank adjacency from the result.
#[derive(Debug, Clone)]
pub struct GraphPartitioner<P> {
    backend: P,
}

impl<P: BalancePartitioner> GraphPartitioner<P> {
    pub fn new(backend: P) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &P {
        &self.backend
    }

    /// Returns the partition vector and the process adjacency map.
    ///
    /// A single part skips the backend entirely. Backend failures are
    /// returned as-is; no partial partition is ever produced.
    pub fn partition(
        &self,
        graph: &CsrGraph,
        weights: &VertexWeights,
        num_parts: usize,
    ) -> Result<(PartitionVector, ProcessAdjacencyMap), PartitionError> {
        let n = graph.num_vertices();
        if weights.len() != n {
            return Err(PartitionError::WeightCount {
                expected: n,
                actual: weights.len(),
            });
        }
        if num_parts == 0 {
            return Err(PartitionError::NoParts);
        }
        validate_graph(graph)?;

        if num_parts == 1 {
            info!("Serial execution, every cell goes to part 0");
            let partition = PartitionVector::single(n);
            let adjacency = ProcessAdjacencyMap::from_partition(graph, &partition);
            return Ok((partition, adjacency));
        }

        let list;
        let graph = match graph.kind {
            GraphKind::AdjacencyList => graph,
            GraphKind::AdjacencyMatrix => {
                list = graph.to_adjacency_list();
                &list
            }
        };

        let owners = self.backend.balance_partition(graph, weights, num_parts)?;
        if owners.len() != n {
            return Err(PartitionError::Backend(format!(
                "backend returned {} parts for {n} vertices",
                owners.len()
            )));
        }
        let partition = PartitionVector::new(owners, num_parts)?;
        let adjacency = ProcessAdjacencyMap::from_partition(graph, &partition);

        info!("The graph has been successfully partitioned into {num_parts} parts");
        debug!(
            "edge cut {}, imbalance {:.4}",
            edge_cut(graph, &partition),
            imbalance(weights, &partition)
        );
        if let Some(ratio) = self.exceeds_tolerance(weights, &partition) {
            warn!(
                "partition imbalance {ratio:.4} exceeds the tolerance {:.4}; heavy cells cannot be split",
                self.backend.tolerance()
            );
        }
        Ok((partition, adjacency))
    }

    /// The imbalance of `partition` if it is above `1 + tolerance` of the backend.
    pub fn exceeds_tolerance(
        &self,
        weights: &VertexWeights,
        partition: &PartitionVector,
    ) -> Option<f64> {
        let ratio = imbalance(weights, partition);
        (ratio > 1.0 + self.backend.tolerance()).then_some(ratio)
    }
}

/// Partition with the backend `config` selects.
pub fn partition_with(
    config: &PartitionerConfig,
    graph: &CsrGraph,
    weights: &VertexWeights,
    num_parts: usize,
) -> Result<(PartitionVector, ProcessAdjacencyMap), PartitionError> {
    match config.backend {
        #[cfg(feature = "metis-support")]
        PartitionBackend::Metis => {
            GraphPartitioner::new(MetisPartitioner::new(config.clone())).partition(graph, weights, num_parts)
        }
        #[cfg(not(feature = "metis-support"))]
        PartitionBackend::Metis => Err(PartitionError::Backend(
            "built without METIS support, use the greedy backend".into(),
        )),
        PartitionBackend::Greedy => GraphPartitioner::new(GreedyPartitioner::new(config.tolerance()))
            .partition(graph, weights, num_parts),
    }
}

/// Structural checks every backend relies on.
fn validate_graph(graph: &CsrGraph) -> Result<(), PartitionError> {
    let offsets = &graph.offsets;
    if offsets.first() != Some(&0) {
        return Err(PartitionError::InvalidGraph("offsets must start at 0".into()));
    }
    if offsets.windows(2).any(|w| w[0] > w[1]) {
        return Err(PartitionError::InvalidGraph("offsets must be non-decreasing".into()));
    }
    if offsets.last() != Some(&graph.targets.len()) {
        return Err(PartitionError::InvalidGraph(
            "last offset must equal the number of targets".into(),
        ));
    }
    let n = graph.num_vertices();
    if let Some(&t) = graph.targets.iter().find(|&&t| t >= n) {
        return Err(PartitionError::InvalidGraph(format!(
            "target {t} is not a vertex of a {n}-vertex graph"
        )));
    }
    Ok(())
}
