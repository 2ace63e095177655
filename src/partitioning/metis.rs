//! METIS multilevel k-way backend.

use log::debug;

use super::{BalancePartitioner, PartitionerConfig, VertexWeights};
use crate::algs::adjacency_graph::CsrGraph;
use crate::partitioning::error::PartitionError;

/// Partition with `METIS_PartGraphKway`: one balancing constraint (the
/// vertex weights), default edge weights, equal target part weights.
#[derive(Debug, Clone)]
pub struct MetisPartitioner {
    config: PartitionerConfig,
}

impl MetisPartitioner {
    pub fn new(config: PartitionerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PartitionerConfig {
        &self.config
    }
}

impl Default for MetisPartitioner {
    fn default() -> Self {
        Self::new(PartitionerConfig::default())
    }
}

fn to_idx(value: usize, what: &str) -> Result<metis::Idx, PartitionError> {
    metis::Idx::try_from(value)
        .map_err(|_| PartitionError::InvalidGraph(format!("{what} {value} exceeds the METIS index range")))
}

/// METIS sums vertex weights in its index type. Scale weights down
/// proportionally (never below 1) when the total would overflow it.
fn metis_weights(weights: &VertexWeights) -> Vec<metis::Idx> {
    let limit = metis::Idx::MAX as u64 / 2;
    let total = weights.total();
    if total <= limit {
        return weights.as_slice().iter().map(|&w| w as metis::Idx).collect();
    }
    let scale = limit as f64 / total as f64;
    debug!("scaling vertex weights by {scale:e} to fit the METIS index type");
    weights
        .as_slice()
        .iter()
        .map(|&w| ((w as f64 * scale) as metis::Idx).max(1))
        .collect()
}

impl BalancePartitioner for MetisPartitioner {
    fn balance_partition(
        &self,
        graph: &CsrGraph,
        weights: &VertexWeights,
        num_parts: usize,
    ) -> Result<Vec<usize>, PartitionError> {
        let n = graph.num_vertices();
        let xadj = graph
            .offsets
            .iter()
            .map(|&o| to_idx(o, "offset"))
            .collect::<Result<Vec<_>, _>>()?;
        let adjncy = graph
            .targets
            .iter()
            .map(|&t| to_idx(t, "vertex"))
            .collect::<Result<Vec<_>, _>>()?;
        let vwgt = metis_weights(weights);
        let nparts = to_idx(num_parts, "part count")?;
        let mut part = vec![0 as metis::Idx; n];

        let mut mgraph = metis::Graph::new(1, nparts, &xadj, &adjncy)
            .map_err(|e| PartitionError::InvalidGraph(format!("{e:?}")))?
            .set_vwgt(&vwgt)
            .set_option(metis::option::UFactor(self.config.ufactor))
            .set_option(metis::option::NCuts(self.config.ncuts));
        if let Some(seed) = self.config.seed {
            mgraph = mgraph.set_option(metis::option::Seed(seed));
        }

        let edge_cut = mgraph
            .part_kway(&mut part)
            .map_err(|e| PartitionError::Backend(format!("{e:?}")))?;
        debug!("METIS k-way into {num_parts} parts, edge cut {edge_cut}");

        part.into_iter()
            .enumerate()
            .map(|(v, p)| {
                usize::try_from(p)
                    .ok()
                    .filter(|&p| p < num_parts)
                    .ok_or(PartitionError::PartOutOfRange {
                        cell: v,
                        part: p.max(0) as usize,
                        num_parts,
                    })
            })
            .collect()
    }

    fn tolerance(&self) -> f64 {
        self.config.tolerance()
    }
}
