//! Greedy graph-growing backend.
//!
//! Parts are grown one after another by breadth-first search from the
//! lowest-numbered unassigned vertex, so each part stays connected where the
//! graph allows it. A part stops growing once adding the next vertex would
//! take it further from its target than stopping short. Targets are
//! recomputed from the weight still unassigned, which keeps the error from
//! piling up in the last part.
//!
//! Needs no external library; used when METIS is not compiled in and as a
//! deterministic reference in tests.

use std::collections::VecDeque;

use super::{BalancePartitioner, VertexWeights};
use crate::algs::adjacency_graph::CsrGraph;
use crate::partitioning::error::PartitionError;

const UNASSIGNED: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
pub struct GreedyPartitioner {
    tolerance: f64,
}

impl GreedyPartitioner {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl Default for GreedyPartitioner {
    fn default() -> Self {
        Self::new(0.03)
    }
}

impl BalancePartitioner for GreedyPartitioner {
    fn balance_partition(
        &self,
        graph: &CsrGraph,
        weights: &VertexWeights,
        num_parts: usize,
    ) -> Result<Vec<usize>, PartitionError> {
        let n = graph.num_vertices();
        let w = weights.as_slice();
        let mut part = vec![UNASSIGNED; n];
        let mut queued = vec![false; n];
        let mut remaining: u64 = weights.total();
        let mut next_seed = 0usize;

        for p in 0..num_parts {
            if p + 1 == num_parts {
                for owner in part.iter_mut().filter(|o| **o == UNASSIGNED) {
                    *owner = p;
                }
                break;
            }

            let target = remaining as f64 / (num_parts - p) as f64;
            let mut acc = 0u64;
            let mut frontier = VecDeque::new();

            loop {
                let v = match frontier.pop_front() {
                    Some(v) => v,
                    None => {
                        while next_seed < n && part[next_seed] != UNASSIGNED {
                            next_seed += 1;
                        }
                        if next_seed == n {
                            break;
                        }
                        queued[next_seed] = true;
                        next_seed
                    }
                };

                let after = (acc + w[v]) as f64;
                if acc > 0 && after > target && after - target > target - acc as f64 {
                    // leave v for the next part
                    queued[v] = false;
                    break;
                }

                part[v] = p;
                acc += w[v];
                for &u in graph.neighbors(v) {
                    if part[u] == UNASSIGNED && !queued[u] {
                        queued[u] = true;
                        frontier.push_back(u);
                    }
                }
                if acc as f64 >= target {
                    break;
                }
            }

            // unclaimed frontier vertices go back to the pool
            for v in frontier {
                queued[v] = false;
            }
            remaining -= acc;
        }

        Ok(part)
    }

    fn tolerance(&self) -> f64 {
        self.tolerance
    }
}
