//! Scalar reductions whose result every rank receives.
//!
//! Small enough to route through the coordinator: each rank sends its value,
//! the coordinator folds them in rank order and sends the result back.

use serde::{Deserialize, Serialize};

use crate::algs::communicator::{Communicator, REDUCE_TAG};
use crate::algs::wire::{cast_slice, recv_vec};
use crate::coordinator::CoordinatorContext;
use crate::decomp_error::DecompError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReduceOp {
    Sum,
    Min,
    Max,
}

impl ReduceOp {
    pub fn combine(self, a: f64, b: f64) -> f64 {
        match self {
            ReduceOp::Sum => a + b,
            ReduceOp::Min => a.min(b),
            ReduceOp::Max => a.max(b),
        }
    }
}

fn recv_scalar<C: Communicator>(comm: &C, peer: usize) -> Result<f64, DecompError> {
    match recv_vec::<f64, _>(comm, peer, REDUCE_TAG)?.as_slice() {
        &[value] => Ok(value),
        other => Err(DecompError::Protocol {
            peer,
            detail: format!("expected one reduction value, got {}", other.len()),
        }),
    }
}

/// Combine `value` from every rank with `op`; every rank gets the result.
///
/// Collective.
pub fn reduce_all<C: Communicator>(
    comm: &C,
    ctx: &CoordinatorContext,
    value: f64,
    op: ReduceOp,
) -> Result<f64, DecompError> {
    ctx.check(comm)?;
    let root = ctx.root();

    if !ctx.is_coordinator(comm) {
        comm.send(root, REDUCE_TAG, cast_slice(&[value]));
        return recv_scalar(comm, root);
    }

    let mut acc: Option<f64> = None;
    let mut failure = None;
    for rank in 0..comm.size() {
        let v = if rank == root {
            value
        } else {
            match recv_scalar(comm, rank) {
                Ok(v) => v,
                Err(e) => {
                    failure.get_or_insert(e);
                    continue;
                }
            }
        };
        acc = Some(acc.map_or(v, |a| op.combine(a, v)));
    }

    // non-coordinators always block on the answer, so send one even on failure
    let result = acc.unwrap_or(value);
    for peer in (0..comm.size()).filter(|&p| p != root) {
        comm.send(peer, REDUCE_TAG, cast_slice(&[result]));
    }
    match failure {
        Some(e) => Err(e),
        None => Ok(result),
    }
}
