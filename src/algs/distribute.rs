//! Scatter the coordinator's global field to the owning ranks, and gather
//! it back.
//!
//! # Protocol (scatter)
//! 1. The coordinator validates its inputs and [`agree`]s on the outcome.
//! 2. Barrier: the coordinator's buffers are assembled before anyone waits.
//! 3. The coordinator posts one non-blocking send per rank (itself
//!    included) with that rank's values in global cell order.
//! 4. Every rank probes for its message, sizes its buffer from the probe,
//!    and receives. A rank owning zero cells receives a zero-length message.
//! 5. The coordinator waits for all its sends.
//! 6. Trailing barrier.
//!
//! [`agree`]: crate::coordinator::CoordinatorContext::agree

use log::debug;

use crate::algs::communicator::{Communicator, FIELD_TAG, GATHER_TAG};
use crate::algs::wire::{cast_slice, recv_vec};
use crate::coordinator::CoordinatorContext;
use crate::decomp_error::DecompError;
use crate::partitioning::PartitionVector;

/// Split `values` into one buffer per part, keeping global cell order.
pub fn split_by_owner(values: &[f64], partition: &PartitionVector) -> Vec<Vec<f64>> {
    let counts = partition.counts();
    let mut buffers: Vec<Vec<f64>> = counts.iter().map(|&n| Vec::with_capacity(n)).collect();
    for (&value, &owner) in values.iter().zip(partition.as_slice()) {
        buffers[owner].push(value);
    }
    buffers
}

fn check_partition<C: Communicator>(
    comm: &C,
    values: usize,
    partition: &PartitionVector,
) -> Result<(), DecompError> {
    if partition.len() != values {
        return Err(DecompError::PartitionLength {
            partition: partition.len(),
            field: values,
        });
    }
    if partition.num_parts() != comm.size() {
        return Err(DecompError::ProcessCountMismatch {
            expected: partition.num_parts(),
            actual: comm.size(),
        });
    }
    Ok(())
}

/// Deliver every rank the values of the cells it owns.
///
/// Collective. `global` is `(field, partition)` and is only read on the
/// coordinator; other ranks pass `None`. The returned values are in global
/// cell order.
pub fn distribute<C: Communicator>(
    comm: &C,
    ctx: &CoordinatorContext,
    global: Option<(&[f64], &PartitionVector)>,
) -> Result<Vec<f64>, DecompError> {
    ctx.check(comm)?;

    let buffers = if ctx.is_coordinator(comm) {
        let split = match global {
            Some((values, partition)) => {
                check_partition(comm, values.len(), partition).map(|_| split_by_owner(values, partition))
            }
            None => Err(DecompError::MissingCoordinatorState {
                rank: comm.rank(),
                what: "the global field and partition vector",
            }),
        };
        match split {
            Ok(buffers) => {
                ctx.agree(comm, Ok(()))?;
                Some(buffers)
            }
            Err(e) => return ctx.agree(comm, Err(e)).map(|_| Vec::new()),
        }
    } else {
        ctx.agree(comm, Ok(()))?;
        None
    };

    comm.barrier();

    let local = match &buffers {
        Some(buffers) => {
            let outgoing: Vec<(usize, &[u8])> = buffers
                .iter()
                .enumerate()
                .map(|(rank, buf)| (rank, cast_slice(buf)))
                .collect();
            comm.isend_scoped(FIELD_TAG, &outgoing, || {
                recv_vec::<f64, _>(comm, ctx.root(), FIELD_TAG)
            })
        }
        None => recv_vec::<f64, _>(comm, ctx.root(), FIELD_TAG),
    };

    comm.barrier();

    let local = local?;
    debug!("rank {} received {} cells", comm.rank(), local.len());
    Ok(local)
}

/// Rebuild the global field on the coordinator from every rank's local
/// values. Inverse of [`distribute`].
///
/// Collective. `partition` is only read on the coordinator, which returns
/// `Some(field)`; every other rank returns `None`.
pub fn gather<C: Communicator>(
    comm: &C,
    ctx: &CoordinatorContext,
    local: &[f64],
    partition: Option<&PartitionVector>,
) -> Result<Option<Vec<f64>>, DecompError> {
    ctx.check(comm)?;

    if !ctx.is_coordinator(comm) {
        comm.send(ctx.root(), GATHER_TAG, cast_slice(local));
        ctx.agree(comm, Ok(()))?;
        return Ok(None);
    }

    // drain every message first so no sender is left waiting on a failure path
    let mut parts: Vec<Vec<f64>> = Vec::with_capacity(comm.size());
    let mut received = Ok(());
    for rank in 0..comm.size() {
        if rank == ctx.root() {
            parts.push(local.to_vec());
            continue;
        }
        match recv_vec::<f64, _>(comm, rank, GATHER_TAG) {
            Ok(values) => parts.push(values),
            Err(e) => {
                parts.push(Vec::new());
                if received.is_ok() {
                    received = Err(e);
                }
            }
        }
    }

    let outcome = received.and_then(|()| {
        let partition = partition.ok_or(DecompError::MissingCoordinatorState {
            rank: comm.rank(),
            what: "the partition vector",
        })?;
        check_partition(comm, partition.len(), partition)?;
        assemble(&parts, partition)
    });

    match outcome {
        Ok(field) => {
            ctx.agree(comm, Ok(()))?;
            Ok(Some(field))
        }
        Err(e) => ctx.agree(comm, Err(e)).map(|_| None),
    }
}

fn assemble(parts: &[Vec<f64>], partition: &PartitionVector) -> Result<Vec<f64>, DecompError> {
    let counts = partition.counts();
    for (rank, (part, &expected)) in parts.iter().zip(&counts).enumerate() {
        if part.len() != expected {
            return Err(DecompError::Protocol {
                peer: rank,
                detail: format!("sent {} values but owns {expected} cells", part.len()),
            });
        }
    }
    let mut cursors = vec![0usize; parts.len()];
    Ok(partition
        .as_slice()
        .iter()
        .map(|&owner| {
            let value = parts[owner][cursors[owner]];
            cursors[owner] += 1;
            value
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::LocalComm;

    #[test]
    fn split_keeps_global_order() {
        let pv = PartitionVector::new(vec![1, 0, 1, 2, 0], 3).unwrap();
        let split = split_by_owner(&[0.0, 1.0, 2.0, 3.0, 4.0], &pv);
        assert_eq!(split, vec![vec![1.0, 4.0], vec![0.0, 2.0], vec![3.0]]);
    }

    #[test]
    fn single_rank_scatter_is_identity() {
        let world = LocalComm::world(1);
        let ctx = CoordinatorContext::default();
        let values = [0.5, 1.5, 2.5];
        let pv = PartitionVector::single(3);
        let local = distribute(&world[0], &ctx, Some((&values, &pv))).unwrap();
        assert_eq!(local, values);
        let back = gather(&world[0], &ctx, &local, Some(&pv)).unwrap();
        assert_eq!(back.as_deref(), Some(&values[..]));
    }

    #[test]
    fn scatter_then_gather_restores_field_with_empty_rank() {
        let world = LocalComm::world(3);
        let ctx = CoordinatorContext::default();
        // rank 1 owns nothing
        let pv = PartitionVector::new(vec![2, 0, 0, 2, 2, 0, 2], 3).unwrap();
        let values: Vec<f64> = (0..7).map(|i| i as f64 * 0.25).collect();

        let results: Vec<_> = std::thread::scope(|s| {
            let hs: Vec<_> = world
                .iter()
                .map(|comm| {
                    let (values, pv) = (&values, &pv);
                    s.spawn(move || {
                        let global = ctx.is_coordinator(comm).then(|| (values.as_slice(), pv));
                        let local = distribute(comm, &ctx, global).unwrap();
                        let back = gather(comm, &ctx, &local, Some(pv)).unwrap();
                        (local, back)
                    })
                })
                .collect();
            hs.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results[0].0, vec![0.25, 0.5, 1.25]);
        assert!(results[1].0.is_empty());
        assert_eq!(results[2].0, vec![0.0, 0.75, 1.0, 1.5]);
        assert_eq!(results[0].1.as_deref(), Some(values.as_slice()));
        assert_eq!(results[1].1, None);
    }

    #[test]
    fn short_partition_fails_on_every_rank() {
        let world = LocalComm::world(2);
        let ctx = CoordinatorContext::default();
        let pv = PartitionVector::new(vec![0, 1], 2).unwrap();
        let values = [1.0, 2.0, 3.0];
        let results: Vec<_> = std::thread::scope(|s| {
            let hs: Vec<_> = world
                .iter()
                .map(|comm| {
                    let (values, pv) = (&values, &pv);
                    s.spawn(move || {
                        let global = ctx.is_coordinator(comm).then(|| (&values[..], pv));
                        distribute(comm, &ctx, global)
                    })
                })
                .collect();
            hs.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(
            results[0],
            Err(DecompError::PartitionLength { partition: 2, field: 3 })
        );
        assert!(matches!(results[1], Err(DecompError::Remote(_))));
    }
}
