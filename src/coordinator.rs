//! The coordinator role.
//!
//! Global state (grid, partition vector, adjacency graph) lives on one rank
//! only. Instead of scattering `rank == 0` checks through the code, every
//! collective step takes a [`CoordinatorContext`] naming that rank.

use crate::algs::communicator::{Communicator, STATUS_TAG};
use crate::algs::wire::recv_vec;
use crate::decomp_error::DecompError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorContext {
    root: usize,
}

impl CoordinatorContext {
    pub fn new(root: usize) -> Self {
        Self { root }
    }

    /// Rank holding the global state.
    #[inline]
    pub fn root(&self) -> usize {
        self.root
    }

    #[inline]
    pub fn is_coordinator<C: Communicator>(&self, comm: &C) -> bool {
        comm.rank() == self.root
    }

    /// Fail if the coordinator rank is not part of `comm`.
    pub fn check<C: Communicator>(&self, comm: &C) -> Result<(), DecompError> {
        if self.root >= comm.size() {
            return Err(DecompError::InvalidConfig(format!(
                "coordinator rank {} is outside a world of {} ranks",
                self.root,
                comm.size()
            )));
        }
        Ok(())
    }

    /// Make a coordinator-side outcome visible to every rank.
    ///
    /// Collective: every rank must call it. The coordinator passes its real
    /// outcome and sends every other rank a status message (empty on
    /// success, the error text otherwise). Other ranks ignore their own
    /// `outcome` argument and return what the coordinator reported.
    pub fn agree<C: Communicator>(
        &self,
        comm: &C,
        outcome: Result<(), DecompError>,
    ) -> Result<(), DecompError> {
        if self.is_coordinator(comm) {
            let notice = match &outcome {
                Ok(()) => String::new(),
                Err(e) => e.to_string(),
            };
            for peer in (0..comm.size()).filter(|&p| p != self.root) {
                comm.send(peer, STATUS_TAG, notice.as_bytes());
            }
            outcome
        } else {
            let notice: Vec<u8> = recv_vec(comm, self.root, STATUS_TAG)?;
            if notice.is_empty() {
                Ok(())
            } else {
                Err(DecompError::Remote(
                    String::from_utf8_lossy(&notice).into_owned(),
                ))
            }
        }
    }

    /// Run `f` on the coordinator only and [`agree`](Self::agree) on its outcome.
    ///
    /// Collective. The coordinator gets `Some(value)`, other ranks `None`;
    /// a failure of `f` is returned on every rank.
    pub fn compute<C, T, F>(&self, comm: &C, f: F) -> Result<Option<T>, DecompError>
    where
        C: Communicator,
        F: FnOnce() -> Result<T, DecompError>,
    {
        if self.is_coordinator(comm) {
            match f() {
                Ok(value) => self.agree(comm, Ok(())).map(|_| Some(value)),
                Err(e) => self.agree(comm, Err(e)).map(|_| None),
            }
        } else {
            self.agree(comm, Ok(())).map(|_| None)
        }
    }
}

impl Default for CoordinatorContext {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::LocalComm;

    #[test]
    fn success_is_seen_by_every_rank() {
        let world = LocalComm::world(3);
        let ctx = CoordinatorContext::default();
        std::thread::scope(|s| {
            let handles: Vec<_> = world
                .iter()
                .map(|comm| s.spawn(move || ctx.agree(comm, Ok(()))))
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), Ok(()));
            }
        });
    }

    #[test]
    fn coordinator_failure_is_seen_by_every_rank() {
        let world = LocalComm::world(4);
        let ctx = CoordinatorContext::new(2);
        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = world
                .iter()
                .map(|comm| {
                    s.spawn(move || {
                        let local = if ctx.is_coordinator(comm) {
                            Err(DecompError::ProcessCountMismatch {
                                expected: 6,
                                actual: 4,
                            })
                        } else {
                            Ok(())
                        };
                        ctx.agree(comm, local)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(matches!(
            results[2],
            Err(DecompError::ProcessCountMismatch { .. })
        ));
        for (rank, r) in results.iter().enumerate().filter(|(r, _)| *r != 2) {
            match r {
                Err(DecompError::Remote(msg)) => assert!(msg.contains("6 vs. 4"), "rank {rank}: {msg}"),
                other => panic!("rank {rank} got {other:?}"),
            }
        }
    }

    #[test]
    fn compute_runs_only_on_the_coordinator() {
        let world = LocalComm::world(3);
        let ctx = CoordinatorContext::new(1);
        let results: Vec<_> = std::thread::scope(|s| {
            let hs: Vec<_> = world
                .iter()
                .map(|comm| s.spawn(move || ctx.compute(comm, || Ok(comm.rank() * 10))))
                .collect();
            hs.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(results, vec![Ok(None), Ok(Some(10)), Ok(None)]);
    }

    #[test]
    fn root_outside_world_is_rejected() {
        let world = LocalComm::world(2);
        assert!(CoordinatorContext::new(2).check(&world[0]).is_err());
        assert!(CoordinatorContext::new(1).check(&world[0]).is_ok());
    }
}
