//! Thin façade over intra-process (threads) or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices*. The surface is exactly what the
//! decomposition protocols need:
//!
//! * blocking [`send`](Communicator::send) for small point-to-point messages,
//! * [`isend_scoped`](Communicator::isend_scoped), which posts non-blocking
//!   sends, runs a body and waits for every send before it returns,
//! * [`probe`](Communicator::probe), which *matches* the next message from a
//!   `(peer, tag)` pair so its length is known before a buffer is allocated,
//! * [`barrier`](Communicator::barrier) and [`abort`](Communicator::abort).
//!
//! Receiving a message of unknown length is therefore always the two-phase
//! sequence `let m = comm.probe(peer, tag); buf.resize(m.len()); m.receive_into(&mut buf)`,
//! and nothing else can be received in between (see [`crate::algs::wire`]).

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Barrier};

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};

use crate::decomp_error::DecompError;

/// Typed message tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommTag(pub u16);

impl CommTag {
    pub const fn new(tag: u16) -> Self {
        Self(tag)
    }
    pub const fn as_u16(self) -> u16 {
        self.0
    }
    pub const fn as_i32(self) -> i32 {
        self.0 as i32
    }
}

/// Field values moving from the coordinator to their owners.
pub const FIELD_TAG: CommTag = CommTag::new(9999);
/// Per-rank neighbor lists of a graph topology.
pub const TOPOLOGY_TAG: CommTag = CommTag::new(159);
/// Coordinator success/failure notices.
pub const STATUS_TAG: CommTag = CommTag::new(160);
/// Local fields travelling back to the coordinator.
pub const GATHER_TAG: CommTag = CommTag::new(10000);
/// Scalar reductions.
pub const REDUCE_TAG: CommTag = CommTag::new(161);

/// A matched, not yet received message.
pub trait Incoming {
    /// Length of the message in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive the message into `buf`, which must be exactly [`len`](Incoming::len) bytes.
    ///
    /// The message is consumed even when this returns an error.
    fn receive_into(self, buf: &mut [u8]) -> Result<(), DecompError>;

    /// Receive and drop the message.
    fn discard(self)
    where
        Self: Sized,
    {
        let mut scratch = vec![0u8; self.len()];
        // sized from len(), cannot mismatch
        let _ = self.receive_into(&mut scratch);
    }
}

/// Message-passing interface shared by every backend.
pub trait Communicator {
    /// Handle returned by [`probe`](Communicator::probe).
    type Incoming: Incoming;

    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Block until every rank has entered the barrier.
    fn barrier(&self);

    /// Blocking send of `buf` to `peer`.
    fn send(&self, peer: usize, tag: CommTag, buf: &[u8]);

    /// Post a non-blocking send for every `(peer, buffer)` pair, run `body`,
    /// then wait for all posted sends. The buffers stay borrowed for the
    /// whole call, so they cannot be released while a send is in flight.
    fn isend_scoped<R>(
        &self,
        tag: CommTag,
        outgoing: &[(usize, &[u8])],
        body: impl FnOnce() -> R,
    ) -> R;

    /// Block until a message from `peer` with `tag` is available and match it.
    fn probe(&self, peer: usize, tag: CommTag) -> Self::Incoming;

    /// Tear down every rank. Never returns.
    fn abort(&self, code: i32) -> !;
}

// --- LocalComm: intra-process / one thread per rank ---

type Key = (usize, usize, u16); // (src, dst, tag)

struct Shared {
    size: usize,
    mailbox: Mutex<HashMap<Key, VecDeque<Bytes>>>,
    arrived: Condvar,
    barrier: Barrier,
}

/// In-process communicator: every rank is a `LocalComm` value, usually moved
/// into its own thread. Messages between a pair of ranks with the same tag
/// are delivered in FIFO order.
#[derive(Clone)]
pub struct LocalComm {
    rank: usize,
    shared: Arc<Shared>,
}

impl LocalComm {
    /// One communicator per rank of a world of `size` ranks.
    pub fn world(size: usize) -> Vec<LocalComm> {
        assert!(size > 0, "a world needs at least one rank");
        let shared = Arc::new(Shared {
            size,
            mailbox: Mutex::new(HashMap::new()),
            arrived: Condvar::new(),
            barrier: Barrier::new(size),
        });
        (0..size)
            .map(|rank| LocalComm {
                rank,
                shared: shared.clone(),
            })
            .collect()
    }

    fn post(&self, peer: usize, tag: CommTag, buf: &[u8]) {
        assert!(peer < self.shared.size, "rank {peer} is outside the world");
        let key = (self.rank, peer, tag.as_u16());
        let mut mailbox = self.shared.mailbox.lock();
        mailbox
            .entry(key)
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
        self.shared.arrived.notify_all();
    }
}

impl std::fmt::Debug for LocalComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalComm")
            .field("rank", &self.rank)
            .field("size", &self.shared.size)
            .finish()
    }
}

/// Message already taken out of the mailbox by [`LocalComm::probe`].
#[derive(Debug)]
pub struct LocalIncoming {
    peer: usize,
    data: Bytes,
}

impl Incoming for LocalIncoming {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn receive_into(self, buf: &mut [u8]) -> Result<(), DecompError> {
        if buf.len() != self.data.len() {
            return Err(DecompError::Protocol {
                peer: self.peer,
                detail: format!(
                    "receive buffer holds {} bytes, message has {}",
                    buf.len(),
                    self.data.len()
                ),
            });
        }
        buf.copy_from_slice(&self.data);
        Ok(())
    }
}

impl Communicator for LocalComm {
    type Incoming = LocalIncoming;

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn barrier(&self) {
        self.shared.barrier.wait();
    }

    fn send(&self, peer: usize, tag: CommTag, buf: &[u8]) {
        self.post(peer, tag, buf);
    }

    fn isend_scoped<R>(
        &self,
        tag: CommTag,
        outgoing: &[(usize, &[u8])],
        body: impl FnOnce() -> R,
    ) -> R {
        // the mailbox copies, so every send is complete once posted
        for &(peer, buf) in outgoing {
            self.post(peer, tag, buf);
        }
        body()
    }

    fn probe(&self, peer: usize, tag: CommTag) -> LocalIncoming {
        let key = (peer, self.rank, tag.as_u16());
        let mut mailbox = self.shared.mailbox.lock();
        loop {
            if let Some(data) = mailbox.get_mut(&key).and_then(VecDeque::pop_front) {
                return LocalIncoming { peer, data };
            }
            self.shared.arrived.wait(&mut mailbox);
        }
    }

    fn abort(&self, code: i32) -> ! {
        panic!("rank {} aborted the run with code {code}", self.rank)
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{CommTag, Communicator, Incoming};
    use crate::decomp_error::DecompError;
    use mpi::Rank;
    use mpi::environment::Universe;
    use mpi::point_to_point::Message;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    /// World communicator of an initialized MPI environment. Dropping it
    /// finalizes MPI.
    pub struct MpiComm {
        world: SimpleCommunicator,
        rank: usize,
        size: usize,
        _universe: Universe,
    }

    impl MpiComm {
        /// Initialize MPI. Returns `None` if it was already initialized.
        pub fn new() -> Option<Self> {
            let universe = mpi::initialize()?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Some(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }
    }

    /// A message matched by `MPI_Mprobe`.
    pub struct MpiIncoming {
        message: Message,
        peer: usize,
        len: usize,
    }

    impl Incoming for MpiIncoming {
        fn len(&self) -> usize {
            self.len
        }

        fn receive_into(self, buf: &mut [u8]) -> Result<(), DecompError> {
            if buf.len() != self.len {
                // a matched message must be received before it is dropped
                let mut scratch = vec![0u8; self.len];
                self.message.matched_receive_into(&mut scratch[..]);
                return Err(DecompError::Protocol {
                    peer: self.peer,
                    detail: format!(
                        "receive buffer holds {} bytes, probed message has {}",
                        buf.len(),
                        self.len
                    ),
                });
            }
            let status = self.message.matched_receive_into(buf);
            let got = status.count(u8::equivalent_datatype()) as usize;
            if got != self.len {
                return Err(DecompError::Protocol {
                    peer: self.peer,
                    detail: format!("probed {} bytes but received {got}", self.len),
                });
            }
            Ok(())
        }
    }

    impl Communicator for MpiComm {
        type Incoming = MpiIncoming;

        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn barrier(&self) {
            self.world.barrier();
        }

        fn send(&self, peer: usize, tag: CommTag, buf: &[u8]) {
            self.world
                .process_at_rank(peer as Rank)
                .send_with_tag(buf, tag.as_i32());
        }

        fn isend_scoped<R>(
            &self,
            tag: CommTag,
            outgoing: &[(usize, &[u8])],
            body: impl FnOnce() -> R,
        ) -> R {
            mpi::request::scope(|scope| {
                let pending: Vec<_> = outgoing
                    .iter()
                    .map(|&(peer, buf)| {
                        self.world
                            .process_at_rank(peer as Rank)
                            .immediate_send_with_tag(scope, buf, tag.as_i32())
                    })
                    .collect();
                let out = body();
                for request in pending {
                    request.wait();
                }
                out
            })
        }

        fn probe(&self, peer: usize, tag: CommTag) -> MpiIncoming {
            let (message, status) = self
                .world
                .process_at_rank(peer as Rank)
                .matched_probe_with_tag(tag.as_i32());
            let len = status.count(u8::equivalent_datatype()) as usize;
            MpiIncoming { message, peer, len }
        }

        fn abort(&self, code: i32) -> ! {
            self.world.abort(code)
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::{MpiComm, MpiIncoming};
