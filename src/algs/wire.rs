//! Wire helpers: plain-old-data casts and the typed probe-then-receive step.
//!
//! Ranks travel as little-endian `u32`, field values as native `f64`
//! (every rank of a run shares one architecture).

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::mem::size_of;

use crate::algs::communicator::{CommTag, Communicator, Incoming};
use crate::decomp_error::DecompError;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

/// A process rank carried on the wire.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct WireRank {
    pub rank_le: u32,
}

const_assert_eq!(size_of::<WireRank>(), 4);

impl WireRank {
    pub fn of(rank: usize) -> Self {
        Self {
            rank_le: (rank as u32).to_le(),
        }
    }
    pub fn get(&self) -> usize {
        u32::from_le(self.rank_le) as usize
    }
}

/// Encode a list of ranks.
pub fn encode_ranks(ranks: &[usize]) -> Vec<WireRank> {
    ranks.iter().copied().map(WireRank::of).collect()
}

/// Decode a list of ranks.
pub fn decode_ranks(wire: &[WireRank]) -> Vec<usize> {
    wire.iter().map(WireRank::get).collect()
}

/// Probe the next `(peer, tag)` message, size a buffer from the probed
/// length and receive into it.
///
/// A byte length that is not a whole number of `T` is a protocol violation.
pub fn recv_vec<T, C>(comm: &C, peer: usize, tag: CommTag) -> Result<Vec<T>, DecompError>
where
    T: Pod,
    C: Communicator + ?Sized,
{
    let incoming = comm.probe(peer, tag);
    let bytes = incoming.len();
    if bytes % size_of::<T>() != 0 {
        incoming.discard();
        return Err(DecompError::Protocol {
            peer,
            detail: format!(
                "message of {bytes} bytes is not a whole number of {}-byte elements",
                size_of::<T>()
            ),
        });
    }
    let mut buf = vec![T::zeroed(); bytes / size_of::<T>()];
    incoming.receive_into(cast_slice_mut(&mut buf))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::LocalComm;

    #[test]
    fn ranks_survive_the_wire() {
        let ranks = vec![0, 3, 17, 4096];
        assert_eq!(decode_ranks(&encode_ranks(&ranks)), ranks);
    }

    #[test]
    fn recv_vec_sizes_buffer_from_probe() {
        let world = LocalComm::world(2);
        let tag = CommTag::new(21);
        let values = [1.5f64, -2.0, 3.25];
        world[0].send(1, tag, cast_slice(&values));
        let got: Vec<f64> = recv_vec(&world[1], 0, tag).unwrap();
        assert_eq!(got, values);
    }

    #[test]
    fn recv_vec_accepts_empty_messages() {
        let world = LocalComm::world(2);
        let tag = CommTag::new(22);
        world[0].send(1, tag, &[]);
        let got: Vec<f64> = recv_vec(&world[1], 0, tag).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn ragged_message_is_rejected() {
        let world = LocalComm::world(2);
        let tag = CommTag::new(23);
        world[0].send(1, tag, &[0u8; 5]);
        let err = recv_vec::<WireRank, _>(&world[1], 0, tag).unwrap_err();
        assert!(matches!(err, DecompError::Protocol { peer: 0, .. }));
    }

    #[test]
    fn ragged_message_is_consumed_before_the_error() {
        let world = LocalComm::world(2);
        let tag = CommTag::new(24);
        world[0].send(1, tag, &[0u8; 7]);
        world[0].send(1, tag, cast_slice(&encode_ranks(&[2, 5])));
        assert!(recv_vec::<WireRank, _>(&world[1], 0, tag).is_err());
        let next: Vec<WireRank> = recv_vec(&world[1], 0, tag).unwrap();
        assert_eq!(decode_ranks(&next), vec![2, 5]);
    }
}
