//! Partitioning errors for grid-decomp

use thiserror::Error;

/// Errors from graph partitioning and partition bookkeeping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartitionError {
    /// One weight per vertex is required.
    #[error("expected {expected} vertex weights, got {actual}")]
    WeightCount { expected: usize, actual: usize },
    /// Vertex weights estimate compute cost and must be positive.
    #[error("vertex {0} has a non-positive weight")]
    NonPositiveWeight(usize),
    /// The CSR graph handed to a partitioner is malformed.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
    /// A partition vector names a part outside `0..num_parts`.
    #[error("cell {cell} is assigned to part {part}, but only {num_parts} parts exist")]
    PartOutOfRange {
        cell: usize,
        part: usize,
        num_parts: usize,
    },
    /// Zero parts were requested.
    #[error("number of parts must be at least 1")]
    NoParts,
    /// The partitioning backend returned a non-success status.
    #[error("an error code has been returned by the partitioning algorithm: {0}")]
    Backend(String),
}
