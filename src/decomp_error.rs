//! DecompError: unified error type for grid-decomp public APIs.
//!
//! Algorithmic failures (configuration mismatch, partitioning failure) are
//! made uniform across ranks by
//! [`CoordinatorContext::agree`](crate::coordinator::CoordinatorContext::agree);
//! I/O failures never show up here, they stay local to the writer.

use thiserror::Error;

use crate::partitioning::error::PartitionError;

/// Unified error type for grid-decomp operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecompError {
    /// A grid with a zero extent was requested.
    #[error("grid must have at least one cell in each direction, got {rows}x{columns}")]
    InvalidGrid { rows: usize, columns: usize },
    /// A process grid with a zero extent was requested.
    #[error("process grid must have at least one process in each direction, got {rows}x{columns}")]
    InvalidProcessGrid { rows: usize, columns: usize },
    /// The requested process grid does not match the running process count.
    #[error(
        "the specified number of processes doesn't match the available number of processes: {expected} vs. {actual}"
    )]
    ProcessCountMismatch { expected: usize, actual: usize },
    /// A partition vector does not cover the field it is used with.
    #[error("partition vector has {partition} entries but the field has {field} cells")]
    PartitionLength { partition: usize, field: usize },
    /// Graph partitioning failed.
    #[error(transparent)]
    Partition(#[from] PartitionError),
    /// Sender and receiver disagree about a message.
    #[error("protocol violation with rank {peer}: {detail}")]
    Protocol { peer: usize, detail: String },
    /// A Cartesian coordinate lies outside a non-periodic topology.
    #[error("coordinate ({row}, {column}) lies outside a {rows}x{columns} topology")]
    CoordinateOutOfRange {
        row: isize,
        column: isize,
        rows: usize,
        columns: usize,
    },
    /// Cartesian topologies have exactly two axes.
    #[error("topology axis {0} does not exist (expected 0 or 1)")]
    InvalidDimension(usize),
    /// The coordinator was asked to act without the global state it owns.
    #[error("coordinator rank {rank} is missing {what}")]
    MissingCoordinatorState { rank: usize, what: &'static str },
    /// A gathered field differs from the field that was distributed.
    #[error("gathered field differs from the distributed one at cell {cell}")]
    RoundTrip { cell: usize },
    /// The coordinator reported a failure to this rank.
    #[error("coordinator reported failure: {0}")]
    Remote(String),
    /// Rejected run configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
