#![cfg_attr(docsrs, feature(doc_cfg))]
//! # grid-decomp
//!
//! grid-decomp splits a 2D grid with non-uniform per-cell work across a
//! fixed set of ranks and compares two strategies:
//!
//! - **structured**: contiguous rectangles over a 2D process grid
//!   ([`algs::structured`]), with a Cartesian process topology;
//! - **graph**: weighted k-way partitioning of the grid's 4-neighbour CSR
//!   graph ([`algs::adjacency_graph`], [`partitioning`]), with a process
//!   graph topology derived from the cut edges ([`topology`]).
//!
//! Global state (grid, partition, graph) lives on one coordinating rank,
//! named by a [`CoordinatorContext`](coordinator::CoordinatorContext) that
//! every collective step takes. The coordinator scatters field values to
//! their owners with [`algs::distribute`].
//!
//! ## Transport
//! Every collective step is generic over
//! [`Communicator`](algs::communicator::Communicator). `LocalComm` runs the
//! ranks as threads of one process and is what the tests use; `MpiComm`
//! (feature `mpi-support`) runs them as MPI processes.
//!
//! ## Features
//! - `metis-support` (default): METIS k-way backend. Without it the
//!   greedy graph-growing backend is used.
//! - `mpi-support`: MPI transport.
//!
//! ## Determinism
//! The structured decomposition, graph construction and greedy backend are
//! deterministic. METIS is deterministic for a fixed seed
//! ([`PartitionerConfig::seed`](partitioning::PartitionerConfig)).

pub mod algs;
pub mod config;
pub mod coordinator;
pub mod decomp_error;
pub mod field;
pub mod grid;
pub mod io;
pub mod partitioning;
pub mod pipeline;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::adjacency_graph::{CsrGraph, GraphKind, build_grid_graph};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::communicator::{Communicator, Incoming, LocalComm};
    pub use crate::algs::distribute::{distribute, gather};
    pub use crate::algs::reduction::{ReduceOp, reduce_all};
    pub use crate::algs::structured::StructuredDecomposer;
    pub use crate::config::{DecompositionKind, RunConfig};
    pub use crate::coordinator::CoordinatorContext;
    pub use crate::decomp_error::DecompError;
    pub use crate::field::Field;
    pub use crate::grid::{Grid, ProcessGrid};
    #[cfg(feature = "metis-support")]
    pub use crate::partitioning::MetisPartitioner;
    pub use crate::partitioning::{
        BalancePartitioner, GraphPartitioner, GreedyPartitioner, PartitionBackend,
        PartitionVector, PartitionerConfig, ProcessAdjacencyMap, VertexWeights,
    };
    pub use crate::pipeline::{RunOptions, RunReport, run};
    pub use crate::topology::{
        CartesianTopology, GraphTopology, Shift, Topology, build_cartesian, build_graph,
    };
}
