//! Decomposition algorithms and the message-passing layer they run on.

pub mod adjacency_graph;
pub mod communicator;
pub mod distribute;
pub mod reduction;
pub mod structured;
pub mod wire;

pub use adjacency_graph::{CsrGraph, GraphKind, build_grid_graph};
pub use distribute::{distribute, gather};
pub use reduction::{ReduceOp, reduce_all};
pub use structured::{Block, StructuredDecomposer};
