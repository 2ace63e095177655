//! One complete decomposition run, as every rank executes it.
//!
//! 1. The coordinator generates the field and decomposes the grid
//!    (structured blocks, or graph partitioning weighted by the load).
//! 2. Every rank builds its topology; the graph path first receives its
//!    neighbour list from the coordinator.
//! 3. The coordinator scatters the field, every rank works on its cells.
//! 4. The work result and the elapsed time of the work alone are reduced
//!    to every rank.

use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::algs::adjacency_graph::{GraphKind, build_grid_graph};
use crate::algs::communicator::Communicator;
use crate::algs::distribute::{distribute, gather};
use crate::algs::reduction::{ReduceOp, reduce_all};
use crate::algs::structured::StructuredDecomposer;
use crate::config::{DecompositionKind, RunConfig};
use crate::coordinator::CoordinatorContext;
use crate::decomp_error::DecompError;
use crate::field::{Field, perform_dummy_work};
use crate::io;
use crate::partitioning::{
    PartitionVector, ProcessAdjacencyMap, edge_cut, imbalance, part_weights, partition_with,
};
use crate::topology::{Topology, build_cartesian, build_graph};

/// Optional checks on top of the plain run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Log the topology query results of every rank.
    pub check_topology: bool,
    /// Gather the field back and compare it with the generated one.
    pub verify: bool,
}

/// What a rank knows at the end of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub rank: usize,
    /// Cells this rank received.
    pub local_cells: usize,
    /// Sum of the dummy work over all ranks.
    pub work: f64,
    /// Seconds from the earliest start to the latest finish of the per-cell
    /// work. Decomposition and distribution are not included.
    pub elapsed: f64,
    pub topology: Topology,
}

/// Coordinator-side state of a run.
struct Global {
    field: Field,
    partition: PartitionVector,
    adjacency: Option<ProcessAdjacencyMap>,
}

fn wall_clock() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

fn decompose(cfg: &RunConfig, num_procs: usize) -> Result<Global, DecompError> {
    let field = Field::generate(cfg.grid);
    match cfg.kind {
        DecompositionKind::Structured => {
            let partition = StructuredDecomposer::new(cfg.process_grid).decompose(cfg.grid, num_procs)?;
            Ok(Global {
                field,
                partition,
                adjacency: None,
            })
        }
        DecompositionKind::Graph => {
            let graph = build_grid_graph(cfg.grid, GraphKind::AdjacencyList);
            let weights = field.weights(cfg.load_exponent);
            let (partition, adjacency) =
                partition_with(&cfg.partitioner, &graph, &weights, num_procs)?;
            info!(
                "edge cut {}, imbalance {:.4}, part weights {:?}",
                edge_cut(&graph, &partition),
                imbalance(&weights, &partition),
                part_weights(&weights, &partition)
            );
            Ok(Global {
                field,
                partition,
                adjacency: Some(adjacency),
            })
        }
    }
}

/// Execute one run. Collective: every rank calls it with the same `cfg`.
///
/// Failures of coordinator-side steps are reported on every rank.
pub fn run<C: Communicator>(
    comm: &C,
    ctx: &CoordinatorContext,
    cfg: &RunConfig,
    opts: RunOptions,
) -> Result<RunReport, DecompError> {
    ctx.check(comm)?;
    cfg.validate()?;
    let rank = comm.rank();

    if ctx.is_coordinator(comm) {
        info!(
            "{:?} decomposition of a {}x{} grid over {} ranks",
            cfg.kind,
            cfg.grid.rows(),
            cfg.grid.columns(),
            comm.size()
        );
    }

    let global = ctx.compute(comm, || decompose(cfg, comm.size()))?;

    let topology = match cfg.kind {
        DecompositionKind::Structured => Topology::Cartesian(build_cartesian(comm, cfg.process_grid)?),
        DecompositionKind::Graph => {
            let adjacency = global.as_ref().and_then(|g| g.adjacency.as_ref());
            Topology::Graph(build_graph(comm, ctx, adjacency)?)
        }
    };
    if opts.check_topology {
        for line in topology.check_report() {
            info!("{line}");
        }
    }

    if let (Some(g), Some(dir)) = (&global, &cfg.output_dir) {
        io::report(io::dump_field(dir, "original", rank, g.field.values()));
        io::report(io::dump_partition(dir, cfg.kind.dump_name(), &g.partition, cfg.grid));
    }

    let local = distribute(
        comm,
        ctx,
        global.as_ref().map(|g| (g.field.values(), &g.partition)),
    )?;
    debug!("rank {rank} owns {} cells", local.len());

    let start = wall_clock();
    let local_work = perform_dummy_work(&local, cfg.load_exponent);
    let end = wall_clock();

    let work = reduce_all(comm, ctx, local_work, ReduceOp::Sum)?;
    let first_start = reduce_all(comm, ctx, start, ReduceOp::Min)?;
    let last_end = reduce_all(comm, ctx, end, ReduceOp::Max)?;
    let elapsed = last_end - first_start;

    if let Some(dir) = &cfg.output_dir {
        io::report(io::dump_field(dir, "field", rank, &local));
    }

    if opts.verify {
        let gathered = gather(comm, ctx, &local, global.as_ref().map(|g| &g.partition))?;
        let outcome = match (&global, gathered) {
            (Some(g), Some(back)) => match g.field.values().iter().zip(&back).position(|(a, b)| a != b) {
                Some(cell) => Err(DecompError::RoundTrip { cell }),
                None => Ok(()),
            },
            _ => Ok(()),
        };
        ctx.agree(comm, outcome)?;
        if ctx.is_coordinator(comm) {
            info!("Round trip verified");
        }
    }

    if ctx.is_coordinator(comm) {
        info!("Elapsed time (work): {elapsed:.6} s");
        info!("Result: {work}");
    }

    Ok(RunReport {
        rank,
        local_cells: local.len(),
        work,
        elapsed,
        topology,
    })
}
