//! Driver: run a structured or graph decomposition over MPI ranks or
//! in-process ranks and report the timing.
//!
//! ```text
//! mpirun -n 9 grid-decomp --size 10 10 --procs 3 3 --kind structured
//! grid-decomp --ranks 4 --size 64 64 --kind graph --backend greedy --verify
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::{LevelFilter, error};

use grid_decomp::algs::communicator::{Communicator, LocalComm};
use grid_decomp::config::{DecompositionKind, RunConfig};
use grid_decomp::coordinator::CoordinatorContext;
use grid_decomp::decomp_error::DecompError;
use grid_decomp::field::LOAD_EXPONENT;
use grid_decomp::grid::{Grid, ProcessGrid};
use grid_decomp::partitioning::{PartitionBackend, PartitionerConfig};
use grid_decomp::pipeline::{RunOptions, run};

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Kind {
    /// Rectangular blocks over a process grid
    Structured,
    /// Load-weighted graph partitioning
    Graph,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Backend {
    Metis,
    Greedy,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Global grid size
    #[arg(short, long, num_args = 2, value_names = ["ROWS", "COLUMNS"], default_values_t = [10, 10])]
    size: Vec<usize>,
    /// Process grid of the structured decomposition
    #[arg(short, long, num_args = 2, value_names = ["ROWS", "COLUMNS"], default_values_t = [1, 1])]
    procs: Vec<usize>,
    /// Decomposition strategy
    #[arg(short, long, value_enum, default_value_t = Kind::Structured)]
    kind: Kind,
    /// Graph partitioning backend
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,
    /// Exponent k of the per-cell load exp(k * value)
    #[arg(short, long, value_name = "k", default_value_t = LOAD_EXPONENT)]
    exponent: f64,
    /// Allowed imbalance of the graph partition, in thousandths
    #[arg(long, default_value_t = 30)]
    ufactor: i32,
    /// Seed of the graph partitioner
    #[arg(long)]
    seed: Option<i32>,
    /// Directory for the partition and field dumps
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Run this many ranks as threads of this process instead of over MPI
    #[arg(short, long, default_value_t = 1)]
    ranks: usize,
    /// Log level (error, warn, info, debug, trace); RUST_LOG otherwise
    #[arg(long)]
    log_level: Option<String>,
    /// Log the topology query results of every rank
    #[arg(long)]
    check_topology: bool,
    /// Gather the field back and compare it with the generated one
    #[arg(long)]
    verify: bool,
}

impl Args {
    fn to_config(&self) -> Result<RunConfig, DecompError> {
        let partitioner = PartitionerConfig {
            ufactor: self.ufactor,
            seed: self.seed,
            backend: match self.backend {
                Some(Backend::Metis) => PartitionBackend::Metis,
                Some(Backend::Greedy) => PartitionBackend::Greedy,
                None => PartitionBackend::default(),
            },
            ..PartitionerConfig::default()
        };
        let cfg = RunConfig {
            grid: Grid::new(self.size[0], self.size[1])?,
            process_grid: ProcessGrid::new(self.procs[0], self.procs[1])?,
            kind: match self.kind {
                Kind::Structured => DecompositionKind::Structured,
                Kind::Graph => DecompositionKind::Graph,
            },
            load_exponent: self.exponent,
            output_dir: self.output.clone(),
            partitioner,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn options(&self) -> RunOptions {
        RunOptions {
            check_topology: self.check_topology,
            verify: self.verify,
        }
    }
}

fn init_logging(level: Option<&str>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level.and_then(|l| l.parse::<LevelFilter>().ok()) {
        builder.filter_level(level);
    }
    builder.format_timestamp_millis().init();
}

fn run_rank<C: Communicator>(comm: &C, cfg: &RunConfig, opts: RunOptions) -> bool {
    match run(comm, &CoordinatorContext::default(), cfg, opts) {
        Ok(_) => true,
        Err(e) => {
            error!("rank {}: {e}", comm.rank());
            false
        }
    }
}

fn run_local(ranks: usize, cfg: &RunConfig, opts: RunOptions) -> bool {
    let world = LocalComm::world(ranks);
    std::thread::scope(|s| {
        let handles: Vec<_> = world
            .iter()
            .map(|comm| s.spawn(move || run_rank(comm, cfg, opts)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or(false))
            .fold(true, |all, ok| all && ok)
    })
}

#[cfg(feature = "mpi-support")]
fn run_mpi(cfg: &RunConfig, opts: RunOptions) -> bool {
    match grid_decomp::algs::communicator::MpiComm::new() {
        Some(comm) => run_rank(&comm, cfg, opts),
        None => {
            error!("MPI was already initialized");
            false
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    let cfg = match args.to_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if args.ranks == 0 {
        error!("--ranks must be at least 1");
        return ExitCode::FAILURE;
    }

    #[cfg(feature = "mpi-support")]
    let ok = if args.ranks > 1 {
        run_local(args.ranks, &cfg, args.options())
    } else {
        run_mpi(&cfg, args.options())
    };
    #[cfg(not(feature = "mpi-support"))]
    let ok = run_local(args.ranks, &cfg, args.options());

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
