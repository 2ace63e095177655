//! Plain-text dumps of partition vectors and local fields.
//!
//! Writers are generic over [`std::io::Write`]; the `dump_*` helpers open
//! the conventional files in a directory. These outputs are for inspection
//! only. A failed dump is logged by the caller and never aborts a run.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{debug, warn};

use crate::grid::Grid;
use crate::partitioning::PartitionVector;

/// File name of the structured decomposition dump.
pub const STRUCTURED_DUMP: &str = "struct.dat";
/// File name of the graph decomposition dump.
pub const GRAPH_DUMP: &str = "graph.dat";

/// Write the owner of every cell, one grid row per line, ranks separated by
/// single spaces.
pub fn write_partition<W: Write>(
    mut out: W,
    partition: &PartitionVector,
    grid: Grid,
) -> io::Result<()> {
    if partition.len() != grid.num_cells() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "partition of {} cells does not match a {}x{} grid",
                partition.len(),
                grid.rows(),
                grid.columns()
            ),
        ));
    }
    for row in partition.as_slice().chunks(grid.columns()) {
        writeln!(out, "{}", row.iter().join(" "))?;
    }
    out.flush()
}

/// Write one value per line.
pub fn write_field<W: Write>(mut out: W, values: &[f64]) -> io::Result<()> {
    for v in values {
        writeln!(out, "{v}")?;
    }
    out.flush()
}

fn create(path: &Path) -> io::Result<BufWriter<File>> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    File::create(path).map(BufWriter::new)
}

/// Write `partition` to `dir/name`. Returns the path written.
pub fn dump_partition(
    dir: &Path,
    name: &str,
    partition: &PartitionVector,
    grid: Grid,
) -> io::Result<PathBuf> {
    let path = dir.join(name);
    write_partition(create(&path)?, partition, grid)?;
    debug!("wrote {}", path.display());
    Ok(path)
}

/// Write a rank's local values to `dir/<base>_<rank>.dat`.
pub fn dump_field(dir: &Path, base: &str, rank: usize, values: &[f64]) -> io::Result<PathBuf> {
    let path = dir.join(format!("{base}_{rank}.dat"));
    write_field(create(&path)?, values)?;
    debug!("wrote {}", path.display());
    Ok(path)
}

/// Log a failed dump and carry on.
pub fn report(result: io::Result<PathBuf>) -> Option<PathBuf> {
    result
        .map_err(|e| warn!("Can't write the output file: {e}"))
        .ok()
}
