//! Run configuration shared by the driver and library callers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::decomp_error::DecompError;
use crate::field::LOAD_EXPONENT;
use crate::grid::{Grid, ProcessGrid};
use crate::partitioning::PartitionerConfig;

/// Which decomposition strategy a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecompositionKind {
    /// Rectangular blocks over a process grid.
    #[default]
    Structured,
    /// Weighted graph partitioning.
    Graph,
}

impl DecompositionKind {
    /// Name of the partition dump written for this kind.
    pub fn dump_name(self) -> &'static str {
        match self {
            DecompositionKind::Structured => crate::io::STRUCTURED_DUMP,
            DecompositionKind::Graph => crate::io::GRAPH_DUMP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub grid: Grid,
    /// Used by the structured path; the graph path only needs the rank count.
    pub process_grid: ProcessGrid,
    pub kind: DecompositionKind,
    /// Exponent `k` of the per-cell load `exp(k * value)`.
    pub load_exponent: f64,
    /// Where dumps go. `None` disables them.
    pub output_dir: Option<PathBuf>,
    pub partitioner: PartitionerConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            grid: Grid::default(),
            process_grid: ProcessGrid::default(),
            kind: DecompositionKind::default(),
            load_exponent: LOAD_EXPONENT,
            output_dir: None,
            partitioner: PartitionerConfig::default(),
        }
    }
}

impl RunConfig {
    /// Check the scalar settings. Grid extents are checked when they are built.
    pub fn validate(&self) -> Result<(), DecompError> {
        if !self.load_exponent.is_finite() || self.load_exponent < 0.0 {
            return Err(DecompError::InvalidConfig(format!(
                "load exponent must be a non-negative number, got {}",
                self.load_exponent
            )));
        }
        if self.partitioner.ufactor < 1 {
            return Err(DecompError::InvalidConfig(format!(
                "imbalance factor must be at least 1, got {}",
                self.partitioner.ufactor
            )));
        }
        if self.partitioner.ncuts < 1 {
            return Err(DecompError::InvalidConfig(format!(
                "number of cuts must be at least 1, got {}",
                self.partitioner.ncuts
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.grid.num_cells(), 100);
        assert_eq!(cfg.process_grid.num_procs(), 1);
        assert_eq!(cfg.kind, DecompositionKind::Structured);
        assert_eq!(cfg.load_exponent, 15.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn bad_values_are_rejected() {
        let mut cfg = RunConfig::default();
        cfg.load_exponent = f64::NAN;
        assert!(matches!(cfg.validate(), Err(DecompError::InvalidConfig(_))));

        let mut cfg = RunConfig::default();
        cfg.partitioner.ncuts = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn dump_names_follow_the_kind() {
        assert_eq!(DecompositionKind::Structured.dump_name(), "struct.dat");
        assert_eq!(DecompositionKind::Graph.dump_name(), "graph.dat");
    }
}
