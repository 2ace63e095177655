//! Structured (geometric) decomposition.
//!
//! Ranks are laid out row-major over a [`ProcessGrid`]; rank `p` sits at
//! `(p / columns, p mod columns)`. Each rank receives a base block of
//! `floor(R / Pr) x floor(C / Pc)` cells starting at `coordinate * base`.
//! The last process row takes the leftover grid rows and the last process
//! column the leftover grid columns, so the blocks tile the grid exactly.
//!
//! For a 10x10 grid over 3x3 ranks:
//!
//! ```text
//!   rank 0,1,3,4 -> 3x3    rank 2,5 -> 3x4
//!   rank 6,7     -> 4x3    rank 8   -> 4x4
//! ```

use std::ops::Range;

use log::debug;

use crate::decomp_error::DecompError;
use crate::grid::{Grid, ProcessGrid};
use crate::partitioning::PartitionVector;

/// Rectangular block of global cells owned by one rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub rank: usize,
    pub rows: Range<usize>,
    pub columns: Range<usize>,
}

impl Block {
    pub fn num_cells(&self) -> usize {
        self.rows.len() * self.columns.len()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StructuredDecomposer {
    process_grid: ProcessGrid,
}

impl StructuredDecomposer {
    pub fn new(process_grid: ProcessGrid) -> Self {
        Self { process_grid }
    }

    pub fn process_grid(&self) -> ProcessGrid {
        self.process_grid
    }

    /// Fail unless the process grid has exactly `num_procs` slots.
    ///
    /// Every rank can evaluate this locally, which keeps the outcome uniform.
    pub fn check_process_count(&self, num_procs: usize) -> Result<(), DecompError> {
        let expected = self.process_grid.num_procs();
        if expected != num_procs {
            return Err(DecompError::ProcessCountMismatch {
                expected,
                actual: num_procs,
            });
        }
        Ok(())
    }

    /// The block of cells owned by `rank`.
    pub fn block_of(&self, rank: usize, grid: Grid) -> Block {
        let pg = self.process_grid;
        let (pi, pj) = pg.coords_of(rank);
        let base_rows = grid.rows() / pg.rows();
        let base_cols = grid.columns() / pg.columns();

        let row_start = pi * base_rows;
        let col_start = pj * base_cols;
        let row_end = if pi + 1 == pg.rows() {
            grid.rows()
        } else {
            row_start + base_rows
        };
        let col_end = if pj + 1 == pg.columns() {
            grid.columns()
        } else {
            col_start + base_cols
        };

        Block {
            rank,
            rows: row_start..row_end,
            columns: col_start..col_end,
        }
    }

    /// Blocks of every rank, in rank order.
    pub fn blocks(&self, grid: Grid) -> Vec<Block> {
        (0..self.process_grid.num_procs())
            .map(|rank| self.block_of(rank, grid))
            .collect()
    }

    /// Assign every cell of `grid` to its owning rank.
    ///
    /// `num_procs` is the number of running processes; when it differs from
    /// the process grid size nothing is produced.
    pub fn decompose(&self, grid: Grid, num_procs: usize) -> Result<PartitionVector, DecompError> {
        self.check_process_count(num_procs)?;

        let mut owners = vec![0usize; grid.num_cells()];
        for block in self.blocks(grid) {
            debug!(
                "rank {} owns rows {:?} x columns {:?} ({} cells)",
                block.rank,
                block.rows,
                block.columns,
                block.num_cells()
            );
            for i in block.rows.clone() {
                let first = grid.cell_id(i, block.columns.start);
                owners[first..first + block.columns.len()].fill(block.rank);
            }
        }

        Ok(PartitionVector::new(owners, num_procs)?)
    }
}
