//! Grid index model: global cell grids, process grids and the row-major
//! arithmetic that maps between `(row, column)` pairs and linear ids.
//!
//! Every type here is an immutable value. Cell `(r, c)` of a grid with `C`
//! columns has linear id `c + r * C`; process ranks of a [`ProcessGrid`] are
//! enumerated the same way.

use serde::{Deserialize, Serialize};

use crate::decomp_error::DecompError;

/// Unchecked `rows x columns` as written in configuration files.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Extent {
    pub rows: usize,
    pub columns: usize,
}

/// Global cell counts of a 2D grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Extent")]
pub struct Grid {
    rows: usize,
    columns: usize,
}

impl Grid {
    /// Build a grid, rejecting empty extents.
    pub fn new(rows: usize, columns: usize) -> Result<Self, DecompError> {
        if rows == 0 || columns == 0 {
            return Err(DecompError::InvalidGrid { rows, columns });
        }
        Ok(Self { rows, columns })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Total number of cells.
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.rows * self.columns
    }

    /// Linear id of cell `(row, column)`.
    #[inline]
    pub fn cell_id(&self, row: usize, column: usize) -> usize {
        debug_assert!(row < self.rows && column < self.columns);
        column + row * self.columns
    }

    /// `(row, column)` of linear cell id `id`.
    #[inline]
    pub fn coords(&self, id: usize) -> (usize, usize) {
        debug_assert!(id < self.num_cells());
        (id / self.columns, id % self.columns)
    }

    /// True when `id` sits in the first column.
    #[inline]
    pub fn on_left_boundary(&self, id: usize) -> bool {
        id % self.columns == 0
    }

    /// True when `id` sits in the last column.
    #[inline]
    pub fn on_right_boundary(&self, id: usize) -> bool {
        (id + 1) % self.columns == 0
    }
}

impl TryFrom<Extent> for Grid {
    type Error = DecompError;

    fn try_from(e: Extent) -> Result<Self, Self::Error> {
        Grid::new(e.rows, e.columns)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            rows: 10,
            columns: 10,
        }
    }
}

/// Shape of the 2D process arrangement used by the structured path.
///
/// `rows * columns` must equal the number of running processes; that check
/// happens where the process count is known (see
/// [`StructuredDecomposer`](crate::algs::structured::StructuredDecomposer)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Extent")]
pub struct ProcessGrid {
    rows: usize,
    columns: usize,
}

impl ProcessGrid {
    pub fn new(rows: usize, columns: usize) -> Result<Self, DecompError> {
        if rows == 0 || columns == 0 {
            return Err(DecompError::InvalidProcessGrid { rows, columns });
        }
        Ok(Self { rows, columns })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of processes the arrangement needs.
    #[inline]
    pub fn num_procs(&self) -> usize {
        self.rows * self.columns
    }

    /// Coordinate of `rank`: `(rank / columns, rank mod columns)`.
    #[inline]
    pub fn coords_of(&self, rank: usize) -> (usize, usize) {
        (rank / self.columns, rank % self.columns)
    }

    /// Rank at coordinate `(row, column)`.
    #[inline]
    pub fn rank_of(&self, row: usize, column: usize) -> usize {
        column + row * self.columns
    }
}

impl TryFrom<Extent> for ProcessGrid {
    type Error = DecompError;

    fn try_from(e: Extent) -> Result<Self, Self::Error> {
        ProcessGrid::new(e.rows, e.columns)
    }
}

impl Default for ProcessGrid {
    fn default() -> Self {
        Self {
            rows: 1,
            columns: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_extents_are_rejected() {
        assert!(matches!(
            Grid::new(0, 4),
            Err(DecompError::InvalidGrid { rows: 0, columns: 4 })
        ));
        assert!(Grid::new(3, 0).is_err());
        assert!(ProcessGrid::new(0, 1).is_err());
    }

    #[test]
    fn cell_ids_are_row_major() {
        let g = Grid::new(3, 5).unwrap();
        assert_eq!(g.num_cells(), 15);
        assert_eq!(g.cell_id(0, 0), 0);
        assert_eq!(g.cell_id(1, 0), 5);
        assert_eq!(g.cell_id(2, 4), 14);
        for id in 0..g.num_cells() {
            let (r, c) = g.coords(id);
            assert_eq!(g.cell_id(r, c), id);
        }
    }

    #[test]
    fn boundary_predicates() {
        let g = Grid::new(2, 3).unwrap();
        assert!(g.on_left_boundary(0));
        assert!(g.on_left_boundary(3));
        assert!(!g.on_left_boundary(4));
        assert!(g.on_right_boundary(2));
        assert!(g.on_right_boundary(5));
        assert!(!g.on_right_boundary(1));
    }

    #[test]
    fn process_coords_round_trip() {
        let p = ProcessGrid::new(3, 2).unwrap();
        assert_eq!(p.num_procs(), 6);
        assert_eq!(p.coords_of(0), (0, 0));
        assert_eq!(p.coords_of(1), (0, 1));
        assert_eq!(p.coords_of(5), (2, 1));
        for rank in 0..p.num_procs() {
            let (r, c) = p.coords_of(rank);
            assert_eq!(p.rank_of(r, c), rank);
        }
    }
}
