//! Non-periodic 2D Cartesian process topology.

use crate::algs::communicator::Communicator;
use crate::decomp_error::DecompError;
use crate::grid::ProcessGrid;

/// Ranks visible from the calling rank after a shift along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    /// Rank that would send to us (`coordinate - displacement`).
    pub source: Option<usize>,
    /// Rank we would send to (`coordinate + displacement`).
    pub dest: Option<usize>,
}

/// The calling rank's view of a `rows x columns` process grid.
///
/// Coordinates are row-major, matching the structured decomposition:
/// rank `r` sits at `(r / columns, r mod columns)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartesianTopology {
    rank: usize,
    grid: ProcessGrid,
}

/// Create the Cartesian topology for the calling rank.
///
/// The world must have exactly `rows * columns` ranks.
pub fn build_cartesian<C: Communicator>(
    comm: &C,
    grid: ProcessGrid,
) -> Result<CartesianTopology, DecompError> {
    if comm.size() != grid.num_procs() {
        return Err(DecompError::ProcessCountMismatch {
            expected: grid.num_procs(),
            actual: comm.size(),
        });
    }
    Ok(CartesianTopology {
        rank: comm.rank(),
        grid,
    })
}

impl CartesianTopology {
    /// Topology as seen from `rank`, without a communicator.
    pub fn for_rank(rank: usize, grid: ProcessGrid) -> Option<Self> {
        (rank < grid.num_procs()).then_some(Self { rank, grid })
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// `(rows, columns)` of the process grid.
    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.grid.rows(), self.grid.columns())
    }

    /// Coordinates of the calling rank.
    pub fn coords(&self) -> (usize, usize) {
        self.grid.coords_of(self.rank)
    }

    /// Coordinates of any rank in the topology.
    pub fn coords_of(&self, rank: usize) -> Option<(usize, usize)> {
        (rank < self.grid.num_procs()).then(|| self.grid.coords_of(rank))
    }

    /// Rank at `(row, column)`. The topology is not periodic, so coordinates
    /// outside the grid are an error rather than wrapped.
    pub fn rank_of(&self, row: isize, column: isize) -> Result<usize, DecompError> {
        self.checked_rank(row, column)
            .ok_or(DecompError::CoordinateOutOfRange {
                row,
                column,
                rows: self.grid.rows(),
                columns: self.grid.columns(),
            })
    }

    fn checked_rank(&self, row: isize, column: isize) -> Option<usize> {
        let row = usize::try_from(row).ok().filter(|&r| r < self.grid.rows())?;
        let column = usize::try_from(column)
            .ok()
            .filter(|&c| c < self.grid.columns())?;
        Some(self.grid.rank_of(row, column))
    }

    /// Ranks `displacement` steps away along `axis` (0 = rows, 1 = columns).
    /// Either side is `None` when it falls off the grid.
    pub fn shift(&self, axis: usize, displacement: isize) -> Result<Shift, DecompError> {
        let (row, column) = self.coords();
        let (row, column) = (row as isize, column as isize);
        let step = |d: isize| match axis {
            0 => Ok(self.checked_rank(row + d, column)),
            1 => Ok(self.checked_rank(row, column + d)),
            other => Err(DecompError::InvalidDimension(other)),
        };
        Ok(Shift {
            source: step(-displacement)?,
            dest: step(displacement)?,
        })
    }

    /// Direct neighbours (up, left, right, down order), skipping boundaries.
    pub fn neighbors(&self) -> Vec<usize> {
        let (row, column) = self.coords();
        let (row, column) = (row as isize, column as isize);
        [(-1, 0), (0, -1), (0, 1), (1, 0)]
            .into_iter()
            .filter_map(|(dr, dc)| self.checked_rank(row + dr, column + dc))
            .collect()
    }
}
