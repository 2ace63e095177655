//! Synthetic scalar field with a spatially varying work load.
//!
//! Values grow logarithmically with `row * column`, so the load
//! `exp(k * value)` is concentrated towards the far corner of the grid.
//! That skew is what makes the weighted graph decomposition worth having.

use crate::grid::Grid;
use crate::partitioning::VertexWeights;

/// Default exponent `k` of the load function.
pub const LOAD_EXPONENT: f64 = 15.0;

/// Estimated cost of a cell holding `value`.
#[inline]
pub fn local_load(value: f64, exponent: f64) -> f64 {
    (exponent * value).exp()
}

/// Burn CPU in proportion to each value's load and return the accumulated
/// result, so the work cannot be optimised away.
pub fn perform_dummy_work(values: &[f64], exponent: f64) -> f64 {
    let mut result = 0.0;
    for &value in values {
        let w = local_load(value, exponent);
        let term = (w.ln() + w.cos()) / w.exp();
        for _ in 0..w as u64 {
            result += term;
        }
    }
    result
}

/// Global field held by the coordinator before distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    grid: Grid,
    values: Vec<f64>,
}

impl Field {
    /// `value(i, j) = ln(i * j + 1) / ln(R * C + 1)`, stored row-major.
    pub fn generate(grid: Grid) -> Self {
        let norm = ((grid.num_cells() + 1) as f64).ln();
        let values = (0..grid.rows())
            .flat_map(|i| (0..grid.columns()).map(move |j| ((i * j + 1) as f64).ln() / norm))
            .collect();
        Self { grid, values }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Per-cell loads.
    pub fn loads(&self, exponent: f64) -> Vec<f64> {
        self.values.iter().map(|&v| local_load(v, exponent)).collect()
    }

    /// Partitioner weights derived from the loads.
    pub fn weights(&self, exponent: f64) -> VertexWeights {
        VertexWeights::from_loads(&self.loads(exponent))
    }
}
