//! Build the CSR (compressed-sparse-row) graph of a grid's 4-neighbour stencil.
//
// Each *cell* is a vertex. Cell r links to
//
// * r - C   (up)    when r >= C
// * r - 1   (left)  when r is not in the first column
// * r       (self)  matrix flavour only
// * r + 1   (right) when r + 1 is not in the first column of the next row
// * r + C   (down)  when r < N - C
//
// in exactly that order. Returned as ParMETIS-style CSR:
//
// * `offsets[i] .. offsets[i+1]` = neighbour list of cell *i*
// * `targets`                    = concatenated neighbour cells
// * `edge_weights`               = matrix entries (all 1), matrix flavour only

use std::fmt;

use crate::grid::Grid;

/// Storage flavour of the grid graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    /// Plain adjacency lists, no self loops (what partitioners expect).
    AdjacencyList,
    /// Sparse adjacency matrix: diagonal entries included, every stored
    /// entry carries the value 1.
    AdjacencyMatrix,
}

/// CSR graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrGraph {
    pub offsets: Vec<usize>,
    pub targets: Vec<usize>,
    pub edge_weights: Option<Vec<i32>>,
    pub kind: GraphKind,
}

impl CsrGraph {
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.targets.len()
    }

    /// Stored entries of vertex `v`.
    #[inline]
    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.targets[self.offsets[v]..self.offsets[v + 1]]
    }

    /// Neighbours of `v`, skipping the diagonal entry of the matrix flavour.
    pub fn neighbors_excluding_self(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.neighbors(v).iter().copied().filter(move |&u| u != v)
    }

    /// Iterator over every stored `(source, target)` pair, self loops excluded.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.num_vertices())
            .flat_map(move |v| self.neighbors_excluding_self(v).map(move |u| (v, u)))
    }

    /// Adjacency-list view of this graph: diagonal entries and matrix values dropped.
    pub fn to_adjacency_list(&self) -> CsrGraph {
        if self.kind == GraphKind::AdjacencyList {
            return self.clone();
        }
        let n = self.num_vertices();
        let mut offsets = Vec::with_capacity(n + 1);
        let mut targets = Vec::with_capacity(self.nnz().saturating_sub(n));
        offsets.push(0);
        for v in 0..n {
            targets.extend(self.neighbors_excluding_self(v));
            offsets.push(targets.len());
        }
        CsrGraph {
            offsets,
            targets,
            edge_weights: None,
            kind: GraphKind::AdjacencyList,
        }
    }
}

/// Number of stored entries of the stencil graph of `grid`.
pub fn stencil_nnz(grid: Grid, kind: GraphKind) -> usize {
    let n = grid.num_cells();
    let vertical = 2 * (n - grid.columns());
    let horizontal = 2 * grid.rows() * (grid.columns() - 1);
    match kind {
        GraphKind::AdjacencyList => vertical + horizontal,
        GraphKind::AdjacencyMatrix => n + vertical + horizontal,
    }
}

/// Build the 4-neighbour stencil graph of `grid`.
pub fn build_grid_graph(grid: Grid, kind: GraphKind) -> CsrGraph {
    let n = grid.num_cells();
    let cols = grid.columns();
    let nnz = stencil_nnz(grid, kind);

    let mut offsets = Vec::with_capacity(n + 1);
    let mut targets = Vec::with_capacity(nnz);

    for row in 0..n {
        offsets.push(targets.len());
        if row >= cols {
            targets.push(row - cols);
        }
        if !grid.on_left_boundary(row) {
            targets.push(row - 1);
        }
        if kind == GraphKind::AdjacencyMatrix {
            targets.push(row);
        }
        if !grid.on_right_boundary(row) {
            targets.push(row + 1);
        }
        if row < n - cols {
            targets.push(row + cols);
        }
    }
    offsets.push(targets.len());
    debug_assert_eq!(targets.len(), nnz);

    let edge_weights = match kind {
        GraphKind::AdjacencyList => None,
        GraphKind::AdjacencyMatrix => Some(vec![1; targets.len()]),
    };

    CsrGraph {
        offsets,
        targets,
        edge_weights,
        kind,
    }
}

impl fmt::Display for CsrGraph {
    /// Offsets on one line, then one line per vertex: the neighbour list for
    /// the list flavour, a dense row of matrix values for the matrix flavour.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use itertools::Itertools;

        if self.targets.is_empty() {
            return writeln!(f, "Warning! The graph is empty...");
        }
        writeln!(f, "offsets:")?;
        writeln!(f, "{}", self.offsets.iter().join(" "))?;
        writeln!(f)?;
        writeln!(f, "data:")?;

        let n = self.num_vertices();
        match (&self.kind, &self.edge_weights) {
            (GraphKind::AdjacencyMatrix, Some(values)) => {
                write!(f, "     ")?;
                for col in 0..n {
                    write!(f, "{col:>3}")?;
                }
                writeln!(f)?;
                write!(f, "     ")?;
                for _ in 0..n {
                    write!(f, "{:>3}", "-")?;
                }
                writeln!(f)?;
                for row in 0..n {
                    write!(f, "{row:>3}: ")?;
                    let span = self.offsets[row]..self.offsets[row + 1];
                    for col in 0..n {
                        let value = span
                            .clone()
                            .find(|&k| self.targets[k] == col)
                            .map_or(0, |k| values[k]);
                        write!(f, "{value:>3}")?;
                    }
                    writeln!(f)?;
                }
            }
            _ => {
                for row in 0..n {
                    writeln!(f, "{row:>3}: {}", self.neighbors(row).iter().join(" "))?;
                }
            }
        }
        Ok(())
    }
}
