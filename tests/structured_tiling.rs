use grid_decomp::algs::structured::StructuredDecomposer;
use grid_decomp::decomp_error::DecompError;
use grid_decomp::grid::{Grid, ProcessGrid};
use proptest::prelude::*;

/// Process grids with 1, 2, 4 or 9 ranks.
const PROCESS_SHAPES: &[(usize, usize)] = &[
    (1, 1),
    (1, 2),
    (2, 1),
    (1, 4),
    (2, 2),
    (4, 1),
    (1, 9),
    (3, 3),
    (9, 1),
];

proptest! {
    #[test]
    fn blocks_tile_the_grid(
        rows in 1usize..40,
        cols in 1usize..40,
        shape in 0usize..PROCESS_SHAPES.len(),
    ) {
        let (pr, pc) = PROCESS_SHAPES[shape];
        let grid = Grid::new(rows, cols).unwrap();
        let decomposer = StructuredDecomposer::new(ProcessGrid::new(pr, pc).unwrap());
        let n = pr * pc;

        // every cell is covered by exactly one block
        let mut cover = vec![0u32; grid.num_cells()];
        for block in decomposer.blocks(grid) {
            for i in block.rows.clone() {
                for j in block.columns.clone() {
                    cover[grid.cell_id(i, j)] += 1;
                }
            }
        }
        prop_assert!(cover.iter().all(|&c| c == 1));

        // and the partition vector agrees with the blocks
        let pv = decomposer.decompose(grid, n).unwrap();
        prop_assert_eq!(pv.len(), grid.num_cells());
        prop_assert!(pv.as_slice().iter().all(|&p| p < n));
        for block in decomposer.blocks(grid) {
            for i in block.rows.clone() {
                for j in block.columns.clone() {
                    prop_assert_eq!(pv.owner(grid.cell_id(i, j)), block.rank);
                }
            }
        }
        prop_assert_eq!(pv.counts().iter().sum::<usize>(), rows * cols);
    }
}

#[test]
fn last_process_row_and_column_absorb_the_remainder() {
    let grid = Grid::new(10, 10).unwrap();
    let decomposer = StructuredDecomposer::new(ProcessGrid::new(3, 3).unwrap());
    let pv = decomposer.decompose(grid, 9).unwrap();
    let counts = pv.counts();

    let corner = decomposer.block_of(8, grid);
    assert_eq!((corner.rows.len(), corner.columns.len()), (4, 4));
    assert_eq!(counts[8], 16);
    for rank in [0, 1, 3, 4] {
        assert_eq!(counts[rank], 9, "rank {rank}");
    }
    assert_eq!(counts.iter().sum::<usize>(), 100);
}

#[test]
fn wrong_process_count_produces_nothing() {
    let decomposer = StructuredDecomposer::new(ProcessGrid::new(2, 2).unwrap());
    let err = decomposer
        .decompose(Grid::new(8, 8).unwrap(), 3)
        .unwrap_err();
    assert_eq!(
        err,
        DecompError::ProcessCountMismatch {
            expected: 4,
            actual: 3
        }
    );
    assert!(err.to_string().contains("4 vs. 3"));
}
