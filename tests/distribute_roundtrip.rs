use grid_decomp::algs::communicator::{Communicator, LocalComm};
use grid_decomp::algs::distribute::{distribute, gather};
use grid_decomp::algs::structured::StructuredDecomposer;
use grid_decomp::coordinator::CoordinatorContext;
use grid_decomp::decomp_error::DecompError;
use grid_decomp::field::Field;
use grid_decomp::grid::{Grid, ProcessGrid};
use grid_decomp::partitioning::PartitionVector;

/// Scatter then gather on `size` thread-ranks. Returns every rank's local
/// values and the field the coordinator gathered back.
fn round_trip(
    size: usize,
    root: usize,
    values: &[f64],
    pv: &PartitionVector,
) -> (Vec<Vec<f64>>, Vec<f64>) {
    let world = LocalComm::world(size);
    let ctx = CoordinatorContext::new(root);
    let results: Vec<_> = std::thread::scope(|s| {
        let hs: Vec<_> = world
            .iter()
            .map(|comm| {
                s.spawn(move || {
                    let global = ctx.is_coordinator(comm).then_some((values, pv));
                    let local = distribute(comm, &ctx, global).unwrap();
                    let back = gather(comm, &ctx, &local, ctx.is_coordinator(comm).then_some(pv))
                        .unwrap();
                    (local, back)
                })
            })
            .collect();
        hs.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let gathered = results[root].1.clone().unwrap();
    for (rank, (_, back)) in results.iter().enumerate() {
        assert_eq!(back.is_some(), rank == root);
    }
    (results.into_iter().map(|(l, _)| l).collect(), gathered)
}

#[test]
fn structured_scatter_round_trips() {
    let grid = Grid::new(10, 10).unwrap();
    let field = Field::generate(grid);
    let pv = StructuredDecomposer::new(ProcessGrid::new(3, 3).unwrap())
        .decompose(grid, 9)
        .unwrap();
    let (locals, gathered) = round_trip(9, 0, field.values(), &pv);
    assert_eq!(gathered, field.values());
    let sizes: Vec<_> = locals.iter().map(Vec::len).collect();
    assert_eq!(sizes, pv.counts());
}

#[test]
fn local_values_keep_global_order() {
    // owners interleaved across 3 ranks, coordinator is rank 2
    let values: Vec<f64> = (0..12).map(f64::from).collect();
    let pv = PartitionVector::new((0..12).map(|i| i % 3).collect(), 3).unwrap();
    let (locals, gathered) = round_trip(3, 2, &values, &pv);
    assert_eq!(locals[0], vec![0.0, 3.0, 6.0, 9.0]);
    assert_eq!(locals[1], vec![1.0, 4.0, 7.0, 10.0]);
    assert_eq!(locals[2], vec![2.0, 5.0, 8.0, 11.0]);
    assert_eq!(gathered, values);
}

#[test]
fn rank_with_zero_cells_receives_an_empty_field() {
    let values = [1.0, 2.0, 3.0, 4.0];
    let pv = PartitionVector::new(vec![0, 0, 2, 2], 4).unwrap();
    let (locals, gathered) = round_trip(4, 0, &values, &pv);
    assert!(locals[1].is_empty());
    assert!(locals[3].is_empty());
    assert_eq!(gathered, values);
}

#[test]
fn coordinator_without_field_fails_everywhere() {
    let world = LocalComm::world(3);
    let ctx = CoordinatorContext::default();
    let results: Vec<_> = std::thread::scope(|s| {
        let hs: Vec<_> = world
            .iter()
            .map(|comm| s.spawn(move || (comm.rank(), distribute(comm, &ctx, None))))
            .collect();
        hs.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for (rank, result) in results {
        match result {
            Err(DecompError::MissingCoordinatorState { .. }) => assert_eq!(rank, 0),
            Err(DecompError::Remote(_)) => assert_ne!(rank, 0),
            other => panic!("rank {rank}: unexpected {other:?}"),
        }
    }
}

#[test]
fn partition_for_another_world_size_is_rejected() {
    let world = LocalComm::world(2);
    let ctx = CoordinatorContext::default();
    let values = [0.0; 6];
    let pv = PartitionVector::new(vec![0, 1, 2, 0, 1, 2], 3).unwrap();
    let results: Vec<_> = std::thread::scope(|s| {
        let hs: Vec<_> = world
            .iter()
            .map(|comm| {
                let (values, pv) = (&values, &pv);
                s.spawn(move || {
                    let global = ctx.is_coordinator(comm).then_some((&values[..], pv));
                    distribute(comm, &ctx, global)
                })
            })
            .collect();
        hs.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(
        results[0],
        Err(DecompError::ProcessCountMismatch {
            expected: 3,
            actual: 2
        })
    );
    assert!(results[1].is_err());
}
