// tests/relaxation.rs
//
// Whole-run checks on the relaxed field.
// Run with: cargo test --test relaxation

use approx::assert_relative_eq;
use laplace_relaxation::config::Config;
use laplace_relaxation::grid::{CellKind, Grid};
use laplace_relaxation::relaxation::{Relaxation, StoppingPolicy};
use laplace_relaxation::solver::{sweep, CavityFootprint, Solver, UpdateScheme};

fn reference_grid() -> Grid {
    let mut grid = Grid::new(10, 10, 3, 4, 3, 4).unwrap();
    grid.set_outer(0.0);
    grid.set_inner(100.0);
    grid
}

#[test]
fn sum_is_non_decreasing_and_bounded() {
    let mut grid = Grid::new(12, 9, 4, 3, 3, 2).unwrap();
    grid.set_outer(100.0);
    grid.set_inner(40.0);

    let bound = 100.0 * 12.0 * 9.0;
    let mut previous = grid.total_potential();
    for n in 0..500 {
        let sum = sweep(&mut grid);
        assert!(
            sum >= previous - 1e-9,
            "sum decreased at sweep {}: {} -> {}",
            n,
            previous,
            sum
        );
        assert!(sum <= bound);
        previous = sum;
    }
}

#[test]
fn equal_conductors_relax_to_a_constant_field() {
    let mut grid = Grid::new(10, 10, 3, 4, 3, 4).unwrap();
    grid.set_outer(100.0);
    grid.set_inner(100.0);
    let solver = Solver::default();

    for _ in 0..2000 {
        solver.sweep(&mut grid);
    }
    for row in 0..10 {
        for col in 0..10 {
            if solver.is_relaxed(&grid, row, col) {
                assert_relative_eq!(grid.cell_value(row, col).unwrap(), 100.0, epsilon = 1e-9);
            }
        }
    }
}

#[test]
fn converged_field_is_discrete_harmonic_and_symmetric() {
    let mut run = Relaxation::new(
        reference_grid(),
        Solver::default(),
        StoppingPolicy::Tolerance {
            tolerance: 1e-12,
            max_sweeps: 20_000,
        },
    );
    let summary = run.run();
    assert!(summary.converged);

    let p = run.grid.snapshot();
    for row in 0..10 {
        for col in 0..10 {
            if run.solver.is_relaxed(&run.grid, row, col) {
                let mean =
                    (p[[row - 1, col]] + p[[row + 1, col]] + p[[row, col - 1]] + p[[row, col + 1]])
                        / 4.0;
                assert_relative_eq!(p[[row, col]], mean, epsilon = 1e-9);
                assert!(p[[row, col]] > 0.0 && p[[row, col]] < 100.0);
            }
            // Square box, centred square conductor
            assert_relative_eq!(p[[row, col]], p[[col, row]], epsilon = 1e-9);
            assert_relative_eq!(p[[row, col]], p[[9 - row, col]], epsilon = 1e-9);
        }
    }
}

#[test]
fn jacobi_and_gauss_seidel_reach_the_same_field() {
    let mut gauss_seidel = reference_grid();
    let mut jacobi = reference_grid();
    let parallel = Solver::new(CavityFootprint::Reference, UpdateScheme::Jacobi);

    for _ in 0..3000 {
        sweep(&mut gauss_seidel);
        parallel.sweep(&mut jacobi);
    }
    let a = gauss_seidel.snapshot();
    let b = jacobi.snapshot();
    for (x, y) in a.iter().zip(b.iter()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-9);
    }
}

#[test]
fn reference_run_keeps_conductors_fixed() {
    let mut run = Relaxation::from_config(&Config::default()).unwrap();
    let summary = run.run();
    assert_eq!(summary.sweeps, 1001);

    let grid = &run.grid;
    for row in 0..10 {
        for col in 0..10 {
            let on_frame = row == 0 || col == 0 || row == 9 || col == 9;
            let on_cavity = (3..=6).contains(&row)
                && (3..=6).contains(&col)
                && (row == 3 || row == 6 || col == 3 || col == 6);
            let value = grid.cell_value(row, col).unwrap();
            if on_frame {
                assert_eq!(value, 0.0);
                assert_eq!(grid.cell_kind(row, col).unwrap(), CellKind::Boundary);
            } else if on_cavity {
                assert_eq!(value, 100.0);
                assert_eq!(grid.cell_kind(row, col).unwrap(), CellKind::Boundary);
            }
        }
    }
    // Cavity interior is never relaxed and keeps its initial potential
    for row in 4..=5 {
        for col in 4..=5 {
            assert_eq!(grid.cell_kind(row, col).unwrap(), CellKind::Interior);
            assert_eq!(grid.cell_value(row, col).unwrap(), 0.0);
        }
    }
}

#[test]
fn sample_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml");
    let config = Config::from_file(path).unwrap();
    let mut run = Relaxation::from_config(&config).unwrap();
    assert_eq!(run.policy.max_sweeps(), config.relaxation.sweeps());
    let summary = run.run();
    assert!(summary.sweeps >= 1);
}
