use crate::grid::{Cavity, CellKind, Grid};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Which cells inside the cavity rectangle are excluded from relaxation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CavityFootprint {
    /// Rows `x..=x+w-1`, columns `y..=y+w-1`. The column bound reuses the
    /// row extent, which is how the published reference results were made.
    #[default]
    Reference,
    /// Rows `x..=x+w-1`, columns `y..=y+h-1`.
    Rectangular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateScheme {
    /// In-place update; cells already visited this sweep feed later cells.
    #[default]
    GaussSeidel,
    /// Every cell is computed from the previous sweep's values, in parallel.
    Jacobi,
}

/// Outcome of a single sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepStats {
    /// Sum of all potentials after the sweep.
    pub sum: f64,
    /// Largest absolute change of any relaxed cell.
    pub max_delta: f64,
}

/// Five-point Laplacian relaxation. Holds only its options; all field state
/// lives in the [`Grid`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Solver {
    pub footprint: CavityFootprint,
    pub scheme: UpdateScheme,
}

impl Solver {
    pub fn new(footprint: CavityFootprint, scheme: UpdateScheme) -> Self {
        Self { footprint, scheme }
    }

    /// One relaxation sweep. Returns the sum of all potentials afterwards.
    pub fn sweep(&self, grid: &mut Grid) -> f64 {
        self.sweep_with_stats(grid).sum
    }

    pub fn sweep_with_stats(&self, grid: &mut Grid) -> SweepStats {
        let max_delta = match self.scheme {
            UpdateScheme::GaussSeidel => self.sweep_gauss_seidel(grid),
            UpdateScheme::Jacobi => self.sweep_jacobi_parallel(grid),
        };

        SweepStats {
            sum: grid.total_potential(),
            max_delta,
        }
    }

    /// True if the sweep recomputes cell `(i, j)`.
    pub fn is_relaxed(&self, grid: &Grid, i: usize, j: usize) -> bool {
        if grid.on_edge(i, j) {
            return false;
        }
        if grid.cells()[[i, j]].kind == CellKind::Boundary {
            return false;
        }
        !self.in_cavity(grid.cavity(), i, j)
    }

    fn in_cavity(&self, cavity: Cavity, i: usize, j: usize) -> bool {
        let col_end = match self.footprint {
            CavityFootprint::Reference => cavity.y + cavity.w - 1,
            CavityFootprint::Rectangular => cavity.y_end(),
        };
        (cavity.x..=cavity.x_end()).contains(&i) && (cavity.y..=col_end).contains(&j)
    }

    fn sweep_gauss_seidel(&self, grid: &mut Grid) -> f64 {
        let nx = grid.nx;
        let ny = grid.ny;
        let mut max_delta = 0.0_f64;

        // Columns outer, rows inner
        for j in 0..ny {
            for i in 0..nx {
                if !self.is_relaxed(grid, i, j) {
                    continue;
                }

                let cells = grid.cells_mut();
                let relaxed = (cells[[i - 1, j]].potential
                    + cells[[i, j + 1]].potential
                    + cells[[i, j - 1]].potential
                    + cells[[i + 1, j]].potential)
                    / 4.0;
                max_delta = max_delta.max((relaxed - cells[[i, j]].potential).abs());
                cells[[i, j]].potential = relaxed;
            }
        }

        max_delta
    }

    fn sweep_jacobi_parallel(&self, grid: &mut Grid) -> f64 {
        let nx = grid.nx;
        let ny = grid.ny;
        let previous = grid.snapshot();

        let frozen: &Grid = grid;
        let indices: Vec<(usize, usize)> = (0..ny)
            .flat_map(|j| (0..nx).map(move |i| (i, j)))
            .filter(|&(i, j)| self.is_relaxed(frozen, i, j))
            .collect();

        let updates: Vec<(usize, usize, f64)> = indices
            .par_iter()
            .map(|&(i, j)| {
                let relaxed = (previous[[i - 1, j]]
                    + previous[[i, j + 1]]
                    + previous[[i, j - 1]]
                    + previous[[i + 1, j]])
                    / 4.0;
                (i, j, relaxed)
            })
            .collect();

        // Apply updates
        let mut max_delta = 0.0_f64;
        let cells = grid.cells_mut();
        for (i, j, relaxed) in updates {
            max_delta = max_delta.max((relaxed - previous[[i, j]]).abs());
            cells[[i, j]].potential = relaxed;
        }
        max_delta
    }
}

/// Sweep with the default solver: in-place update, reference cavity footprint.
pub fn sweep(grid: &mut Grid) -> f64 {
    Solver::default().sweep(grid)
}
