use crate::config::Config;
use crate::grid::Grid;
use crate::solver::{Solver, SweepStats};
use crate::visualisation::PotentialVisualiser;
use anyhow::Result;
use tracing::{debug, info, trace, warn};

/// When a run stops sweeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoppingPolicy {
    /// Exactly `sweeps` sweeps, whatever the field does.
    Fixed { sweeps: usize },
    /// Stop after the first sweep in which no cell changed by more than
    /// `tolerance`, or after `max_sweeps`.
    Tolerance { tolerance: f64, max_sweeps: usize },
}

impl StoppingPolicy {
    pub fn max_sweeps(&self) -> usize {
        match *self {
            StoppingPolicy::Fixed { sweeps } => sweeps,
            StoppingPolicy::Tolerance { max_sweeps, .. } => max_sweeps,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub sweeps: usize,
    pub final_sum: f64,
    pub last_max_delta: f64,
    pub converged: bool, // Only a tolerance policy can converge
}

pub struct Relaxation {
    pub grid: Grid,
    pub solver: Solver,
    pub policy: StoppingPolicy,
    report_period: usize,
    current_sweep: usize,
    last_stats: Option<SweepStats>,
}

impl Relaxation {
    /// Wrap a grid whose conductors have already been set.
    pub fn new(grid: Grid, solver: Solver, policy: StoppingPolicy) -> Self {
        Self {
            grid,
            solver,
            policy,
            report_period: 100,
            current_sweep: 0,
            last_stats: None,
        }
    }

    /// Build the grid, fix the outer then the inner conductor.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut grid =
            Grid::with_cavity(config.grid.nx, config.grid.ny, config.cavity.cavity())?;
        grid.set_outer(config.potentials.outer);
        grid.set_inner(config.potentials.inner);

        let relaxation = &config.relaxation;
        let solver = Solver::new(relaxation.footprint, relaxation.scheme);
        let policy = match relaxation.tolerance {
            Some(tolerance) => StoppingPolicy::Tolerance {
                tolerance,
                max_sweeps: relaxation.sweeps(),
            },
            None => StoppingPolicy::Fixed {
                sweeps: relaxation.sweeps(),
            },
        };

        let mut run = Self::new(grid, solver, policy);
        run.report_period = relaxation.report_period;
        Ok(run)
    }

    pub fn current_sweep(&self) -> usize {
        self.current_sweep
    }

    pub fn last_stats(&self) -> Option<SweepStats> {
        self.last_stats
    }

    fn has_converged(&self) -> bool {
        match (self.policy, self.last_stats) {
            (StoppingPolicy::Tolerance { tolerance, .. }, Some(stats)) => {
                stats.max_delta <= tolerance
            }
            _ => false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.current_sweep >= self.policy.max_sweeps() || self.has_converged()
    }

    pub fn step(&mut self) -> SweepStats {
        let stats = self.solver.sweep_with_stats(&mut self.grid);
        self.current_sweep += 1;
        self.last_stats = Some(stats);

        debug!(
            sweep = self.current_sweep,
            sum = stats.sum,
            max_delta = stats.max_delta,
            "sweep complete"
        );
        trace!("{}", self.grid);
        stats
    }

    pub fn run(&mut self) -> RunSummary {
        info!("Starting relaxation...");
        info!("Grid: {}x{}", self.grid.nx, self.grid.ny);
        info!("Interior cells: {}", self.grid.interior_count());
        info!("Policy: {:?}", self.policy);

        while !self.is_finished() {
            let stats = self.step();

            if self.current_sweep % self.report_period == 0 {
                info!(
                    "Sweep {}/{} (sum={:.4}, max delta={:.3e})",
                    self.current_sweep,
                    self.policy.max_sweeps(),
                    stats.sum,
                    stats.max_delta
                );
            }
        }

        let summary = self.summary();
        info!(
            "Relaxation complete after {} sweeps (sum={:.4})",
            summary.sweeps, summary.final_sum
        );
        summary
    }

    /// Run to completion, rendering the initial field, every
    /// `frame_interval` sweeps if given, and the final field.
    pub fn run_with_visualisation(
        &mut self,
        visualiser: &PotentialVisualiser,
        frame_interval: Option<usize>,
    ) -> RunSummary {
        info!("Starting relaxation with visualisation...");
        info!("Grid: {}x{}", self.grid.nx, self.grid.ny);
        info!("Policy: {:?}", self.policy);

        self.render(visualiser);
        let mut last_rendered = self.current_sweep;

        while !self.is_finished() {
            let stats = self.step();

            if let Some(interval) = frame_interval {
                if interval > 0 && self.current_sweep % interval == 0 {
                    self.render(visualiser);
                    last_rendered = self.current_sweep;
                }
            }

            if self.current_sweep % self.report_period == 0 {
                info!(
                    "Sweep {}/{} (sum={:.4})",
                    self.current_sweep,
                    self.policy.max_sweeps(),
                    stats.sum
                );
            }
        }

        if last_rendered != self.current_sweep {
            self.render(visualiser);
        }

        let summary = self.summary();
        info!("Relaxation complete after {} sweeps", summary.sweeps);
        summary
    }

    fn render(&self, visualiser: &PotentialVisualiser) {
        if let Err(e) = visualiser.plot_potential(&self.grid.snapshot(), self.current_sweep) {
            warn!("Failed to visualise sweep {}: {}", self.current_sweep, e);
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            sweeps: self.current_sweep,
            final_sum: self.grid.total_potential(),
            last_max_delta: self.last_stats.map_or(0.0, |stats| stats.max_delta),
            converged: self.has_converged(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{CavityFootprint, UpdateScheme};
    use approx::assert_relative_eq;

    fn reference_grid() -> Grid {
        let mut grid = Grid::new(10, 10, 3, 4, 3, 4).unwrap();
        grid.set_outer(0.0);
        grid.set_inner(100.0);
        grid
    }

    #[test]
    fn fixed_policy_runs_exact_sweep_count() {
        let mut run = Relaxation::new(
            reference_grid(),
            Solver::default(),
            StoppingPolicy::Fixed { sweeps: 1001 },
        );
        let summary = run.run();
        assert_eq!(summary.sweeps, 1001);
        assert!(!summary.converged);
        assert!(run.is_finished());
        assert_eq!(summary.final_sum, run.grid.total_potential());
        assert_relative_eq!(summary.final_sum, run.grid.snapshot().sum(), epsilon = 1e-9);
    }

    #[test]
    fn tolerance_policy_stops_early() {
        let mut run = Relaxation::new(
            reference_grid(),
            Solver::default(),
            StoppingPolicy::Tolerance {
                tolerance: 1e-9,
                max_sweeps: 10_000,
            },
        );
        let summary = run.run();
        assert!(summary.converged);
        assert!(summary.sweeps < 10_000);
        assert!(summary.last_max_delta <= 1e-9);
    }

    #[test]
    fn tolerance_policy_respects_max_sweeps() {
        let mut run = Relaxation::new(
            reference_grid(),
            Solver::new(CavityFootprint::Reference, UpdateScheme::Jacobi),
            StoppingPolicy::Tolerance {
                tolerance: 1e-12,
                max_sweeps: 3,
            },
        );
        let summary = run.run();
        assert_eq!(summary.sweeps, 3);
        assert!(!summary.converged);
    }

    #[test]
    fn from_config_fixes_both_conductors() {
        let mut config = Config::default();
        config.potentials.outer = 10.0;
        config.potentials.inner = 50.0;
        config.relaxation.n_runs = 4;

        let mut run = Relaxation::from_config(&config).unwrap();
        assert_eq!(run.grid.cell_value(0, 0).unwrap(), 10.0);
        assert_eq!(run.grid.cell_value(3, 3).unwrap(), 50.0);
        assert_eq!(run.policy, StoppingPolicy::Fixed { sweeps: 5 });

        let summary = run.run();
        assert_eq!(summary.sweeps, 5);
    }

    #[test]
    fn step_matches_direct_sweeps() {
        let mut run = Relaxation::new(
            reference_grid(),
            Solver::default(),
            StoppingPolicy::Fixed { sweeps: 3 },
        );
        let mut grid = reference_grid();
        for _ in 0..3 {
            let stats = run.step();
            let sum = crate::solver::sweep(&mut grid);
            assert_eq!(stats.sum, sum);
        }
        assert_eq!(run.grid.snapshot(), grid.snapshot());
        assert_eq!(run.current_sweep(), 3);
    }
}
