//! Relaxation solver for the electrostatic potential between an outer
//! rectangular conductor and a rectangular inner conductor.
//!
//! A [`grid::Grid`] holds the discretised domain; the conductors are fixed
//! with `set_outer` and `set_inner`, then repeated [`solver::Solver`] sweeps
//! replace each interior potential with the mean of its four neighbours.

pub mod config;
pub mod error;
pub mod grid;
pub mod relaxation;
pub mod solver;
pub mod visualisation;

pub use error::RelaxError;
pub use grid::{Cavity, Cell, CellKind, Grid};
pub use relaxation::{Relaxation, RunSummary, StoppingPolicy};
pub use solver::{sweep, CavityFootprint, Solver, SweepStats, UpdateScheme};
