//! Error types for grid construction and cell access.

use thiserror::Error;

/// Errors raised by the relaxation core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelaxError {
    /// Grid or cavity dimensions that cannot describe a valid domain.
    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    /// Cell index outside the grid.
    #[error("Index ({row}, {col}) is outside grid bounds ({nx}, {ny})")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        nx: usize,
        ny: usize,
    },
}

impl RelaxError {
    pub fn invalid_geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RelaxError>;
