//! Error types for the flux solver and its dispatchers.

use thiserror::Error;

use crate::types::Tile;

/// Errors reported by calculators, grids and step realizations.
///
/// Numeric guards inside a step (height clamping, velocity snapping, the
/// `h_min` floor) are part of the scheme and never produce an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// A tile was processed before `init` supplied step parameters.
    #[error("calculator used before init: step parameters are not set")]
    NotInitialized,

    /// Degenerate time step.
    #[error("invalid time step: tau must be positive and finite, got {0}")]
    InvalidTimeStep(f64),

    /// Tile does not lie inside the grid domain.
    #[error("tile {tile:?} exceeds the {width}x{height} grid domain")]
    TileOutOfBounds {
        tile: Tile,
        width: usize,
        height: usize,
    },

    /// Buffer shapes do not agree.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Invalid global parameter, grid size or configuration value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Bottom precomputation used another gravity than the current parameters.
    #[error("bottom was precomputed with gravity {bottom}, parameters use {params}")]
    BottomGravityMismatch { bottom: f64, params: f64 },

    /// The requested realization cannot be used.
    #[error("realization unavailable: {0}")]
    Unavailable(String),

    /// Device/backend initialization failed.
    #[error("backend initialization failed: {0}")]
    BackendInit(String),

    /// Building the device program failed.
    #[error("kernel build failed: {0}")]
    KernelBuild(String),

    /// Host/device transfer failed.
    #[error("data transfer failed: {0}")]
    DataTransfer(String),

    /// Worker pool construction failed.
    #[error("thread pool: {0}")]
    ThreadPool(String),
}

impl SolverError {
    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Whether the error is a setup failure of a realization, as opposed to a
    /// caller error. Setup failures are what the fallback chain skips past.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_)
                | Self::BackendInit(_)
                | Self::KernelBuild(_)
                | Self::DataTransfer(_)
                | Self::ThreadPool(_)
        )
    }
}

#[cfg(feature = "parallel")]
impl From<rayon::ThreadPoolBuildError> for SolverError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool(e.to_string())
    }
}
