//! Flux-splitting solver components.
//!
//! # Submodules
//!
//! - [`params`]: Physical constants and per-step parameters
//! - [`regime`]: Flow regime tags and node classification
//! - [`lanes`]: Scalar/four-lane arithmetic shared by the calculators
//! - [`flux`]: The per-regime flux formulas and the finalization step
//! - [`speed_cache`]: Three-row cyclic wave-speed cache
//! - [`diagnostics`]: Volume, momentum and bound diagnostics
//!
//! # Calculators
//!
//! The [`TileCalculator`] trait updates one tile of a grid for one step:
//!
//! - [`ScalarCalculator`]: Node-by-node reference implementation
//! - [`BatchCalculator`]: Four nodes at a time, falling back to the scalar path
//!   whenever the lanes would branch differently

mod batch;
mod calculator;
pub mod diagnostics;
mod error;
pub mod flux;
pub mod lanes;
pub mod params;
pub mod regime;
mod scalar;
pub mod speed_cache;
mod stencil;
mod timestep;

pub use batch::{BatchCalculator, BatchClass, BatchStats, classify_batch};
pub use calculator::{CalculatorCore, TileCalculator};
pub use diagnostics::{DiagnosticsTracker, SurfaceDiagnostics};
pub use error::SolverError;
pub use flux::{Cell, Coefficients};
pub use lanes::{F64x4, LANES, Mask4, Real};
pub use params::{CalculatorPars, GlobalParameters, RECOMMENDED_TIME_STEP};
pub use regime::{DryFaces, FlowRegime, NodeClass, classify_node};
pub use scalar::ScalarCalculator;
pub use speed_cache::SpeedCache;
pub use stencil::RowStencil;
pub use timestep::{max_wave_speed, stable_time_step};
