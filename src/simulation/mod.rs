//! Simulation runner.
//!
//! Ties a [`Scene`](crate::grid::Scene) to a step realization and drives it:
//! - time step selection (fixed, CFL-limited or the scene's recommendation)
//! - per-grid diagnostics at a configurable interval
//! - run statistics
//!
//! # Example
//! ```
//! use swe_flux::dispatch::{SolverConfig, SolverKind};
//! use swe_flux::grid::{Grid, Scene};
//! use swe_flux::simulation::{Simulation, SimulationConfig};
//! use swe_flux::solver::GlobalParameters;
//!
//! let mut scene = Scene::new(GlobalParameters::default()).unwrap();
//! let mut grid = Grid::new(16, 16, 1.0, 1.0).unwrap();
//! grid.set_bottom_constant(1.0, 10.0);
//! grid.reset_to_zero_state();
//! scene.add_grid(grid);
//!
//! let mut sim = Simulation::with_solver(scene, &SolverConfig::new(SolverKind::Batch))
//!     .unwrap()
//!     .with_config(SimulationConfig::default().with_cfl(0.5));
//! let result = sim.run(10);
//! assert!(result.is_success());
//! ```

mod runner;

pub use runner::{Simulation, SimulationConfig, SimulationResult};
