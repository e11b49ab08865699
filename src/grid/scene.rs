//! Scene: the set of grids advanced together.

use crate::solver::{CalculatorPars, GlobalParameters, RECOMMENDED_TIME_STEP, SolverError};

use super::flux_grid::Grid;

/// Grids sharing one clock and one set of physical constants.
///
/// # Example
///
/// ```
/// use swe_flux::grid::{Grid, Scene};
/// use swe_flux::solver::GlobalParameters;
///
/// let mut scene = Scene::new(GlobalParameters::default()).unwrap();
/// let id = scene.add_grid(Grid::new(16, 16, 1.0, 1.0).unwrap());
/// assert_eq!(scene.num_grids(), 1);
/// assert_eq!(scene.grid(id).unwrap().domain_width(), 16);
/// ```
#[derive(Debug)]
pub struct Scene {
    grids: Vec<Grid>,
    globals: GlobalParameters,
    time: f64,
    recommended_time_step: f64,
}

impl Scene {
    /// Create an empty scene at time zero.
    pub fn new(globals: GlobalParameters) -> Result<Self, SolverError> {
        globals.validate()?;
        Ok(Self {
            grids: Vec::new(),
            globals,
            time: 0.0,
            recommended_time_step: RECOMMENDED_TIME_STEP,
        })
    }

    /// Add a grid and return its index. The grid's bottom cache is rebuilt for
    /// the scene gravity if needed.
    pub fn add_grid(&mut self, mut grid: Grid) -> usize {
        if grid.bottom().gravity() != self.globals.gravity {
            grid.set_gravity(self.globals.gravity);
        }
        self.grids.push(grid);
        self.grids.len() - 1
    }

    #[inline]
    pub fn num_grids(&self) -> usize {
        self.grids.len()
    }

    pub fn grid(&self, i: usize) -> Option<&Grid> {
        self.grids.get(i)
    }

    pub fn grid_mut(&mut self, i: usize) -> Option<&mut Grid> {
        self.grids.get_mut(i)
    }

    pub fn grids(&self) -> &[Grid] {
        &self.grids
    }

    pub fn grids_mut(&mut self) -> &mut [Grid] {
        &mut self.grids
    }

    /// Simulation time.
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn globals(&self) -> &GlobalParameters {
        &self.globals
    }

    /// Replace the physical constants, rebuilding bottom caches on a gravity change.
    pub fn set_globals(&mut self, globals: GlobalParameters) -> Result<(), SolverError> {
        globals.validate()?;
        if globals.gravity != self.globals.gravity {
            for g in &mut self.grids {
                g.set_gravity(globals.gravity);
            }
        }
        self.globals = globals;
        Ok(())
    }

    pub fn recommended_time_step(&self) -> f64 {
        self.recommended_time_step
    }

    pub fn set_recommended_time_step(&mut self, dt: f64) -> Result<(), SolverError> {
        CalculatorPars::new(self.time, dt)?;
        self.recommended_time_step = dt;
        Ok(())
    }

    /// Widest grid domain, used to size speed caches.
    pub fn max_domain_width(&self) -> usize {
        self.grids.iter().map(Grid::domain_width).max().unwrap_or(0)
    }

    /// Run every grid's post-step actions.
    pub fn run_actions(&mut self, pars: &CalculatorPars) {
        let globals = self.globals;
        for g in &mut self.grids {
            g.run_actions(pars, &globals);
        }
    }

    /// Finish a step: advance the clock, patch border corners of the freshly
    /// written buffers and make them current.
    pub fn proceed_to_next_step(&mut self, dt: f64) {
        self.time += dt;
        for g in &mut self.grids {
            g.fill_dest_corners();
            g.swap_surfaces();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_grid_syncs_gravity() {
        let mut scene = Scene::new(GlobalParameters::default().with_gravity(9.81)).unwrap();
        let mut grid = Grid::new(4, 4, 1.0, 1.0).unwrap();
        grid.set_bottom_constant(1.0, 10.0);
        let id = scene.add_grid(grid);
        assert_eq!(scene.grid(id).unwrap().bottom().gravity(), 9.81);
    }

    #[test]
    fn test_proceed_advances_time_and_swaps() {
        let mut scene = Scene::new(GlobalParameters::default()).unwrap();
        scene.add_grid(Grid::new(4, 4, 1.0, 1.0).unwrap());
        scene.grid_mut(0).unwrap().dest_surface_mut().h.set(2, 2, 1.0);
        scene.proceed_to_next_step(0.25);
        scene.proceed_to_next_step(0.25);
        assert_eq!(scene.time(), 0.5);
        assert_eq!(scene.grid(0).unwrap().dest_surface().h.get(2, 2), 1.0);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut scene = Scene::new(GlobalParameters::default()).unwrap();
        assert!(scene.set_recommended_time_step(0.0).is_err());
        assert!(scene.set_globals(GlobalParameters::default().with_gravity(-1.0)).is_err());
        assert!(Scene::new(GlobalParameters::default().with_h_min(-1.0)).is_err());
    }
}
