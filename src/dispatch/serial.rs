//! Single-threaded realization.

use crate::grid::Scene;
use crate::solver::{CalculatorPars, SolverError, TileCalculator};
use crate::types::Tile;

use super::StepMethod;

/// Runs one calculator over every grid on the calling thread.
#[derive(Debug)]
pub struct SerialMethod<C> {
    calc: C,
}

impl<C: TileCalculator + Default> SerialMethod<C> {
    pub fn new(scene: &Scene) -> Self {
        let mut calc = C::default();
        calc.init_for_scene(scene);
        Self { calc }
    }

    pub fn calculator(&self) -> &C {
        &self.calc
    }
}

impl<C: TileCalculator + Default> StepMethod for SerialMethod<C> {
    fn name(&self) -> &'static str {
        self.calc.name()
    }

    fn step(&mut self, scene: &mut Scene, dt: f64) -> Result<(), SolverError> {
        let pars = CalculatorPars::new(scene.time(), dt)?;
        self.calc.init(&pars, scene.globals())?;
        for grid in scene.grids_mut() {
            let tile = Tile::full(grid.domain_width(), grid.domain_height());
            self.calc.process_tile(grid, tile)?;
        }
        scene.run_actions(&pars);
        scene.proceed_to_next_step(dt);
        Ok(())
    }
}
