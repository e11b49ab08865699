//! Reference calculator: one node at a time.

use crate::grid::{Scene, SurfaceBandMut, TileInput};
use crate::types::Tile;

use super::SolverError;
use super::calculator::{CalculatorCore, TileCalculator, process_node, store_cell};
use super::params::{CalculatorPars, GlobalParameters};

/// Node-by-node flux-splitting update.
///
/// This is the numerical reference: the batch calculator and the device
/// kernel are checked against it.
///
/// # Example
///
/// ```
/// use swe_flux::grid::{Grid, Scene};
/// use swe_flux::solver::{CalculatorPars, GlobalParameters, ScalarCalculator, TileCalculator};
/// use swe_flux::types::Tile;
///
/// let mut scene = Scene::new(GlobalParameters::default()).unwrap();
/// let mut grid = Grid::new(8, 8, 1.0, 1.0).unwrap();
/// grid.set_bottom_constant(1.0, scene.globals().gravity);
/// grid.reset_to_zero_state();
/// scene.add_grid(grid);
///
/// let mut calc = ScalarCalculator::new();
/// calc.init_for_scene(&scene);
/// calc.init(&CalculatorPars::new(0.0, 0.01).unwrap(), scene.globals()).unwrap();
/// calc.process_tile(scene.grid_mut(0).unwrap(), Tile::full(8, 8)).unwrap();
/// ```
#[derive(Clone, Debug, Default)]
pub struct ScalarCalculator {
    core: CalculatorCore,
}

impl ScalarCalculator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TileCalculator for ScalarCalculator {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn init_for_scene(&mut self, scene: &Scene) {
        self.core.reserve(scene.max_domain_width());
    }

    fn init(&mut self, pars: &CalculatorPars, globals: &GlobalParameters) -> Result<(), SolverError> {
        self.core.init(pars, globals)
    }

    fn process_band(
        &mut self,
        input: &TileInput<'_>,
        out: &mut SurfaceBandMut<'_>,
        tile: Tile,
    ) -> Result<(), SolverError> {
        self.core.sweep(input, out, tile, |co, st, row, x0, width| {
            for tx in 0..width {
                store_cell(process_node(co, st, tx as isize), row, x0 + tx);
            }
        })
    }
}
