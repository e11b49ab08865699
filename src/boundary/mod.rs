//! Post-step grid actions.
//!
//! After the calculators have filled the interior of the destination surface,
//! each grid runs its actions in insertion order. Actions write the border
//! ring of the destination surface, except `ReflectLine` which overwrites the
//! interior cells on its line. They may read both surfaces.
//!
//! # Available Actions
//!
//! | Action | Side | Description |
//! |--------|------|-------------|
//! | `BorderCopy` | any | Transparent border: copy the adjacent interior line |
//! | `SineWaveGenerator` | left | Sinusoidal inflow level with a characteristic velocity |
//! | `WaterRise` | left | Level ramped linearly between two heights |
//! | `WaterWall` | right | Outflow wall driven by the adjacent column |
//! | `ReflectLine` | inside | Reflective straight coastline; chain them for a polygon |
//!
//! # Example
//!
//! ```
//! use swe_flux::boundary::{BorderCopy, SineWaveGenerator};
//! use swe_flux::grid::Grid;
//! use swe_flux::types::Side;
//!
//! let mut grid = Grid::new(32, 16, 1.0, 1.0).unwrap();
//! grid.add_action(Box::new(SineWaveGenerator::new(0.1, 0.5)));
//! for side in [Side::Top, Side::Bottom, Side::Right] {
//!     grid.add_action(Box::new(BorderCopy::new(side)));
//! }
//! assert_eq!(grid.num_actions(), 4);
//! ```

mod border_copy;
mod inflow;
mod reflect_line;
mod wall;

pub use border_copy::BorderCopy;
pub use inflow::{PhaseNoise, SineWaveGenerator, WaterRise};
pub use reflect_line::{ReflectLine, Wedge};
pub use wall::WaterWall;

use crate::grid::{Bottom, Surface};
use crate::solver::{CalculatorPars, GlobalParameters};

/// Everything an action may touch during one step.
pub struct ActionContext<'a> {
    /// State at the start of the step.
    pub current: &'a Surface,
    /// State being produced; interior already updated.
    pub dest: &'a mut Surface,
    pub bottom: &'a Bottom,
    pub step_w: f64,
    pub step_h: f64,
    pub rcp_step_w: f64,
    pub rcp_step_h: f64,
}

impl ActionContext<'_> {
    /// Interior `(width, height)` of the grid.
    pub fn dims(&self) -> (usize, usize) {
        self.dest.dims()
    }
}

/// A boundary treatment run once per step after the interior update.
pub trait GridAction: Send + std::fmt::Debug {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Write the border of `ctx.dest` for the step described by `pars`.
    fn run(&mut self, ctx: &mut ActionContext<'_>, pars: &CalculatorPars, globals: &GlobalParameters);
}

/// Velocity below `min_speed` in magnitude snaps to zero.
#[inline]
pub(crate) fn snap_speed(u: f64, min_speed: f64) -> f64 {
    if u.abs() <= min_speed { 0.0 } else { u }
}
