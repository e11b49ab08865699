//! Outflow wall on the right border.

use crate::solver::{CalculatorPars, GlobalParameters};

use super::{ActionContext, GridAction};

/// Right-border column driven by the last interior column.
///
/// The wave speed in the border relaxes toward `c_left + U_left / 2` and the
/// border height follows from it. The normal velocity is held at zero and the
/// tangential velocity is taken from the freshly updated neighbour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaterWall;

impl WaterWall {
    pub fn new() -> Self {
        Self
    }
}

impl GridAction for WaterWall {
    fn name(&self) -> &'static str {
        "water_wall"
    }

    fn run(&mut self, ctx: &mut ActionContext<'_>, pars: &CalculatorPars, globals: &GlobalParameters) {
        let (w, h) = ctx.dims();
        let (x, g) = (w as isize, globals.gravity);
        for y in 0..h as isize {
            let h_left = ctx.current.h.get(x - 1, y);
            let u_left = ctx.current.u.get(x - 1, y);
            let speed_left = (g * h_left).sqrt();
            let speed = (g * ctx.current.h.get(x, y)).sqrt();

            let rcp_dt = (speed_left + 0.75 * u_left) * ctx.rcp_step_w;
            let speed_new = speed + pars.tau * (speed_left + 0.5 * u_left - speed) * rcp_dt;
            let h_new = speed_new * speed_new / g;

            if h_new > 0.0 {
                let v = ctx.dest.v.get(x - 1, y);
                ctx.dest.h.set(x, y, h_new);
                ctx.dest.v.set(x, y, v);
            } else {
                ctx.dest.h.set(x, y, 0.0);
                ctx.dest.v.set(x, y, 0.0);
            }
            ctx.dest.u.set(x, y, 0.0);
        }
    }
}
