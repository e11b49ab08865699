//! Transparent border: extrapolate the surface level from the adjacent line.

use crate::solver::{CalculatorPars, GlobalParameters};
use crate::types::Side;

use super::{ActionContext, GridAction};

/// Copies the interior line next to one side into that side's border.
///
/// The water level (not the depth) is carried across, so a sloping bottom
/// under the border keeps the surface flat. Velocities are copied as is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BorderCopy {
    side: Side,
}

impl BorderCopy {
    pub fn new(side: Side) -> Self {
        Self { side }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Border cells of `side` for a `w x h` grid.
    fn border_cells(side: Side, w: usize, h: usize) -> Box<dyn Iterator<Item = (isize, isize)>> {
        let (w, h) = (w as isize, h as isize);
        match side {
            Side::Top => Box::new((0..w).map(|x| (x, -1))),
            Side::Bottom => Box::new((0..w).map(move |x| (x, h))),
            Side::Left => Box::new((0..h).map(|y| (-1, y))),
            Side::Right => Box::new((0..h).map(move |y| (w, y))),
        }
    }
}

impl GridAction for BorderCopy {
    fn name(&self) -> &'static str {
        "border_copy"
    }

    fn run(&mut self, ctx: &mut ActionContext<'_>, _pars: &CalculatorPars, _globals: &GlobalParameters) {
        let (w, h) = ctx.dims();
        let (dx, dy) = self.side.inward();
        let bottom = ctx.bottom.height();
        let dest = &mut *ctx.dest;
        for (x, y) in Self::border_cells(self.side, w, h) {
            let (sx, sy) = (x + dx, y + dy);
            let h_src = dest.h.get(sx, sy);
            let h_new = if h_src > 0.0 {
                ((h_src - bottom.get(sx, sy)) + bottom.get(x, y)).max(0.0)
            } else {
                0.0
            };
            let (u, v) = (dest.u.get(sx, sy), dest.v.get(sx, sy));
            dest.h.set(x, y, h_new);
            dest.u.set(x, y, u);
            dest.v.set(x, y, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::test_util::{Bench, pars};

    #[test]
    fn test_copies_level_on_flat_bottom() {
        let mut b = Bench::new(4, 3, 1.0, 9.81);
        b.dest.h.fill_with(|x, y| 1.0 + 0.1 * x as f64 + 0.01 * y as f64);
        b.dest.u.fill(0.4);
        b.dest.v.fill(-0.2);
        for side in Side::ALL {
            BorderCopy::new(side).run(&mut b.ctx(), &pars(0.0, 0.01), &GlobalParameters::default());
        }
        assert_eq!(b.dest.h.get(-1, 1), b.dest.h.get(0, 1));
        assert_eq!(b.dest.h.get(4, 2), b.dest.h.get(3, 2));
        assert_eq!(b.dest.h.get(2, -1), b.dest.h.get(2, 0));
        assert_eq!(b.dest.h.get(1, 3), b.dest.h.get(1, 2));
        assert_eq!(b.dest.u.get(-1, 0), 0.4);
        assert_eq!(b.dest.v.get(2, 3), -0.2);
    }

    #[test]
    fn test_level_follows_bottom_and_dry_stays_dry() {
        let mut b = Bench::new(3, 2, 0.0, 9.81);
        b.bottom = crate::grid::Bottom::from_fn(3, 2, 9.81, |x, _| if x < 0 { 0.5 } else { 2.0 });
        b.dest.h.fill(2.2);
        b.dest.h.set(0, 1, 0.0);
        BorderCopy::new(Side::Left).run(&mut b.ctx(), &pars(0.0, 0.01), &GlobalParameters::default());
        // Level 0.2 above the reference over a border depth of 0.5.
        approx::assert_relative_eq!(b.dest.h.get(-1, 0), 0.7, epsilon = 1e-12);
        assert_eq!(b.dest.h.get(-1, 1), 0.0);
    }
}
