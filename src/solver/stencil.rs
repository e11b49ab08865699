//! Row stencil: the three field rows around the row being updated.

use crate::grid::{Bottom, Surface};
use crate::types::FieldLine;

use super::flux::{Cell, Sample};
use super::lanes::Real;
use super::speed_cache::SpeedCache;

const UP: usize = 0;
const MID: usize = 1;
const DN: usize = 2;

/// Cursors on rows `y - 1`, `y` and `y + 1` of every input field, all
/// anchored at the tile's first column so offsets are tile-relative.
pub struct RowStencil<'a> {
    h: [FieldLine<'a>; 3],
    u: [FieldLine<'a>; 3],
    v: [FieldLine<'a>; 3],
    hb: [FieldLine<'a>; 3],
    hbs: [FieldLine<'a>; 3],
    c: [FieldLine<'a>; 3],
}

impl<'a> RowStencil<'a> {
    /// Stencil for grid row `y`, tile row `ty`, tile starting at column `x0`.
    pub fn new(
        surface: &'a Surface,
        bottom: &'a Bottom,
        speeds: &'a SpeedCache,
        y: isize,
        x0: isize,
        ty: usize,
    ) -> Self {
        let rows = [y - 1, y, y + 1];
        Self {
            h: rows.map(|r| surface.h.line(r, x0)),
            u: rows.map(|r| surface.u.line(r, x0)),
            v: rows.map(|r| surface.v.line(r, x0)),
            hb: rows.map(|r| bottom.height().line(r, x0)),
            hbs: rows.map(|r| bottom.precomputed().line(r, x0)),
            c: [speeds.line(ty), speeds.line(ty + 1), speeds.line(ty + 2)],
        }
    }

    /// Heights of the node at `x` and its four face neighbours:
    /// `(center, left, right, up, down)`.
    #[inline(always)]
    pub fn heights<T: Real>(&self, arch: T::Arch, x: isize) -> (T, T, T, T, T) {
        (
            T::load(arch, &self.h[MID], x),
            T::load(arch, &self.h[MID], x - 1),
            T::load(arch, &self.h[MID], x + 1),
            T::load(arch, &self.h[UP], x),
            T::load(arch, &self.h[DN], x),
        )
    }

    #[inline(always)]
    pub fn cell<T: Real>(&self, arch: T::Arch, x: isize) -> Cell<T> {
        Cell {
            h: T::load(arch, &self.h[MID], x),
            u: T::load(arch, &self.u[MID], x),
            v: T::load(arch, &self.v[MID], x),
        }
    }

    #[inline(always)]
    pub fn speed<T: Real>(&self, arch: T::Arch, x: isize) -> T {
        T::load(arch, &self.c[MID], x)
    }

    #[inline(always)]
    fn sample<T: Real>(
        &self,
        arch: T::Arch,
        row: usize,
        x: isize,
        normal: &[FieldLine<'a>; 3],
        tangent: &[FieldLine<'a>; 3],
    ) -> Sample<T> {
        Sample {
            h: T::load(arch, &self.h[row], x),
            n: T::load(arch, &normal[row], x),
            t: T::load(arch, &tangent[row], x),
            hb: T::load(arch, &self.hb[row], x),
            hbs: T::load(arch, &self.hbs[row], x),
            c: T::load(arch, &self.c[row], x),
        }
    }

    /// `(center, left, right)` seen along x.
    #[inline(always)]
    pub fn x_axis<T: Real>(&self, arch: T::Arch, x: isize) -> (Sample<T>, Sample<T>, Sample<T>) {
        (
            self.sample(arch, MID, x, &self.u, &self.v),
            self.sample(arch, MID, x - 1, &self.u, &self.v),
            self.sample(arch, MID, x + 1, &self.u, &self.v),
        )
    }

    /// `(center, up, down)` seen along y.
    #[inline(always)]
    pub fn y_axis<T: Real>(&self, arch: T::Arch, x: isize) -> (Sample<T>, Sample<T>, Sample<T>) {
        (
            self.sample(arch, MID, x, &self.v, &self.u),
            self.sample(arch, UP, x, &self.v, &self.u),
            self.sample(arch, DN, x, &self.v, &self.u),
        )
    }
}
