//! Reflective coastline drawn as a straight segment inside the domain.
//!
//! The segment is rasterized onto domain cells. After each step every cell
//! on the line takes a weighted pair of cells on the water side of the line,
//! picked so the pair straddles the line normal through the cell. The end
//! cells copy their inner neighbour on the line. Several segments sharing end
//! points make a polygonal coast.

use crate::solver::{CalculatorPars, GlobalParameters, SolverError};

use super::{ActionContext, GridAction};

/// Shorter segments (in domain fractions) are rejected.
const MIN_LENGTH: f64 = 1e-5;

/// Pair of cells a line cell is interpolated from, relative to that cell.
///
/// The first word names the major axis of the line, the rest the quadrant the
/// pair opens into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wedge {
    HorizontalUpLeft,
    HorizontalUpRight,
    HorizontalDownLeft,
    HorizontalDownRight,
    VerticalUpLeft,
    VerticalUpRight,
    VerticalDownLeft,
    VerticalDownRight,
}

impl Wedge {
    /// Wedge for a line with unit direction `(dx, dy)` (y grows downward).
    pub fn for_direction(dx: f64, dy: f64) -> Self {
        use Wedge::*;
        const BY_OCTANT: [Wedge; 8] = [
            VerticalUpRight,
            HorizontalDownLeft,
            VerticalDownRight,
            HorizontalUpLeft,
            VerticalUpLeft,
            HorizontalDownRight,
            VerticalDownLeft,
            HorizontalUpRight,
        ];
        let mut octant = 0;
        if dx < -MIN_LENGTH || (dx.abs() < MIN_LENGTH && dy > MIN_LENGTH) {
            octant |= 2;
        }
        if dy < 0.0 {
            octant |= 4;
        }
        if dy.abs() > dx.abs() {
            octant |= 1;
        }
        BY_OCTANT[octant]
    }

    /// Offsets of the two source cells.
    pub fn offsets(self) -> [(isize, isize); 2] {
        use Wedge::*;
        match self {
            HorizontalUpLeft => [(-1, 0), (-1, -1)],
            HorizontalDownLeft => [(-1, 1), (-1, 0)],
            HorizontalUpRight => [(1, 0), (1, -1)],
            HorizontalDownRight => [(1, 1), (1, 0)],
            VerticalUpLeft => [(0, 1), (1, 1)],
            VerticalDownLeft => [(0, -1), (1, -1)],
            VerticalUpRight => [(-1, 1), (0, 1)],
            VerticalDownRight => [(-1, -1), (0, -1)],
        }
    }

    /// Interpolation weights of the two source cells for the line normal
    /// `(nx, ny)`. They always sum to one.
    pub fn weights(self, nx: f64, ny: f64) -> [f64; 2] {
        use Wedge::*;
        match self {
            HorizontalUpLeft => {
                let a = ny / nx;
                [1.0 - a, a]
            }
            HorizontalUpRight => {
                let a = ny / nx;
                [1.0 + a, -a]
            }
            HorizontalDownLeft => {
                let a = ny / nx;
                [-a, 1.0 + a]
            }
            HorizontalDownRight => {
                let a = ny / nx;
                [a, 1.0 - a]
            }
            VerticalUpLeft => {
                let a = nx / ny;
                [1.0 - a, a]
            }
            VerticalUpRight => {
                let a = nx / ny;
                [-a, 1.0 + a]
            }
            VerticalDownLeft => {
                let a = nx / ny;
                [1.0 + a, -a]
            }
            VerticalDownRight => {
                let a = nx / ny;
                [a, 1.0 - a]
            }
        }
    }
}

/// One line cell and where its value comes from.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Tap {
    cell: (isize, isize),
    from: [(isize, isize); 2],
    weights: [f64; 2],
}

/// Taps of the line rasterized for one domain size.
#[derive(Clone, Debug)]
struct Layout {
    dims: (usize, usize),
    taps: Vec<Tap>,
}

/// Reflective straight coastline between two points given as fractions of
/// the domain (`0..=1` on both axes).
///
/// Levels are carried as in [`BorderCopy`](super::BorderCopy): the source
/// water level is interpolated and put on the line cell's own bottom. A
/// non-positive result dries the cell.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReflectLine {
    from: (f64, f64),
    to: (f64, f64),
    #[cfg_attr(feature = "serde", serde(skip))]
    layout: Option<Layout>,
}

impl ReflectLine {
    pub fn new(from: (f64, f64), to: (f64, f64)) -> Result<Self, SolverError> {
        let finite = [from.0, from.1, to.0, to.1].iter().all(|c| c.is_finite());
        if !finite || (from.0 - to.0).abs() + (from.1 - to.1).abs() <= MIN_LENGTH {
            return Err(SolverError::InvalidParameter(format!(
                "reflect line needs two distinct finite end points, got {from:?} and {to:?}"
            )));
        }
        Ok(Self {
            from,
            to,
            layout: None,
        })
    }

    /// Closed polygon of segments through `points`, the last joined back to
    /// the first.
    pub fn polygon(points: &[(f64, f64)]) -> Result<Vec<Self>, SolverError> {
        if points.len() < 2 {
            return Err(SolverError::InvalidParameter(format!(
                "a coast polygon needs at least 2 points, got {}",
                points.len()
            )));
        }
        let mut prev = points[points.len() - 1];
        let mut lines = Vec::with_capacity(points.len());
        for &p in points {
            lines.push(Self::new(prev, p)?);
            prev = p;
        }
        Ok(lines)
    }

    /// Unit direction from `from` to `to`.
    fn direction(&self) -> (f64, f64) {
        let (dx, dy) = (self.to.0 - self.from.0, self.to.1 - self.from.1);
        let norm = dx.hypot(dy);
        (dx / norm, dy / norm)
    }

    /// Wedge used by the inner cells of the line.
    pub fn wedge(&self) -> Wedge {
        let (dx, dy) = self.direction();
        Wedge::for_direction(dx, dy)
    }

    /// Cells covered by the line on a `width x height` domain, from start to
    /// end, without consecutive repeats.
    pub fn cells(&self, width: usize, height: usize) -> Vec<(isize, isize)> {
        let lx = (self.from.0 - self.to.0).abs() * width as f64;
        let ly = (self.from.1 - self.to.1).abs() * height as f64;
        let steps = lx.hypot(ly) as usize + 2;
        let (w, h) = (width as isize, height as isize);

        let mut cells: Vec<(isize, isize)> = Vec::with_capacity(steps);
        for i in 0..steps {
            let t = i as f64 / (steps - 1) as f64;
            let at = |a: f64, b: f64, n: usize| ((a * (1.0 - t) + b * t) * (n as f64 - 1.0) + 0.5).floor() as isize;
            let cell = (at(self.from.0, self.to.0, width), at(self.from.1, self.to.1, height));
            let inside = (0..w).contains(&cell.0) && (0..h).contains(&cell.1);
            if inside && cells.last() != Some(&cell) {
                cells.push(cell);
            }
        }
        cells
    }

    fn layout(&self, dims: (usize, usize)) -> Layout {
        let cells = self.cells(dims.0, dims.1);
        let mut taps = Vec::with_capacity(cells.len());
        if cells.len() >= 2 {
            let (dx, dy) = self.direction();
            let (nx, ny) = (-dy, dx);
            let wedge = self.wedge();
            let weights = wedge.weights(nx, ny);
            let offsets = wedge.offsets();
            let (w, h) = (dims.0 as isize, dims.1 as isize);
            let inside = |(x, y): (isize, isize)| (0..w).contains(&x) && (0..h).contains(&y);

            let end = |cell, inner| Tap {
                cell,
                from: [inner, inner],
                weights: [0.5, 0.5],
            };
            taps.push(end(cells[0], cells[1]));
            for &cell in &cells[1..cells.len() - 1] {
                let from = offsets.map(|(ox, oy)| (cell.0 + ox, cell.1 + oy));
                if from.iter().all(|&c| inside(c)) {
                    taps.push(Tap { cell, from, weights });
                }
            }
            taps.push(end(cells[cells.len() - 1], cells[cells.len() - 2]));
        } else {
            log::warn!(
                "reflect line {:?} -> {:?} covers {} cell(s) of a {}x{} domain; ignored",
                self.from,
                self.to,
                cells.len(),
                dims.0,
                dims.1
            );
        }
        Layout { dims, taps }
    }
}

impl GridAction for ReflectLine {
    fn name(&self) -> &'static str {
        "reflect_line"
    }

    fn run(&mut self, ctx: &mut ActionContext<'_>, _pars: &CalculatorPars, _globals: &GlobalParameters) {
        let dims = ctx.dims();
        if self.layout.as_ref().is_none_or(|l| l.dims != dims) {
            self.layout = Some(self.layout(dims));
        }
        let Some(layout) = &self.layout else {
            return;
        };
        let bottom = ctx.bottom.height();
        let cur = ctx.current;
        for tap in &layout.taps {
            let (mut level, mut u, mut v) = (0.0, 0.0, 0.0);
            for ((x, y), w) in tap.from.into_iter().zip(tap.weights) {
                level += w * (cur.h.get(x, y) - bottom.get(x, y));
                u += w * cur.u.get(x, y);
                v += w * cur.v.get(x, y);
            }
            let (x, y) = tap.cell;
            let h = bottom.get(x, y) + level;
            let dest = &mut *ctx.dest;
            if h > 0.0 {
                dest.h.set(x, y, h);
                dest.u.set(x, y, u);
                dest.v.set(x, y, v);
            } else {
                dest.h.set(x, y, 0.0);
                dest.u.set(x, y, 0.0);
                dest.v.set(x, y, 0.0);
            }
        }
    }
}
