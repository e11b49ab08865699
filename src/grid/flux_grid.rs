//! A single rectangular simulation grid.

use crate::boundary::{ActionContext, GridAction};
use crate::solver::{CalculatorPars, GlobalParameters, SolverError};
use crate::types::{Field2, Region, Tile};

use super::surface::{Bottom, Surface};

/// Smallest domain size accepted when resizing a grid.
pub const MIN_DOMAIN_SIZE: usize = 4;

/// Level-of-detail widths are rounded to multiples of this.
const LOD_GRANULARITY: usize = 16;

/// Read-only inputs of one step over a grid.
#[derive(Clone, Copy, Debug)]
pub struct TileInput<'a> {
    /// Surface produced by the previous step.
    pub current: &'a Surface,
    pub bottom: &'a Bottom,
    /// `1 / dx`
    pub rcp_step_w: f64,
    /// `1 / dy`
    pub rcp_step_h: f64,
}

impl TileInput<'_> {
    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        self.current.dims()
    }

    /// Check that `tile` lies inside the domain and that the surface and bottom
    /// agree in shape.
    pub fn validate(&self, tile: Tile) -> Result<(), SolverError> {
        let (w, h) = self.dims();
        if !tile.fits(w, h) {
            return Err(SolverError::TileOutOfBounds {
                tile,
                width: w,
                height: h,
            });
        }
        self.current.check_shape()?;
        let (bw, bh) = self.bottom.dims();
        if (bw, bh) != (w, h) {
            return Err(SolverError::dimension_mismatch(
                format!("bottom {w}x{h}"),
                format!("{bw}x{bh}"),
            ));
        }
        Ok(())
    }
}

/// Rectangular grid: double-buffered surfaces over a static bottom.
///
/// The current surface holds the state at the scene time; a step reads it and
/// writes the destination surface, then the scene swaps the two. Both buffers
/// always share shape and border.
///
/// # Example
///
/// ```
/// use swe_flux::grid::Grid;
///
/// let mut grid = Grid::new(32, 16, 1.0, 1.0).unwrap();
/// grid.set_bottom_constant(2.0, 10.0);
/// grid.reset_to_zero_state();
/// assert_eq!(grid.current_surface().h.get(5, 5), 2.0);
/// ```
#[derive(Debug)]
pub struct Grid {
    surfaces: [Surface; 2],
    current: usize,
    bottom: Bottom,
    base_step_w: f64,
    base_step_h: f64,
    step_w: f64,
    step_h: f64,
    rcp_step_w: f64,
    rcp_step_h: f64,
    actions: Vec<Box<dyn GridAction>>,
}

impl Grid {
    /// Create a dry grid over a flat bottom.
    ///
    /// # Arguments
    /// * `width`, `height` - Domain size in cells
    /// * `step_w`, `step_h` - Cell size
    pub fn new(width: usize, height: usize, step_w: f64, step_h: f64) -> Result<Self, SolverError> {
        if width == 0 || height == 0 {
            return Err(SolverError::InvalidParameter(format!(
                "grid must have at least one cell, got {width}x{height}"
            )));
        }
        if !(step_w > 0.0 && step_w.is_finite() && step_h > 0.0 && step_h.is_finite()) {
            return Err(SolverError::InvalidParameter(format!(
                "grid steps must be positive, got {step_w} x {step_h}"
            )));
        }
        Ok(Self {
            surfaces: [Surface::new(width, height), Surface::new(width, height)],
            current: 0,
            bottom: Bottom::flat(width, height, GlobalParameters::default().gravity),
            base_step_w: step_w,
            base_step_h: step_h,
            step_w,
            step_h,
            rcp_step_w: 1.0 / step_w,
            rcp_step_h: 1.0 / step_h,
            actions: Vec::new(),
        })
    }

    /// Create a grid whose interior covers `region`.
    pub fn with_region(width: usize, height: usize, region: Region) -> Result<Self, SolverError> {
        if width == 0 || height == 0 {
            return Err(SolverError::InvalidParameter(format!(
                "grid must have at least one cell, got {width}x{height}"
            )));
        }
        Self::new(
            width,
            height,
            region.width() / width as f64,
            region.height() / height as f64,
        )
    }

    #[inline]
    pub fn domain_width(&self) -> usize {
        self.surfaces[self.current].h.width()
    }

    #[inline]
    pub fn domain_height(&self) -> usize {
        self.surfaces[self.current].h.height()
    }

    #[inline]
    pub fn step_w(&self) -> f64 {
        self.step_w
    }

    #[inline]
    pub fn step_h(&self) -> f64 {
        self.step_h
    }

    #[inline]
    pub fn rcp_step_w(&self) -> f64 {
        self.rcp_step_w
    }

    #[inline]
    pub fn rcp_step_h(&self) -> f64 {
        self.rcp_step_h
    }

    /// Surface at the current scene time.
    pub fn current_surface(&self) -> &Surface {
        &self.surfaces[self.current]
    }

    pub fn current_surface_mut(&mut self) -> &mut Surface {
        &mut self.surfaces[self.current]
    }

    /// Surface the next step writes.
    pub fn dest_surface(&self) -> &Surface {
        &self.surfaces[1 - self.current]
    }

    pub fn dest_surface_mut(&mut self) -> &mut Surface {
        &mut self.surfaces[1 - self.current]
    }

    pub fn bottom(&self) -> &Bottom {
        &self.bottom
    }

    /// Replace the bottom. Its base resolution must match the grid's.
    pub fn set_bottom(&mut self, mut bottom: Bottom) -> Result<(), SolverError> {
        let (bw, bh) = bottom.base_dims();
        let (gw, gh) = self.base_dims();
        if (bw, bh) != (gw, gh) {
            return Err(SolverError::dimension_mismatch(
                format!("bottom {gw}x{gh}"),
                format!("{bw}x{bh}"),
            ));
        }
        bottom.resize(self.domain_width(), self.domain_height());
        self.bottom = bottom;
        Ok(())
    }

    /// Flat bottom `depth` below the reference level.
    pub fn set_bottom_constant(&mut self, depth: f64, gravity: f64) {
        let (w, h) = self.base_dims();
        let mut bottom = Bottom::from_fn(w, h, gravity, |_, _| depth);
        bottom.resize(self.domain_width(), self.domain_height());
        self.bottom = bottom;
    }

    /// Bottom from a function of world coordinates of cell centers.
    ///
    /// Border cells are sampled half a cell outside the domain.
    pub fn set_bottom_from_fn<F>(&mut self, gravity: f64, mut f: F)
    where
        F: FnMut(f64, f64) -> f64,
    {
        let (w, h) = self.base_dims();
        let (sw, sh) = (self.base_step_w, self.base_step_h);
        let mut bottom = Bottom::from_fn(w, h, gravity, |x, y| {
            f((x as f64 + 0.5) * sw, (y as f64 + 0.5) * sh)
        });
        bottom.resize(self.domain_width(), self.domain_height());
        self.bottom = bottom;
    }

    /// Rebuild the bottom cache for another gravity.
    pub fn set_gravity(&mut self, gravity: f64) {
        self.bottom.set_gravity(gravity);
    }

    /// Lake at rest: `h = max(0, bottom)` and zero velocity on both buffers.
    pub fn reset_to_zero_state(&mut self) {
        let bottom = self.bottom.height();
        for s in &mut self.surfaces {
            for (h, b) in s.h.as_mut_slice().iter_mut().zip(bottom.as_slice()) {
                *h = b.max(0.0);
            }
            s.u.fill(0.0);
            s.v.fill(0.0);
        }
    }

    /// Completely dry: every field zero on both buffers.
    pub fn reset_to_dry_state(&mut self) {
        for s in &mut self.surfaces {
            s.clear();
        }
    }

    /// Set both buffers (border included) from `f(x, y) -> (h, u, v)`.
    pub fn fill_state<F>(&mut self, mut f: F)
    where
        F: FnMut(isize, isize) -> (f64, f64, f64),
    {
        let (w, h) = (self.domain_width() as isize, self.domain_height() as isize);
        let [a, b] = &mut self.surfaces;
        for y in -1..=h {
            for x in -1..=w {
                let (hv, uv, vv) = f(x, y);
                for s in [&mut *a, &mut *b] {
                    s.h.set(x, y, hv);
                    s.u.set(x, y, uv);
                    s.v.set(x, y, vv);
                }
            }
        }
    }

    /// Full-resolution domain size.
    pub fn base_dims(&self) -> (usize, usize) {
        self.bottom.base_dims()
    }

    /// Resize the domain, resampling both buffers and the bottom.
    ///
    /// Cell sizes scale so the grid keeps covering the same region.
    pub fn set_domain_size(&mut self, width: usize, height: usize) -> Result<(), SolverError> {
        if width < MIN_DOMAIN_SIZE || height < MIN_DOMAIN_SIZE {
            return Err(SolverError::InvalidParameter(format!(
                "domain must be at least {MIN_DOMAIN_SIZE}x{MIN_DOMAIN_SIZE}, got {width}x{height}"
            )));
        }
        if (width, height) == (self.domain_width(), self.domain_height()) {
            return Ok(());
        }
        let (bw, bh) = self.base_dims();
        for s in &mut self.surfaces {
            *s = s.resampled(width, height);
        }
        self.bottom.resize(width, height);
        self.step_w = self.base_step_w * bw as f64 / width as f64;
        self.step_h = self.base_step_h * bh as f64 / height as f64;
        self.rcp_step_w = 1.0 / self.step_w;
        self.rcp_step_h = 1.0 / self.step_h;
        Ok(())
    }

    /// Resize to a fraction `level` of the base resolution.
    ///
    /// Widths snap to multiples of 16 cells; the height keeps the base aspect
    /// ratio.
    pub fn set_lod(&mut self, level: f64) -> Result<(), SolverError> {
        if !(level > 0.0 && level.is_finite()) {
            return Err(SolverError::InvalidParameter(format!(
                "level of detail must be positive, got {level}"
            )));
        }
        let (bw, bh) = self.base_dims();
        let g = LOD_GRANULARITY as f64;
        let snapped = (g * (bw as f64 * level / g).round()) as usize;
        let width = snapped.clamp(LOD_GRANULARITY.min(bw), bw);
        let height = ((bh * width + bw / 2) / bw).max(MIN_DOMAIN_SIZE.min(bh));
        self.set_domain_size(width, height)
    }

    /// Attach a post-step action.
    pub fn add_action(&mut self, action: Box<dyn GridAction>) {
        self.actions.push(action);
    }

    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }

    /// Run every post-step action against the destination surface.
    pub fn run_actions(&mut self, pars: &CalculatorPars, globals: &GlobalParameters) {
        if self.actions.is_empty() {
            return;
        }
        let mut actions = std::mem::take(&mut self.actions);
        {
            let (current, dest) = split_pair(&mut self.surfaces, self.current);
            let mut ctx = ActionContext {
                current,
                dest,
                bottom: &self.bottom,
                step_w: self.step_w,
                step_h: self.step_h,
                rcp_step_w: self.rcp_step_w,
                rcp_step_h: self.rcp_step_h,
            };
            for action in &mut actions {
                action.run(&mut ctx, pars, globals);
            }
        }
        self.actions = actions;
    }

    /// Read-only step inputs together with the destination surface.
    pub fn split_for_step(&mut self) -> (TileInput<'_>, &mut Surface) {
        let rcp_step_w = self.rcp_step_w;
        let rcp_step_h = self.rcp_step_h;
        let (current, dest) = split_pair(&mut self.surfaces, self.current);
        (
            TileInput {
                current,
                bottom: &self.bottom,
                rcp_step_w,
                rcp_step_h,
            },
            dest,
        )
    }

    /// Average the destination's border corners from their two edge neighbours.
    pub(crate) fn fill_dest_corners(&mut self) {
        let dest = self.dest_surface_mut();
        for f in [&mut dest.h, &mut dest.u, &mut dest.v] {
            fill_corners(f);
        }
    }

    /// Make the destination surface current.
    pub(crate) fn swap_surfaces(&mut self) {
        self.current = 1 - self.current;
    }
}

fn split_pair(surfaces: &mut [Surface; 2], current: usize) -> (&Surface, &mut Surface) {
    let [a, b] = surfaces;
    if current == 0 { (&*a, b) } else { (&*b, a) }
}

fn fill_corners(f: &mut Field2) {
    let w = f.width() as isize;
    let h = f.height() as isize;
    f.set(-1, -1, 0.5 * (f.get(0, -1) + f.get(-1, 0)));
    f.set(w, -1, 0.5 * (f.get(w - 1, -1) + f.get(w, 0)));
    f.set(-1, h, 0.5 * (f.get(0, h) + f.get(-1, h - 1)));
    f.set(w, h, 0.5 * (f.get(w - 1, h) + f.get(w, h - 1)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_state_follows_bottom() {
        let mut g = Grid::new(8, 6, 1.0, 1.0).unwrap();
        g.set_bottom_from_fn(10.0, |x, _| x - 2.0);
        g.reset_to_zero_state();
        let s = g.current_surface();
        assert_eq!(s.h.get(0, 0), 0.0);
        assert_eq!(s.h.get(5, 3), 3.5);
        assert_eq!(g.dest_surface().h.get(5, 3), 3.5);
        g.reset_to_dry_state();
        assert!(g.current_surface().h.interior().all(|h| h == 0.0));
    }

    #[test]
    fn test_swap_exchanges_buffers() {
        let mut g = Grid::new(4, 4, 1.0, 1.0).unwrap();
        g.dest_surface_mut().h.set(1, 1, 3.0);
        g.swap_surfaces();
        assert_eq!(g.current_surface().h.get(1, 1), 3.0);
        assert_eq!(g.dest_surface().h.get(1, 1), 0.0);
    }

    #[test]
    fn test_corner_averaging() {
        let mut g = Grid::new(4, 4, 1.0, 1.0).unwrap();
        {
            let d = g.dest_surface_mut();
            d.h.set(0, -1, 2.0);
            d.h.set(-1, 0, 4.0);
            d.u.set(3, 4, 1.0);
            d.u.set(4, 3, -1.0);
        }
        g.fill_dest_corners();
        assert_eq!(g.dest_surface().h.get(-1, -1), 3.0);
        assert_eq!(g.dest_surface().u.get(4, 4), 0.0);
    }

    #[test]
    fn test_domain_resize_keeps_extent() {
        let mut g = Grid::new(64, 32, 0.5, 0.5).unwrap();
        g.set_bottom_constant(1.0, 10.0);
        g.reset_to_zero_state();
        g.set_domain_size(32, 16).unwrap();
        assert_eq!(g.domain_width(), 32);
        assert_eq!(g.dest_surface().dims(), (32, 16));
        assert_eq!(g.bottom().dims(), (32, 16));
        assert_eq!(g.step_w(), 1.0);
        assert_eq!(g.rcp_step_h(), 1.0);
        assert_eq!(g.current_surface().h.get(10, 10), 1.0);
        assert!(g.set_domain_size(3, 16).is_err());
    }

    #[test]
    fn test_lod_snaps_to_granularity() {
        let mut g = Grid::new(128, 64, 1.0, 1.0).unwrap();
        g.set_lod(0.5).unwrap();
        assert_eq!((g.domain_width(), g.domain_height()), (64, 32));
        g.set_lod(0.01).unwrap();
        assert_eq!(g.domain_width(), 16);
        g.set_lod(1.0).unwrap();
        assert_eq!((g.domain_width(), g.domain_height()), (128, 64));
        assert!(g.set_lod(0.0).is_err());
    }

    #[test]
    fn test_input_validation() {
        let mut g = Grid::new(8, 8, 1.0, 1.0).unwrap();
        let (input, _) = g.split_for_step();
        assert!(input.validate(Tile::full(8, 8)).is_ok());
        assert!(matches!(
            input.validate(Tile::new(4, 0, 5, 8)),
            Err(SolverError::TileOutOfBounds { .. })
        ));
    }
}
