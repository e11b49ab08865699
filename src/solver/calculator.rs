//! The tile calculator interface and the row sweep shared by implementations.

use crate::grid::{Grid, Scene, SurfaceBandMut, SurfaceRowMut, TileInput};
use crate::types::Tile;

use super::SolverError;
use super::flux::{Cell, Coefficients, Flow, finalize, regime_flux};
use super::lanes::Real;
use super::params::{CalculatorPars, GlobalParameters};
use super::regime::{DryFaces, FlowRegime, NodeClass, classify_node};
use super::speed_cache::SpeedCache;
use super::stencil::RowStencil;

/// One explicit update of a rectangular tile of a grid.
///
/// A calculator owns private scratch state (its speed cache), so each worker
/// needs its own instance. The call order is `init_for_scene` once, then per
/// step `init` followed by any number of `process_*` calls.
pub trait TileCalculator: Send {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Size scratch buffers for the widest grid of `scene`.
    fn init_for_scene(&mut self, scene: &Scene);

    /// Copy the step parameters and physical constants for the coming step.
    fn init(&mut self, pars: &CalculatorPars, globals: &GlobalParameters) -> Result<(), SolverError>;

    /// Update `tile`, reading `input` and writing rows of `out`.
    ///
    /// The border ring around the tile must hold valid data in `input`.
    /// `out` must cover every row of the tile.
    fn process_band(
        &mut self,
        input: &TileInput<'_>,
        out: &mut SurfaceBandMut<'_>,
        tile: Tile,
    ) -> Result<(), SolverError>;

    /// Update `tile` of `grid`, from its current into its destination surface.
    fn process_tile(&mut self, grid: &mut Grid, tile: Tile) -> Result<(), SolverError> {
        let (input, dest) = grid.split_for_step();
        let mut band = dest.full_band_mut();
        self.process_band(&input, &mut band, tile)
    }
}

#[derive(Clone, Copy, Debug)]
struct StepState {
    pars: CalculatorPars,
    globals: GlobalParameters,
}

/// Parameters, speed cache and the row sweep common to every CPU calculator.
#[derive(Clone, Debug, Default)]
pub struct CalculatorCore {
    step: Option<StepState>,
    cache: SpeedCache,
}

impl CalculatorCore {
    pub fn reserve(&mut self, width: usize) {
        self.cache.ensure_width(width);
    }

    pub fn init(&mut self, pars: &CalculatorPars, globals: &GlobalParameters) -> Result<(), SolverError> {
        globals.validate()?;
        let pars = CalculatorPars::new(pars.time, pars.tau)?;
        self.step = Some(StepState {
            pars,
            globals: *globals,
        });
        Ok(())
    }

    /// Validate the call, then run `row` once per tile row with the stencil of
    /// that row.
    ///
    /// `row` receives the step coefficients, the stencil, the destination row
    /// and the tile's first column and width.
    pub fn sweep<F>(
        &mut self,
        input: &TileInput<'_>,
        out: &mut SurfaceBandMut<'_>,
        tile: Tile,
        mut row: F,
    ) -> Result<(), SolverError>
    where
        F: FnMut(&Coefficients<f64>, &RowStencil<'_>, &mut SurfaceRowMut<'_>, usize, usize),
    {
        let step = self.step.ok_or(SolverError::NotInitialized)?;
        input.validate(tile)?;
        let band = out.rows();
        if tile.height > 0 && (tile.y0 < band.start || tile.y_end() > band.end) {
            return Err(SolverError::dimension_mismatch(
                format!("output rows covering {:?}", tile.row_range()),
                format!("{band:?}"),
            ));
        }
        if out.width() != input.dims().0 {
            return Err(SolverError::dimension_mismatch(
                format!("output width {}", input.dims().0),
                format!("{}", out.width()),
            ));
        }
        let gravity = step.globals.gravity;
        if input.bottom.gravity() != gravity {
            return Err(SolverError::BottomGravityMismatch {
                bottom: input.bottom.gravity(),
                params: gravity,
            });
        }
        if tile.is_empty() {
            return Ok(());
        }

        let co = Coefficients::new(&step.globals, &step.pars, input.rcp_step_w, input.rcp_step_h);
        let surface = input.current;
        let (x0, y0) = (tile.x0 as isize, tile.y0 as isize);

        self.cache.ensure_width(tile.width);
        self.cache.fill(0, surface.h.line(y0 - 1, x0), tile.width, gravity);
        self.cache.fill(1, surface.h.line(y0, x0), tile.width, gravity);

        for ty in 0..tile.height {
            let y = y0 + ty as isize;
            self.cache.fill(ty + 2, surface.h.line(y + 1, x0), tile.width, gravity);
            let stencil = RowStencil::new(surface, input.bottom, &self.cache, y, x0, ty);
            let mut dest = out.row_mut(y as usize);
            row(&co, &stencil, &mut dest, tile.x0, tile.width);
        }
        Ok(())
    }
}

/// Flux and finalization of the node(s) at tile offset `x` for known regimes.
#[inline(always)]
pub(crate) fn update_node<T: Real>(
    co: &Coefficients<T>,
    st: &RowStencil<'_>,
    x: isize,
    u: Option<FlowRegime>,
    v: Option<FlowRegime>,
) -> Cell<T> {
    let arch = co.arch();
    let mut flow = Flow::filled(co.constant(0.0));
    if let Some(regime) = u {
        let (c, m, p) = st.x_axis::<T>(arch, x);
        flow.add_u(regime_flux(regime, co, co.k_w, co.k_w_quarter, &c, &m, &p));
    }
    if let Some(regime) = v {
        let (c, m, p) = st.y_axis::<T>(arch, x);
        flow.add_v(regime_flux(regime, co, co.k_h, co.k_h_quarter, &c, &m, &p));
    }
    finalize(co, st.cell::<T>(arch, x), flow)
}

/// Reference single-node update.
#[inline]
pub(crate) fn process_node(co: &Coefficients<f64>, st: &RowStencil<'_>, x: isize) -> Cell<f64> {
    let (h, left, right, up, down) = st.heights::<f64>((), x);
    let cur = st.cell::<f64>((), x);
    let faces = DryFaces::from_heights(left, right, up, down);
    match classify_node(h, cur.u, cur.v, st.speed::<f64>((), x), faces) {
        NodeClass::Isolated => Cell::zero(),
        NodeClass::Flux { u, v } => update_node(co, st, x, u, v),
    }
}

/// Write a node (or a batch of nodes) into a destination row.
#[inline(always)]
pub(crate) fn store_cell<T: Real>(cell: Cell<T>, row: &mut SurfaceRowMut<'_>, at: usize) {
    cell.h.store(row.h, at);
    cell.u.store(row.u, at);
    cell.v.store(row.v, at);
}
