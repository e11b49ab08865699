//! Batched calculator: four adjacent nodes per step when they agree.
//!
//! Each batch of [`LANES`] horizontally adjacent nodes is classified first:
//!
//! - **Uniform**: every node and every face neighbour is wet and all lanes share
//!   the same regime per axis. The flux formulas run on all lanes at once.
//! - **Dry**: every node and every face neighbour is dry. The batch is a fixed
//!   point and zeros are written.
//! - **Fallback**: anything else. Each node goes through the scalar path.
//!
//! Both paths evaluate the same generic formulas, so the output is bit-for-bit
//! identical to the scalar calculator.

use pulp::{Arch, Simd, WithSimd};

use crate::grid::{Scene, SurfaceBandMut, SurfaceRowMut, TileInput};
use crate::types::Tile;

use super::SolverError;
use super::calculator::{CalculatorCore, TileCalculator, process_node, store_cell, update_node};
use super::flux::{Cell, Coefficients};
use super::lanes::{F64x4, LANES};
use super::params::{CalculatorPars, GlobalParameters};
use super::regime::FlowRegime;
use super::stencil::RowStencil;

/// Outcome of classifying one batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchClass {
    /// All lanes take the same branch: regimes per axis.
    Uniform { u: FlowRegime, v: FlowRegime },
    /// All lanes are isolated dry nodes.
    Dry,
    /// Lanes disagree; run the scalar path per node.
    Fallback,
}

/// Counters of how batches were processed since the last `init`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub uniform: usize,
    pub dry: usize,
    pub fallback: usize,
    /// Nodes past the last full batch of a row, done by the scalar path.
    pub tail_nodes: usize,
}

/// Classify the batch starting at tile offset `x`.
///
/// Thresholds are the scalar ones, evaluated lane by lane.
pub fn classify_batch(st: &RowStencil<'_>, x: isize) -> BatchClass {
    let heights: [(f64, f64, f64, f64, f64); LANES] =
        std::array::from_fn(|i| st.heights::<f64>((), x + i as isize));
    let every = |pred: fn(f64) -> bool| {
        heights
            .iter()
            .all(|&(h, left, right, up, down)| [h, left, right, up, down].into_iter().all(pred))
    };
    if every(|h| h > 0.0) {
        let first = lane_regimes(st, x);
        let uniform = (1..LANES as isize).all(|i| lane_regimes(st, x + i) == first);
        return if uniform {
            BatchClass::Uniform {
                u: first.0,
                v: first.1,
            }
        } else {
            BatchClass::Fallback
        };
    }
    if every(|h| h == 0.0) {
        BatchClass::Dry
    } else {
        BatchClass::Fallback
    }
}

fn lane_regimes(st: &RowStencil<'_>, x: isize) -> (FlowRegime, FlowRegime) {
    let cur = st.cell::<f64>((), x);
    let c = st.speed::<f64>((), x);
    (FlowRegime::classify(cur.u, c), FlowRegime::classify(cur.v, c))
}

/// Batch-of-four flux-splitting update.
#[derive(Clone, Debug, Default)]
pub struct BatchCalculator {
    core: CalculatorCore,
    stats: BatchStats,
}

impl BatchCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch counters accumulated since the last `init`.
    pub fn stats(&self) -> BatchStats {
        self.stats
    }
}

impl TileCalculator for BatchCalculator {
    fn name(&self) -> &'static str {
        "batch"
    }

    fn init_for_scene(&mut self, scene: &Scene) {
        self.core.reserve(scene.max_domain_width());
    }

    fn init(&mut self, pars: &CalculatorPars, globals: &GlobalParameters) -> Result<(), SolverError> {
        if self.stats != BatchStats::default() {
            log::trace!("batch calculator: {:?}", self.stats);
        }
        self.stats = BatchStats::default();
        self.core.init(pars, globals)
    }

    fn process_band(
        &mut self,
        input: &TileInput<'_>,
        out: &mut SurfaceBandMut<'_>,
        tile: Tile,
    ) -> Result<(), SolverError> {
        Arch::new().dispatch(BatchSweep {
            core: &mut self.core,
            stats: &mut self.stats,
            input,
            out,
            tile,
        })
    }
}

/// One tile sweep, run under the instruction set picked by [`Arch`].
struct BatchSweep<'a, 'i, 'o> {
    core: &'a mut CalculatorCore,
    stats: &'a mut BatchStats,
    input: &'a TileInput<'i>,
    out: &'a mut SurfaceBandMut<'o>,
    tile: Tile,
}

impl WithSimd for BatchSweep<'_, '_, '_> {
    type Output = Result<(), SolverError>;

    #[inline(always)]
    fn with_simd<S: Simd>(self, simd: S) -> Self::Output {
        let stats = self.stats;
        self.core.sweep(self.input, self.out, self.tile, |co, st, row, x0, width| {
            batch_row(simd, co, st, row, x0, width, stats);
        })
    }
}

#[inline(always)]
fn batch_row<S: Simd>(
    simd: S,
    co: &Coefficients<f64>,
    st: &RowStencil<'_>,
    row: &mut SurfaceRowMut<'_>,
    x0: usize,
    width: usize,
    stats: &mut BatchStats,
) {
    let co4 = co.splat::<F64x4<S>>(simd);
    let mut tx = 0;
    while tx + LANES <= width {
        let x = tx as isize;
        match classify_batch(st, x) {
            BatchClass::Uniform { u, v } => {
                let cell = update_node(&co4, st, x, Some(u), Some(v));
                store_cell(cell, row, x0 + tx);
                stats.uniform += 1;
            }
            BatchClass::Dry => {
                store_cell(Cell::filled(co4.constant(0.0)), row, x0 + tx);
                stats.dry += 1;
            }
            BatchClass::Fallback => {
                for lane in 0..LANES {
                    let cell = process_node(co, st, x + lane as isize);
                    store_cell(cell, row, x0 + tx + lane);
                }
                stats.fallback += 1;
            }
        }
        tx += LANES;
    }
    for t in tx..width {
        store_cell(process_node(co, st, t as isize), row, x0 + t);
        stats.tail_nodes += 1;
    }
}
