//! Runtime diagnostics for grid surfaces.
//!
//! - [`SurfaceDiagnostics`]: volume, momentum and bounds of one grid
//! - [`DiagnosticsTracker`]: comparison against the initial state
//!
//! # Example
//!
//! ```
//! use swe_flux::grid::Grid;
//! use swe_flux::solver::SurfaceDiagnostics;
//!
//! let mut grid = Grid::new(10, 10, 2.0, 2.0).unwrap();
//! grid.set_bottom_constant(1.0, 10.0);
//! grid.reset_to_zero_state();
//! let diag = SurfaceDiagnostics::compute(&grid, 10.0);
//! assert_eq!(diag.total_volume, 400.0);
//! assert_eq!(diag.wet_cells, 100);
//! ```

use crate::grid::Grid;

/// Diagnostic quantities of the current surface of a grid.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceDiagnostics {
    /// Water volume (sum of `h * dx * dy`).
    pub total_volume: f64,
    /// Sum of `h * u * dx * dy`.
    pub momentum_x: f64,
    /// Sum of `h * v * dx * dy`.
    pub momentum_y: f64,
    /// Number of cells with `h > 0`.
    pub wet_cells: usize,
    /// Smallest height over the domain.
    pub min_depth: f64,
    /// Largest height over the domain.
    pub max_depth: f64,
    /// Largest velocity magnitude.
    pub max_velocity: f64,
    /// Largest Froude number `|V| / sqrt(g h)` over wet cells.
    pub max_froude: f64,
}

impl SurfaceDiagnostics {
    /// Compute diagnostics of `grid`'s current surface.
    pub fn compute(grid: &Grid, gravity: f64) -> Self {
        let s = grid.current_surface();
        let area = grid.step_w() * grid.step_h();
        let mut d = Self {
            total_volume: 0.0,
            momentum_x: 0.0,
            momentum_y: 0.0,
            wet_cells: 0,
            min_depth: f64::INFINITY,
            max_depth: f64::NEG_INFINITY,
            max_velocity: 0.0,
            max_froude: 0.0,
        };
        for y in 0..grid.domain_height() as isize {
            for ((&h, &u), &v) in s.h.row(y).iter().zip(s.u.row(y)).zip(s.v.row(y)) {
                d.total_volume += h * area;
                d.momentum_x += h * u * area;
                d.momentum_y += h * v * area;
                d.min_depth = d.min_depth.min(h);
                d.max_depth = d.max_depth.max(h);
                let speed = (u * u + v * v).sqrt();
                d.max_velocity = d.max_velocity.max(speed);
                if h > 0.0 {
                    d.wet_cells += 1;
                    d.max_froude = d.max_froude.max(speed / (gravity * h).sqrt());
                }
            }
        }
        d
    }

    /// Whether every quantity is finite.
    pub fn is_finite(&self) -> bool {
        self.total_volume.is_finite()
            && self.momentum_x.is_finite()
            && self.momentum_y.is_finite()
            && self.max_velocity.is_finite()
    }

    /// Format diagnostics as a single-line summary.
    pub fn summary_line(&self) -> String {
        format!(
            "V={:.4e} wet={} |u|_max={:.3} h=[{:.3},{:.3}] Fr={:.3}",
            self.total_volume,
            self.wet_cells,
            self.max_velocity,
            self.min_depth,
            self.max_depth,
            self.max_froude
        )
    }
}

/// Track diagnostics of one grid against its initial state.
#[derive(Clone, Debug)]
pub struct DiagnosticsTracker {
    initial: SurfaceDiagnostics,
    current: SurfaceDiagnostics,
    current_time: f64,
    n_updates: usize,
    max_velocity_seen: f64,
    max_froude_seen: f64,
}

impl DiagnosticsTracker {
    pub fn new(initial: SurfaceDiagnostics) -> Self {
        Self {
            max_velocity_seen: initial.max_velocity,
            max_froude_seen: initial.max_froude,
            current: initial.clone(),
            initial,
            current_time: 0.0,
            n_updates: 0,
        }
    }

    /// Update tracker with new diagnostics.
    pub fn update(&mut self, time: f64, diag: SurfaceDiagnostics) {
        self.current_time = time;
        self.n_updates += 1;
        self.max_velocity_seen = self.max_velocity_seen.max(diag.max_velocity);
        self.max_froude_seen = self.max_froude_seen.max(diag.max_froude);
        self.current = diag;
    }

    /// Relative change of the water volume since the initial state.
    pub fn volume_error(&self) -> f64 {
        if self.initial.total_volume.abs() > 1e-14 {
            (self.current.total_volume - self.initial.total_volume).abs()
                / self.initial.total_volume.abs()
        } else {
            0.0
        }
    }

    pub fn current(&self) -> &SurfaceDiagnostics {
        &self.current
    }

    pub fn initial(&self) -> &SurfaceDiagnostics {
        &self.initial
    }

    pub fn max_velocity_seen(&self) -> f64 {
        self.max_velocity_seen
    }

    pub fn max_froude_seen(&self) -> f64 {
        self.max_froude_seen
    }

    pub fn n_updates(&self) -> usize {
        self.n_updates
    }

    /// No NaN/Inf and no negative height.
    pub fn is_stable(&self) -> bool {
        self.current.is_finite() && self.current.min_depth >= 0.0
    }
}
