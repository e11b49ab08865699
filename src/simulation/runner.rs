//! Driving a scene through many steps.

use std::time::{Duration, Instant};

use crate::dispatch::{SolverConfig, StepMethod, build_with_fallback};
use crate::grid::Scene;
use crate::solver::{DiagnosticsTracker, SolverError, SurfaceDiagnostics, stable_time_step};

/// How a [`Simulation`] picks its time step and reports progress.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    /// Fixed time step. Takes precedence over `cfl`.
    pub dt: Option<f64>,
    /// CFL number; when set (and `dt` is not), each step uses the stable dt.
    pub cfl: Option<f64>,
    /// Step budget for [`Simulation::run_until`].
    pub max_steps: Option<usize>,
    /// Steps between diagnostics updates; 0 disables them.
    pub diagnostics_interval: usize,
}

impl SimulationConfig {
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = Some(dt);
        self
    }

    pub fn with_cfl(mut self, cfl: f64) -> Self {
        self.cfl = Some(cfl);
        self
    }

    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = Some(steps);
        self
    }

    pub fn with_diagnostics_interval(mut self, steps: usize) -> Self {
        self.diagnostics_interval = steps;
        self
    }
}

/// Outcome of [`Simulation::run`] or [`Simulation::run_until`].
#[derive(Clone, Debug)]
pub struct SimulationResult {
    /// Steps taken by this call.
    pub n_steps: usize,
    /// Scene time when the call returned.
    pub final_time: f64,
    /// Smallest and largest dt used; `None` if no step was taken.
    pub dt_range: Option<(f64, f64)>,
    pub wall_time: Duration,
    /// The error that stopped the run early.
    pub error: Option<SolverError>,
}

impl SimulationResult {
    /// Whether the run reached its target without an error.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Running statistics of one `run*` call.
struct RunStats {
    started: Instant,
    n_steps: usize,
    dt_range: Option<(f64, f64)>,
}

impl RunStats {
    fn start() -> Self {
        Self {
            started: Instant::now(),
            n_steps: 0,
            dt_range: None,
        }
    }

    fn record(&mut self, dt: f64) {
        self.n_steps += 1;
        self.dt_range = Some(match self.dt_range {
            Some((lo, hi)) => (lo.min(dt), hi.max(dt)),
            None => (dt, dt),
        });
    }

    fn finish(self, final_time: f64, error: Option<SolverError>) -> SimulationResult {
        SimulationResult {
            n_steps: self.n_steps,
            final_time,
            dt_range: self.dt_range,
            wall_time: self.started.elapsed(),
            error,
        }
    }
}

/// A scene together with the realization that steps it.
pub struct Simulation {
    scene: Scene,
    method: Box<dyn StepMethod>,
    config: SimulationConfig,
    trackers: Vec<DiagnosticsTracker>,
    n_steps: usize,
}

impl Simulation {
    /// Wrap a scene and an already built realization.
    pub fn new(scene: Scene, method: Box<dyn StepMethod>) -> Self {
        let gravity = scene.globals().gravity;
        let trackers = scene
            .grids()
            .iter()
            .map(|g| DiagnosticsTracker::new(SurfaceDiagnostics::compute(g, gravity)))
            .collect();
        Self {
            scene,
            method,
            config: SimulationConfig::default(),
            trackers,
            n_steps: 0,
        }
    }

    /// Build the realization from `solver` (with fallback) and wrap the scene.
    pub fn with_solver(scene: Scene, solver: &SolverConfig) -> Result<Self, SolverError> {
        let (method, _skipped) = build_with_fallback(solver, &scene)?;
        Ok(Self::new(scene, method))
    }

    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn method_name(&self) -> &'static str {
        self.method.name()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Per-grid diagnostics trackers.
    pub fn trackers(&self) -> &[DiagnosticsTracker] {
        &self.trackers
    }

    /// Steps taken since construction.
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Time step for the next step: fixed `dt`, else CFL-stable, else the
    /// scene's recommended step.
    pub fn next_dt(&self) -> f64 {
        if let Some(dt) = self.config.dt {
            return dt;
        }
        if let Some(cfl) = self.config.cfl
            && let Some(dt) = stable_time_step(&self.scene, cfl)
        {
            return dt.min(self.scene.recommended_time_step());
        }
        self.scene.recommended_time_step()
    }

    /// Advance one step; returns the dt used.
    pub fn step(&mut self) -> Result<f64, SolverError> {
        let dt = self.next_dt();
        self.advance(dt)?;
        Ok(dt)
    }

    fn advance(&mut self, dt: f64) -> Result<(), SolverError> {
        self.method.step(&mut self.scene, dt)?;
        self.n_steps += 1;
        let interval = self.config.diagnostics_interval;
        if interval > 0 && self.n_steps % interval == 0 {
            self.update_diagnostics();
        }
        Ok(())
    }

    fn update_diagnostics(&mut self) {
        let gravity = self.scene.globals().gravity;
        let time = self.scene.time();
        for (i, (grid, tracker)) in self.scene.grids().iter().zip(&mut self.trackers).enumerate() {
            let diag = SurfaceDiagnostics::compute(grid, gravity);
            log::debug!("step {} t={time:.4} grid {i}: {}", self.n_steps, diag.summary_line());
            tracker.update(time, diag);
            if !tracker.is_stable() {
                log::warn!("grid {i} became unstable at t={time:.4}");
            }
        }
    }

    /// Run `n` steps.
    pub fn run(&mut self, n: usize) -> SimulationResult {
        log::info!(
            "running {n} steps with {} from t = {:.4}",
            self.method.name(),
            self.scene.time()
        );
        let mut stats = RunStats::start();
        for _ in 0..n {
            let dt = self.next_dt();
            if let Err(e) = self.advance(dt) {
                log::warn!("step {} failed: {e}", stats.n_steps);
                return stats.finish(self.scene.time(), Some(e));
            }
            stats.record(dt);
        }
        let result = stats.finish(self.scene.time(), None);
        log::info!(
            "ran {n} steps to t = {:.4} in {:.2?}",
            result.final_time,
            result.wall_time
        );
        result
    }

    /// Run until the scene time reaches `t_end`, shortening the last step.
    ///
    /// Stops with [`SolverError::InvalidParameter`] once `max_steps` is spent.
    pub fn run_until(&mut self, t_end: f64) -> SimulationResult {
        let mut stats = RunStats::start();
        while self.scene.time() < t_end {
            if let Some(limit) = self.config.max_steps
                && stats.n_steps >= limit
            {
                let e = SolverError::InvalidParameter(format!(
                    "step budget of {limit} spent before t = {t_end}"
                ));
                return stats.finish(self.scene.time(), Some(e));
            }
            let dt = self.next_dt().min(t_end - self.scene.time());
            if let Err(e) = self.advance(dt) {
                return stats.finish(self.scene.time(), Some(e));
            }
            stats.record(dt);
        }
        stats.finish(self.scene.time(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::SolverKind;
    use crate::grid::Grid;
    use crate::solver::GlobalParameters;

    fn lake() -> Scene {
        let mut scene = Scene::new(GlobalParameters::default()).unwrap();
        let mut grid = Grid::new(8, 8, 1.0, 1.0).unwrap();
        grid.set_bottom_constant(1.0, 10.0);
        grid.reset_to_zero_state();
        scene.add_grid(grid);
        scene
    }

    fn sim(config: SimulationConfig) -> Simulation {
        Simulation::with_solver(lake(), &SolverConfig::new(SolverKind::Scalar))
            .unwrap()
            .with_config(config)
    }

    #[test]
    fn test_run_fixed_steps() {
        let mut s = sim(SimulationConfig::default().with_dt(0.01).with_diagnostics_interval(2));
        let result = s.run(10);
        assert!(result.is_success());
        assert_eq!(result.n_steps, 10);
        assert_eq!(result.dt_range, Some((0.01, 0.01)));
        approx::assert_relative_eq!(result.final_time, 0.1, epsilon = 1e-12);
        assert_eq!(s.trackers()[0].n_updates(), 5);
        assert!(s.trackers()[0].volume_error() < 1e-12);
    }

    #[test]
    fn test_dt_selection() {
        let s = sim(SimulationConfig::default());
        assert_eq!(s.next_dt(), s.scene().recommended_time_step());

        // c = sqrt(10), dx = 1: cfl * 1 / sqrt(10) < 0.03 for cfl = 0.05.
        let s = sim(SimulationConfig::default().with_cfl(0.05));
        approx::assert_relative_eq!(s.next_dt(), 0.05 / 10.0f64.sqrt(), epsilon = 1e-12);

        let s = sim(SimulationConfig::default().with_cfl(0.05).with_dt(0.02));
        assert_eq!(s.next_dt(), 0.02);
    }

    #[test]
    fn test_run_until_hits_end_time() {
        let mut s = sim(SimulationConfig::default().with_dt(0.03));
        let result = s.run_until(0.1);
        assert!(result.is_success());
        assert_eq!(result.n_steps, 4);
        approx::assert_relative_eq!(s.scene().time(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_max_steps() {
        let mut s = sim(SimulationConfig::default().with_dt(0.01).with_max_steps(3));
        let result = s.run_until(1.0);
        assert!(matches!(result.error, Some(SolverError::InvalidParameter(_))));
        assert_eq!(result.n_steps, 3);
    }

    #[test]
    fn test_failed_step_stops_run() {
        let mut s = sim(SimulationConfig::default().with_dt(-1.0));
        let result = s.run(5);
        assert!(!result.is_success());
        assert_eq!(result.n_steps, 0);
        assert_eq!(result.dt_range, None);
        assert_eq!(result.error, Some(SolverError::InvalidTimeStep(-1.0)));
        assert_eq!(s.scene().time(), 0.0);
    }
}
