//! Thread-pool realization: each grid's rows split into bands, one per worker.

use rayon::prelude::*;

use crate::grid::Scene;
use crate::solver::{CalculatorPars, SolverError, TileCalculator};
use crate::types::Tile;

use super::StepMethod;
use super::partition::job_ranges;

/// Runs one calculator per worker of a dedicated rayon pool.
///
/// Every worker owns its calculator (and so its speed cache) and writes only
/// its own band of destination rows, so no locking is needed. Workers without
/// rows stay idle for that grid.
pub struct ThreadPoolMethod<C> {
    pool: rayon::ThreadPool,
    calcs: Vec<C>,
}

impl<C: TileCalculator + Default> ThreadPoolMethod<C> {
    /// Build a pool of `num_threads` workers (0: one per available core).
    pub fn new(scene: &Scene, num_threads: usize) -> Result<Self, SolverError> {
        let threads = if num_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            num_threads
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("swe-flux-{i}"))
            .build()?;
        let calcs = (0..threads)
            .map(|_| {
                let mut calc = C::default();
                calc.init_for_scene(scene);
                calc
            })
            .collect();
        log::debug!("thread pool realization with {threads} workers");
        Ok(Self { pool, calcs })
    }

    pub fn num_workers(&self) -> usize {
        self.calcs.len()
    }
}

impl<C: TileCalculator + Default> StepMethod for ThreadPoolMethod<C> {
    fn name(&self) -> &'static str {
        "thread_pool"
    }

    fn step(&mut self, scene: &mut Scene, dt: f64) -> Result<(), SolverError> {
        let pars = CalculatorPars::new(scene.time(), dt)?;
        let globals = *scene.globals();
        for calc in &mut self.calcs {
            calc.init(&pars, &globals)?;
        }

        for grid in scene.grids_mut() {
            let width = grid.domain_width();
            let ranges = job_ranges(self.calcs.len(), grid.domain_height());
            let (input, dest) = grid.split_for_step();
            let bands = dest.split_bands_mut(&ranges);
            let calcs = &mut self.calcs[..ranges.len()];
            let input = &input;

            self.pool.install(|| {
                calcs
                    .par_iter_mut()
                    .zip(bands.into_par_iter())
                    .zip(ranges.par_iter())
                    .try_for_each(|((calc, mut band), rows)| {
                        calc.process_band(input, &mut band, Tile::rows(width, rows.clone()))
                    })
            })?;
        }

        scene.run_actions(&pars);
        scene.proceed_to_next_step(dt);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::SerialMethod;
    use crate::grid::Grid;
    use crate::solver::{BatchCalculator, GlobalParameters};

    fn scene() -> Scene {
        let mut scene = Scene::new(GlobalParameters::default()).unwrap();
        let mut grid = Grid::new(13, 7, 1.0, 1.0).unwrap();
        grid.fill_state(|x, y| (1.0 + 0.05 * ((x + 2 * y).rem_euclid(5)) as f64, 0.2, -0.1));
        scene.add_grid(grid);
        scene
    }

    #[test]
    fn test_matches_serial() {
        let mut a = scene();
        let mut b = scene();
        let mut serial = SerialMethod::<BatchCalculator>::new(&a);
        let mut pool = ThreadPoolMethod::<BatchCalculator>::new(&b, 3).unwrap();
        assert_eq!(pool.num_workers(), 3);
        for _ in 0..5 {
            serial.step(&mut a, 0.01).unwrap();
            pool.step(&mut b, 0.01).unwrap();
        }
        assert_eq!(a.grid(0).unwrap().current_surface(), b.grid(0).unwrap().current_surface());
    }

    #[test]
    fn test_more_workers_than_rows() {
        let mut s = scene();
        let mut pool = ThreadPoolMethod::<BatchCalculator>::new(&s, 16).unwrap();
        pool.step(&mut s, 0.01).unwrap();
        assert!(s.grid(0).unwrap().current_surface().h.interior().all(f64::is_finite));
    }
}
