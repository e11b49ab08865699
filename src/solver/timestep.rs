//! Stable time step from the CFL condition.

use crate::grid::{Grid, Scene};

/// Largest characteristic speed `max(|u| + c, |v| + c)` over a grid.
pub fn max_wave_speed(grid: &Grid, gravity: f64) -> f64 {
    let s = grid.current_surface();
    let mut max_speed: f64 = 0.0;
    for y in 0..grid.domain_height() as isize {
        for ((&h, &u), &v) in s.h.row(y).iter().zip(s.u.row(y)).zip(s.v.row(y)) {
            let c = (gravity * h.max(0.0)).sqrt();
            max_speed = max_speed.max(u.abs() + c).max(v.abs() + c);
        }
    }
    max_speed
}

/// Compute the stable time step for a scene.
///
/// Uses the CFL condition `dt <= cfl * min(dx, dy) / lambda_max` per grid and
/// returns the minimum over grids, or `None` when nothing moves (dry or
/// empty scene).
pub fn stable_time_step(scene: &Scene, cfl: f64) -> Option<f64> {
    let gravity = scene.globals().gravity;
    scene
        .grids()
        .iter()
        .filter_map(|g| {
            let speed = max_wave_speed(g, gravity);
            (speed > 1e-14).then(|| cfl * g.step_w().min(g.step_h()) / speed)
        })
        .min_by(f64::total_cmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::GlobalParameters;

    #[test]
    fn test_cfl_time_step() {
        let mut scene = Scene::new(GlobalParameters::default().with_gravity(4.0)).unwrap();
        let mut g = Grid::new(4, 4, 2.0, 1.0).unwrap();
        g.fill_state(|_, _| (1.0, 1.0, -3.0));
        scene.add_grid(g);
        // c = 2, lambda = max(1 + 2, 3 + 2) = 5, step = 1
        assert_eq!(stable_time_step(&scene, 0.5), Some(0.1));
    }

    #[test]
    fn test_dry_scene_has_no_limit() {
        let mut scene = Scene::new(GlobalParameters::default()).unwrap();
        assert_eq!(stable_time_step(&scene, 0.5), None);
        scene.add_grid(Grid::new(4, 4, 1.0, 1.0).unwrap());
        assert_eq!(stable_time_step(&scene, 0.5), None);
    }
}
