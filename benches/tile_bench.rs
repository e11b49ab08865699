//! Benchmarks for one tile update and one scene step.
//!
//! Run with: `cargo bench --bench tile_bench`
//!
//! Compares the scalar and batched calculators on a single tile, and the
//! serial and thread pool realizations on a full scene.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use swe_flux::dispatch::{SerialMethod, StepMethod};
use swe_flux::grid::{Grid, Scene};
use swe_flux::solver::{BatchCalculator, CalculatorPars, GlobalParameters, ScalarCalculator, TileCalculator};
use swe_flux::types::Tile;

const G: f64 = 9.81;

/// Wavy water over a gentle slope, wet everywhere.
fn wavy_grid(n: usize) -> Grid {
    let mut grid = Grid::new(n, n, 1.0, 1.0).unwrap();
    grid.set_bottom_from_fn(G, |x, y| 2.0 + 0.01 * x - 0.005 * y);
    grid.fill_state(|x, y| {
        let phase = 0.3 * x as f64 + 0.2 * y as f64;
        (2.0 + 0.1 * phase.sin(), 0.3 * phase.cos(), -0.2 * phase.sin())
    });
    grid
}

fn globals() -> GlobalParameters {
    GlobalParameters::default().with_gravity(G)
}

fn bench_tile<C: TileCalculator + Default>(c: &mut Criterion, name: &str) {
    let mut group = c.benchmark_group(format!("tile_{name}"));
    let pars = CalculatorPars::new(0.0, 0.01).unwrap();

    for n in [64, 256] {
        let mut grid = wavy_grid(n);
        let mut calc = C::default();
        calc.init(&pars, &globals()).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                calc.process_tile(black_box(&mut grid), Tile::full(n, n)).unwrap();
            })
        });
    }
    group.finish();
}

fn bench_calculators(c: &mut Criterion) {
    bench_tile::<ScalarCalculator>(c, "scalar");
    bench_tile::<BatchCalculator>(c, "batch");
}

fn bench_scene_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene_step");
    let n = 256;

    let mut scene = Scene::new(globals()).unwrap();
    scene.add_grid(wavy_grid(n));

    let mut serial = SerialMethod::<BatchCalculator>::new(&scene);
    group.bench_function("serial_batch", |b| {
        b.iter(|| serial.step(black_box(&mut scene), 0.001).unwrap())
    });

    #[cfg(feature = "parallel")]
    {
        use swe_flux::dispatch::ThreadPoolMethod;
        let mut pool = ThreadPoolMethod::<BatchCalculator>::new(&scene, 0).unwrap();
        group.bench_function("thread_pool_batch", |b| {
            b.iter(|| pool.step(black_box(&mut scene), 0.001).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_calculators, bench_scene_step);
criterion_main!(benches);
