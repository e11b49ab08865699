//! Grids, their surfaces and the scene that advances them.
//!
//! A [`Grid`] owns two [`Surface`] buffers (current and destination) over a
//! static [`Bottom`]. Calculators read the current surface and write the
//! destination; [`Scene::proceed_to_next_step`] then swaps them.

mod flux_grid;
mod scene;
mod surface;

pub use flux_grid::{Grid, MIN_DOMAIN_SIZE, TileInput};
pub use scene::Scene;
pub use surface::{Bottom, Surface, SurfaceBandMut, SurfaceRowMut};
