//! Core data types shared by the grid, the calculators and the dispatchers.
//!
//! - [`Field2`]: bordered 2D field with signed, bounds-checked access
//! - [`Tile`]: rectangle of a grid handled by one calculator call
//! - [`Region`]: world-space placement of a grid
//! - [`Side`]: the four grid sides, used by boundary actions
//!
//! # Example
//!
//! ```
//! use swe_flux::types::{Field2, Tile};
//!
//! let mut h = Field2::new(4, 3);
//! h.set(-1, 0, 2.0); // left border
//! assert_eq!(h.line(0, 0).at(-1), 2.0);
//!
//! let tile = Tile::rows(4, 1..3);
//! assert!(tile.fits(h.width(), h.height()));
//! ```

mod field;
mod region;
mod side;
mod tile;

pub use field::{BORDER, Field2, FieldBandMut, FieldLine};
pub use region::Region;
pub use side::Side;
pub use tile::Tile;
