//! Water surface and bottom fields of one grid.

use std::ops::Range;

use crate::solver::SolverError;
use crate::types::{Field2, FieldBandMut};

/// Height and velocity fields of one buffer of a grid.
///
/// Invariant: all three fields share the same shape and border. After every
/// step, cells with `h == 0` carry `u == v == 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    /// Water column height (>= 0).
    pub h: Field2,
    /// Velocity along x.
    pub u: Field2,
    /// Velocity along y.
    pub v: Field2,
}

impl Surface {
    /// Zero (dry) surface.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            h: Field2::new(width, height),
            u: Field2::new(width, height),
            v: Field2::new(width, height),
        }
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        self.h.dims()
    }

    /// Check the three fields agree in shape.
    pub fn check_shape(&self) -> Result<(), SolverError> {
        let dims = self.h.dims();
        for (name, f) in [("u", &self.u), ("v", &self.v)] {
            if f.dims() != dims || f.border() != self.h.border() {
                return Err(SolverError::dimension_mismatch(
                    format!("{name} field {}x{}", dims.0, dims.1),
                    format!("{}x{}", f.width(), f.height()),
                ));
            }
        }
        Ok(())
    }

    /// Set every cell (border included) to dry.
    pub fn clear(&mut self) {
        self.h.fill(0.0);
        self.u.fill(0.0);
        self.v.fill(0.0);
    }

    /// Bilinear resampling of all three fields.
    pub fn resampled(&self, width: usize, height: usize) -> Self {
        Self {
            h: self.h.resampled(width, height),
            u: self.u.resampled(width, height),
            v: self.v.resampled(width, height),
        }
    }

    /// Split interior rows into disjoint mutable bands, one per range.
    pub fn split_bands_mut(&mut self, ranges: &[Range<usize>]) -> Vec<SurfaceBandMut<'_>> {
        let h = self.h.split_bands_mut(ranges);
        let u = self.u.split_bands_mut(ranges);
        let v = self.v.split_bands_mut(ranges);
        h.into_iter()
            .zip(u)
            .zip(v)
            .map(|((h, u), v)| SurfaceBandMut { h, u, v })
            .collect()
    }

    /// One band covering every interior row.
    pub fn full_band_mut(&mut self) -> SurfaceBandMut<'_> {
        let rows = 0..self.h.height();
        SurfaceBandMut {
            h: self.h.band_mut(rows.clone()),
            u: self.u.band_mut(rows.clone()),
            v: self.v.band_mut(rows),
        }
    }
}

/// Mutable rows of a destination surface owned by one worker.
#[derive(Debug)]
pub struct SurfaceBandMut<'a> {
    h: FieldBandMut<'a>,
    u: FieldBandMut<'a>,
    v: FieldBandMut<'a>,
}

/// Interior slices of one destination row.
pub struct SurfaceRowMut<'a> {
    pub h: &'a mut [f64],
    pub u: &'a mut [f64],
    pub v: &'a mut [f64],
}

impl SurfaceBandMut<'_> {
    /// Interior rows this band may write.
    pub fn rows(&self) -> Range<usize> {
        self.h.rows()
    }

    /// Interior width of the surface.
    pub fn width(&self) -> usize {
        self.h.width()
    }

    /// Destination slices of absolute row `y`.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> SurfaceRowMut<'_> {
        SurfaceRowMut {
            h: self.h.row_mut(y),
            u: self.u.row_mut(y),
            v: self.v.row_mut(y),
        }
    }
}

/// Static bottom of a grid.
///
/// `height` is measured downward from the still-water reference level, so a
/// lake at rest has water height `max(0, height)` everywhere. The flux scheme
/// also needs `b * sqrt(g * b)` with `b = max(0, height)`; it is cached in
/// `precomputed` for the gravity the bottom was built with.
#[derive(Clone, Debug)]
pub struct Bottom {
    height: Field2,
    precomputed: Field2,
    base_height: Field2,
    base_precomputed: Field2,
    gravity: f64,
}

impl Bottom {
    /// Flat bottom at the reference level.
    pub fn flat(width: usize, height: usize, gravity: f64) -> Self {
        Self::from_fn(width, height, gravity, |_, _| 0.0)
    }

    /// Bottom from a function of signed cell coordinates (border included).
    pub fn from_fn<F>(width: usize, height: usize, gravity: f64, f: F) -> Self
    where
        F: FnMut(isize, isize) -> f64,
    {
        let mut h = Field2::new(width, height);
        h.fill_with(f);
        let p = precompute(&h, gravity);
        Self {
            base_height: h.clone(),
            base_precomputed: p.clone(),
            height: h,
            precomputed: p,
            gravity,
        }
    }

    /// Bottom height at the current resolution.
    #[inline]
    pub fn height(&self) -> &Field2 {
        &self.height
    }

    /// `b * sqrt(g * b)` at the current resolution.
    #[inline]
    pub fn precomputed(&self) -> &Field2 {
        &self.precomputed
    }

    /// Gravity used for `precomputed`.
    #[inline]
    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        self.height.dims()
    }

    /// Full-resolution dimensions.
    pub fn base_dims(&self) -> (usize, usize) {
        self.base_height.dims()
    }

    /// Rebuild the precomputed field for another gravity.
    pub fn set_gravity(&mut self, gravity: f64) {
        self.gravity = gravity;
        self.base_precomputed = precompute(&self.base_height, gravity);
        let (w, h) = self.dims();
        self.precomputed = self.base_precomputed.resampled(w, h);
    }

    /// Resample from the full-resolution copy.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.height = self.base_height.resampled(width, height);
        self.precomputed = self.base_precomputed.resampled(width, height);
    }
}

fn precompute(height: &Field2, gravity: f64) -> Field2 {
    let mut p = height.clone();
    for v in p.as_mut_slice() {
        let b = v.max(0.0);
        *v = b * (gravity * b).sqrt();
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bottom_precomputation() {
        let b = Bottom::from_fn(3, 3, 9.0, |x, _| x as f64);
        assert_eq!(b.precomputed().get(-1, 0), 0.0);
        assert_eq!(b.precomputed().get(0, 0), 0.0);
        // b = 1 -> 1 * sqrt(9) = 3
        assert_eq!(b.precomputed().get(1, 1), 3.0);
        // b = 2 -> 2 * sqrt(18)
        assert_eq!(b.precomputed().get(2, 2), 2.0 * 18.0f64.sqrt());
    }

    #[test]
    fn test_gravity_change_rebuilds_cache() {
        let mut b = Bottom::from_fn(4, 4, 9.0, |_, _| 4.0);
        b.set_gravity(16.0);
        assert_eq!(b.gravity(), 16.0);
        assert_eq!(b.precomputed().get(2, 2), 4.0 * 8.0);
    }

    #[test]
    fn test_surface_bands() {
        let mut s = Surface::new(3, 4);
        {
            let mut bands = s.split_bands_mut(&[0..1, 1..4]);
            assert_eq!(bands[1].rows(), 1..4);
            let mut row = bands[1].row_mut(2);
            row.h[0] = 1.5;
            row.v[2] = -0.5;
        }
        assert_eq!(s.h.get(0, 2), 1.5);
        assert_eq!(s.v.get(2, 2), -0.5);
        assert!(s.check_shape().is_ok());
    }
}
