//! Physical placement of a grid.

use std::fmt;

use crate::solver::SolverError;

/// Rectangular world-space region covered by a grid's interior.
///
/// # Example
///
/// ```
/// use swe_flux::types::Region;
///
/// let r = Region::new(0.0, 200.0, 0.0, 100.0).unwrap();
/// assert_eq!(r.width(), 200.0);
/// assert_eq!(r.center(), (100.0, 50.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Region {
    /// Create a region, rejecting empty or inverted extents.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self, SolverError> {
        if !(x_max > x_min) || !(y_max > y_min) {
            return Err(SolverError::InvalidParameter(format!(
                "region [{x_min}, {x_max}] x [{y_min}, {y_max}] is empty"
            )));
        }
        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }

    /// Region anchored at the origin.
    pub fn from_size(width: f64, height: f64) -> Result<Self, SolverError> {
        Self::new(0.0, width, 0.0, height)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (0.5 * (self.x_min + self.x_max), 0.5 * (self.y_min + self.y_max))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x {}..{}, y {}..{}", self.x_min, self.x_max, self.y_min, self.y_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_dimensions() {
        let r = Region::new(10.0, 30.0, -5.0, 5.0).unwrap();
        assert_eq!(r.width(), 20.0);
        assert_eq!(r.height(), 10.0);
        assert_eq!(r.center(), (20.0, 0.0));
    }

    #[test]
    fn test_empty_region_rejected() {
        assert!(Region::new(1.0, 1.0, 0.0, 1.0).is_err());
        assert!(Region::new(0.0, 1.0, 2.0, 1.0).is_err());
        assert!(Region::from_size(f64::NAN, 1.0).is_err());
    }
}
