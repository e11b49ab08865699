//! Tiles: the rectangle of a grid one calculator call updates.

use std::ops::Range;

/// Sub-rectangle `[x0, x0 + width) x [y0, y0 + height)` of a grid's domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    pub x0: usize,
    pub y0: usize,
    pub width: usize,
    pub height: usize,
}

impl Tile {
    pub fn new(x0: usize, y0: usize, width: usize, height: usize) -> Self {
        Self {
            x0,
            y0,
            width,
            height,
        }
    }

    /// The whole `width x height` domain.
    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Full-width tile over a row range.
    pub fn rows(width: usize, rows: Range<usize>) -> Self {
        Self::new(0, rows.start, width, rows.len())
    }

    #[inline]
    pub fn x_end(&self) -> usize {
        self.x0 + self.width
    }

    #[inline]
    pub fn y_end(&self) -> usize {
        self.y0 + self.height
    }

    pub fn row_range(&self) -> Range<usize> {
        self.y0..self.y_end()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the tile lies inside a `width x height` domain.
    pub fn fits(&self, width: usize, height: usize) -> bool {
        self.x_end() <= width && self.y_end() <= height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_bounds() {
        let t = Tile::rows(8, 2..5);
        assert_eq!(t, Tile::new(0, 2, 8, 3));
        assert_eq!(t.row_range(), 2..5);
        assert!(t.fits(8, 5));
        assert!(!t.fits(8, 4));
        assert!(!t.fits(7, 5));
        assert!(Tile::new(0, 0, 0, 3).is_empty());
    }
}
