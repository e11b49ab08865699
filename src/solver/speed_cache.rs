//! Three-row cyclic cache of wave speeds.

use crate::types::FieldLine;

/// Wave speeds `sqrt(g h)` for the rows above, at and below the row being
/// processed.
///
/// Rows are addressed by a running index `k` (tile row + 1) and stored in slot
/// `k % 3`. Before row `k` is processed, rows `k - 1` and `k` must be filled;
/// row `k + 1` is filled just before advancing. Each cached row covers the
/// tile width plus one cell on each side.
#[derive(Clone, Debug, Default)]
pub struct SpeedCache {
    rows: [Vec<f64>; 3],
    width: usize,
}

impl SpeedCache {
    /// Cache able to serve tiles up to `width` cells wide.
    pub fn new(width: usize) -> Self {
        let mut cache = Self::default();
        cache.ensure_width(width);
        cache
    }

    /// Widest tile the cache can serve without reallocating.
    pub fn capacity(&self) -> usize {
        self.width
    }

    /// Grow the rows to serve tiles up to `width` cells wide.
    pub fn ensure_width(&mut self, width: usize) {
        if width > self.width || self.rows[0].is_empty() {
            for row in &mut self.rows {
                row.resize(width + 2, 0.0);
            }
            self.width = self.width.max(width);
        }
    }

    /// Fill cache row `k` from heights anchored at the tile's first column.
    pub fn fill(&mut self, k: usize, heights: FieldLine<'_>, width: usize, gravity: f64) {
        debug_assert!(width <= self.width, "speed cache too narrow");
        let row = &mut self.rows[k % 3];
        for (i, c) in row[..width + 2].iter_mut().enumerate() {
            *c = (gravity * heights.at(i as isize - 1)).sqrt();
        }
    }

    /// Cursor on cache row `k`, anchored at the tile's first column.
    #[inline]
    pub fn line(&self, k: usize) -> FieldLine<'_> {
        FieldLine::from_slice(&self.rows[k % 3], 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field2;

    #[test]
    fn test_rows_cycle_through_slots() {
        let mut h = Field2::new(3, 5);
        h.fill_with(|_, y| (y + 1) as f64);
        let mut cache = SpeedCache::new(3);
        for k in 0..5 {
            cache.fill(k, h.line(k as isize - 1, 0), 3, 4.0);
        }
        // Rows 2, 3 and 4 are resident; row 4 overwrote the slot of row 1.
        assert_eq!(cache.line(4).at(0), (4.0f64 * 4.0).sqrt());
        assert_eq!(cache.line(3).at(-1), (4.0f64 * 3.0).sqrt());
        assert_eq!(cache.line(2).at(3), (4.0f64 * 2.0).sqrt());
        assert_eq!(cache.line(1).at(0), cache.line(4).at(0));
    }

    #[test]
    fn test_grows_on_demand() {
        let mut cache = SpeedCache::new(2);
        cache.ensure_width(8);
        assert_eq!(cache.capacity(), 8);
        cache.ensure_width(4);
        assert_eq!(cache.capacity(), 8);
    }
}
