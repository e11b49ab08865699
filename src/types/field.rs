//! Bordered 2D scalar fields.
//!
//! A [`Field2`] owns a flat row-major array covering the interior domain plus a
//! fixed-width border on every side. Coordinates are signed so the border can be
//! addressed directly: `x = -1` is the left border column and `y = height` is
//! the bottom border row.
//!
//! Row access goes through [`FieldLine`], a read-only cursor anchored at a
//! column of one row. Offsets are relative to the anchor and may be negative,
//! which keeps the usual "line pointer plus offset" stencil pattern while every
//! access stays bounds-checked by the slice.

/// Border width used by every field in the solver.
pub const BORDER: usize = 1;

/// A 2D field of `f64` values with a fixed border.
#[derive(Clone, Debug, PartialEq)]
pub struct Field2 {
    width: usize,
    height: usize,
    border: usize,
    stride: usize,
    data: Vec<f64>,
}

impl Field2 {
    /// Create a zero-filled field with the default border.
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_border(width, height, BORDER)
    }

    /// Create a zero-filled field with an explicit border width.
    pub fn with_border(width: usize, height: usize, border: usize) -> Self {
        let stride = width + 2 * border;
        Self {
            width,
            height,
            border,
            stride,
            data: vec![0.0; stride * (height + 2 * border)],
        }
    }

    /// Create a field (border included) filled with a constant.
    pub fn filled(width: usize, height: usize, value: f64) -> Self {
        let mut f = Self::new(width, height);
        f.fill(value);
        f
    }

    /// Interior width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Interior height.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn border(&self) -> usize {
        self.border
    }

    /// Distance in elements between two consecutive rows.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// `(width, height)` of the interior.
    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Raw backing storage, border included, row-major.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[inline]
    fn index(&self, x: isize, y: isize) -> usize {
        let b = self.border as isize;
        debug_assert!(x >= -b && x < self.width as isize + b, "x = {x} outside field");
        debug_assert!(y >= -b && y < self.height as isize + b, "y = {y} outside field");
        (y + b) as usize * self.stride + (x + b) as usize
    }

    /// Value at signed coordinates (border included).
    #[inline]
    pub fn get(&self, x: isize, y: isize) -> f64 {
        self.data[self.index(x, y)]
    }

    /// Set the value at signed coordinates (border included).
    #[inline]
    pub fn set(&mut self, x: isize, y: isize, value: f64) {
        let i = self.index(x, y);
        self.data[i] = value;
    }

    /// Fill the whole field, border included.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Fill every cell (border included) from a function of signed coordinates.
    pub fn fill_with<F>(&mut self, mut f: F)
    where
        F: FnMut(isize, isize) -> f64,
    {
        let b = self.border as isize;
        for y in -b..self.height as isize + b {
            for x in -b..self.width as isize + b {
                self.set(x, y, f(x, y));
            }
        }
    }

    /// Read-only cursor on row `y`, anchored at column `x0`.
    #[inline]
    pub fn line(&self, y: isize, x0: isize) -> FieldLine<'_> {
        let start = self.index(-(self.border as isize), y);
        FieldLine {
            data: &self.data[start..start + self.stride],
            origin: (x0 + self.border as isize) as usize,
        }
    }

    /// Mutable interior of row `y` (`width` elements, border excluded).
    #[inline]
    pub fn row_mut(&mut self, y: isize) -> &mut [f64] {
        let start = self.index(0, y);
        &mut self.data[start..start + self.width]
    }

    /// Interior of row `y`.
    #[inline]
    pub fn row(&self, y: isize) -> &[f64] {
        let start = self.index(0, y);
        &self.data[start..start + self.width]
    }

    /// Iterate over all interior values.
    pub fn interior(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.height as isize).flat_map(move |y| self.row(y).iter().copied())
    }

    /// Split the storage of interior rows `rows` (border columns included)
    /// into a mutable band.
    ///
    /// The band covers exactly `rows.len()` full-stride rows, so writes can
    /// never reach rows owned by another band.
    pub fn band_mut(&mut self, rows: std::ops::Range<usize>) -> FieldBandMut<'_> {
        let start = (rows.start + self.border) * self.stride;
        let end = (rows.end + self.border) * self.stride;
        FieldBandMut {
            data: &mut self.data[start..end],
            first_row: rows.start,
            stride: self.stride,
            border: self.border,
            width: self.width,
        }
    }

    /// Split interior rows into consecutive disjoint mutable bands.
    ///
    /// `ranges` must be sorted, non-overlapping and inside `0..height`;
    /// gaps between ranges are allowed.
    pub fn split_bands_mut(&mut self, ranges: &[std::ops::Range<usize>]) -> Vec<FieldBandMut<'_>> {
        let stride = self.stride;
        let border = self.border;
        let width = self.width;
        let mut rest: &mut [f64] = &mut self.data[border * stride..];
        let mut consumed = 0usize;
        let mut bands = Vec::with_capacity(ranges.len());
        for r in ranges {
            debug_assert!(r.start >= consumed && r.end >= r.start && r.end <= self.height);
            let skip = (r.start - consumed) * stride;
            let (_, tail) = std::mem::take(&mut rest).split_at_mut(skip);
            let (band, tail) = tail.split_at_mut(r.len() * stride);
            bands.push(FieldBandMut {
                data: band,
                first_row: r.start,
                stride,
                border,
                width,
            });
            rest = tail;
            consumed = r.end;
        }
        bands
    }

    /// Bilinearly resample into a new field of size `new_w x new_h`.
    ///
    /// Interior edges map onto interior edges and the border is carried along,
    /// so a border holding duplicated boundary values stays consistent.
    pub fn resampled(&self, new_w: usize, new_h: usize) -> Field2 {
        let mut dst = Field2::with_border(new_w, new_h, self.border);
        let sx = axis_scale(self.width, new_w);
        let sy = axis_scale(self.height, new_h);
        let b = self.border as isize;

        for y in -b..new_h as isize + b {
            let (yi, yr) = source_coord(y, sy, self.height, new_h);
            for x in -b..new_w as isize + b {
                let (xi, xr) = source_coord(x, sx, self.width, new_w);
                let v00 = self.get(xi, yi);
                let v10 = if xr > 0.0 { self.get(xi + 1, yi) } else { v00 };
                let (v01, v11) = if yr > 0.0 {
                    let v01 = self.get(xi, yi + 1);
                    let v11 = if xr > 0.0 { self.get(xi + 1, yi + 1) } else { v01 };
                    (v01, v11)
                } else {
                    (v00, v10)
                };
                let top = v00 + (v10 - v00) * xr;
                let bot = v01 + (v11 - v01) * xr;
                dst.set(x, y, top + (bot - top) * yr);
            }
        }
        dst
    }
}

#[inline]
fn axis_scale(src: usize, dst: usize) -> f64 {
    if dst > 1 {
        (src.saturating_sub(1)) as f64 / (dst - 1) as f64
    } else {
        0.0
    }
}

/// Map a destination coordinate to `(source index, fractional weight)`.
#[inline]
fn source_coord(d: isize, scale: f64, src: usize, dst: usize) -> (isize, f64) {
    if d <= 0 {
        (d, 0.0)
    } else if d >= dst as isize - 1 {
        // Right/bottom edge and the border beyond it map onto the source edge.
        (d + src as isize - dst as isize, 0.0)
    } else {
        let f = d as f64 * scale;
        let i = f.floor();
        (i as isize, f - i)
    }
}

/// Read-only cursor on one row of a [`Field2`].
#[derive(Clone, Copy, Debug)]
pub struct FieldLine<'a> {
    data: &'a [f64],
    origin: usize,
}

impl<'a> FieldLine<'a> {
    /// Build a cursor over an arbitrary slice; `origin` is the element at offset 0.
    #[inline]
    pub fn from_slice(data: &'a [f64], origin: usize) -> Self {
        Self { data, origin }
    }

    /// Value at signed offset `dx` from the anchor.
    #[inline(always)]
    pub fn at(&self, dx: isize) -> f64 {
        self.data[(self.origin as isize + dx) as usize]
    }

    /// Four consecutive values starting at offset `dx`.
    #[inline(always)]
    pub fn at4(&self, dx: isize) -> [f64; 4] {
        let i = (self.origin as isize + dx) as usize;
        let s = &self.data[i..i + 4];
        [s[0], s[1], s[2], s[3]]
    }
}

/// Mutable view over a contiguous range of interior rows of a [`Field2`].
#[derive(Debug)]
pub struct FieldBandMut<'a> {
    data: &'a mut [f64],
    first_row: usize,
    stride: usize,
    border: usize,
    width: usize,
}

impl FieldBandMut<'_> {
    /// Interior rows covered by this band.
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.first_row..self.first_row + self.data.len() / self.stride.max(1)
    }

    /// Interior width of the underlying field.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Interior of grid row `y` (absolute row index).
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f64] {
        let local = y - self.first_row;
        let start = local * self.stride + self.border;
        &mut self.data[start..start + self.width]
    }
}
