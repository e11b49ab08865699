//! Grid sides.

use std::fmt;

/// One side of a grid's interior; the border strip beyond it is what
/// boundary actions write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    /// Row `y = -1`.
    Top,
    /// Row `y = height`.
    Bottom,
    /// Column `x = -1`.
    Left,
    /// Column `x = width`.
    Right,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    /// Unit step from a border cell toward the adjacent interior cell.
    #[inline]
    pub fn inward(self) -> (isize, isize) {
        match self {
            Side::Top => (0, 1),
            Side::Bottom => (0, -1),
            Side::Left => (1, 0),
            Side::Right => (-1, 0),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
        };
        f.write_str(name)
    }
}
