use serde::{Deserialize, Serialize};

/// A coordinate on the map, addressed as `(row, col)`.
///
/// Serialized as a two-element array so scenario files can list paths compactly.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
#[display("({row}, {col})")]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Converts signed coordinates into a cell inside a `height` x `width` map.
    ///
    /// Returns `None` when either coordinate falls outside the map.
    #[must_use]
    pub fn from_signed(row: i64, col: i64, height: usize, width: usize) -> Option<Self> {
        let row = usize::try_from(row).ok().filter(|r| *r < height)?;
        let col = usize::try_from(col).ok().filter(|c| *c < width)?;
        Some(Self { row, col })
    }

    /// Returns the cell displaced by `(d_row, d_col)` if it stays inside the map.
    #[must_use]
    pub fn offset(self, d_row: isize, d_col: isize, height: usize, width: usize) -> Option<Self> {
        let row = self.row.checked_add_signed(d_row).filter(|r| *r < height)?;
        let col = self.col.checked_add_signed(d_col).filter(|c| *c < width)?;
        Some(Self { row, col })
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl From<Cell> for (usize, usize) {
    fn from(cell: Cell) -> Self {
        (cell.row, cell.col)
    }
}
