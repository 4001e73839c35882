use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use super::Cell;

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("grid rows must be non-empty and of equal length (row {row} has {len} columns, expected {expected})")]
pub struct RaggedGridError {
    row: usize,
    len: usize,
    expected: usize,
}

/// Dense row-major matrix of `f64` values covering a rectangular area.
///
/// Used for the opponent hit-point map, the accumulated damage map and tower
/// damage kernels. Serialized as a list of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Grid {
    height: usize,
    width: usize,
    values: Vec<f64>,
}

impl Grid {
    #[must_use]
    pub fn zeros(height: usize, width: usize) -> Self {
        Self::filled(height, width, 0.0)
    }

    #[must_use]
    pub fn filled(height: usize, width: usize, value: f64) -> Self {
        Self {
            height,
            width,
            values: vec![value; height * width],
        }
    }

    /// Builds a grid by evaluating `f(row, col)` for every cell.
    #[must_use]
    pub fn from_fn<F>(height: usize, width: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut values = Vec::with_capacity(height * width);
        for row in 0..height {
            for col in 0..width {
                values.push(f(row, col));
            }
        }
        Self {
            height,
            width,
            values,
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, RaggedGridError> {
        let expected = rows.first().map_or(0, Vec::len);
        let height = rows.len();
        let mut values = Vec::with_capacity(height * expected);
        for (row, cols) in rows.into_iter().enumerate() {
            if cols.is_empty() || cols.len() != expected {
                return Err(RaggedGridError {
                    row,
                    len: cols.len(),
                    expected,
                });
            }
            values.extend(cols);
        }
        Ok(Self {
            height,
            width: expected,
            values,
        })
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut f64> + '_ {
        self.values.iter_mut()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.chunks(self.width.max(1))
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn fill(&mut self, value: f64) {
        self.values.fill(value);
    }

    /// Adds `factor * kernel` centered on `center`, dropping the parts of the
    /// kernel that fall outside this grid.
    ///
    /// The kernel's center is at `(height / 2, width / 2)`.
    pub fn add_kernel(&mut self, kernel: &Grid, center: Cell, factor: f64) {
        let radius_row = kernel.height / 2;
        let radius_col = kernel.width / 2;
        for k_row in 0..kernel.height {
            for k_col in 0..kernel.width {
                #[expect(clippy::cast_possible_wrap)]
                let target = center.offset(
                    k_row as isize - radius_row as isize,
                    k_col as isize - radius_col as isize,
                    self.height,
                    self.width,
                );
                if let Some(target) = target {
                    self[target] += factor * kernel[Cell::new(k_row, k_col)];
                }
            }
        }
    }
}

impl Index<Cell> for Grid {
    type Output = f64;

    fn index(&self, cell: Cell) -> &Self::Output {
        assert!(self.contains(cell), "cell {cell} outside grid");
        &self.values[cell.row * self.width + cell.col]
    }
}

impl IndexMut<Cell> for Grid {
    fn index_mut(&mut self, cell: Cell) -> &mut Self::Output {
        assert!(self.contains(cell), "cell {cell} outside grid");
        &mut self.values[cell.row * self.width + cell.col]
    }
}

impl TryFrom<Vec<Vec<f64>>> for Grid {
    type Error = RaggedGridError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<Grid> for Vec<Vec<f64>> {
    fn from(grid: Grid) -> Self {
        grid.rows().map(<[f64]>::to_vec).collect()
    }
}
