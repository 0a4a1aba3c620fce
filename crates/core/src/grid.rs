//! Row-major elevation and aspect grids
//!
//! Both the elevation input and the aspect output are stored as a flat
//! `Vec<f64>` in row-major order. Row 0 is the northern edge of the grid.

use crate::error::{AspectError, Result};

/// Value marking cells whose 3×3 neighbourhood leaves the grid
///
/// Distinct from the flat sentinel `-1.0`, which is a computed result.
pub const MISSING: f64 = f64::NAN;

/// Returns `true` if `value` is the missing sentinel
#[inline]
#[must_use]
pub fn is_missing(value: f64) -> bool {
    value.is_nan()
}

/// 2D grid of real values in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Grid {
    /// Create a grid filled with the missing sentinel
    ///
    /// Every evaluator starts from this state and only overwrites interior
    /// cells, so the border ring stays missing.
    #[must_use]
    pub fn missing(rows: usize, cols: usize) -> Self {
        Self::with_value(rows, cols, MISSING)
    }

    /// Create a grid with every cell set to `value`
    #[must_use]
    pub fn with_value(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            data: vec![value; rows * cols],
            rows,
            cols,
        }
    }

    /// Wrap an existing row-major buffer
    ///
    /// # Errors
    ///
    /// Returns [`AspectError::ShapeMismatch`] if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(AspectError::ShapeMismatch {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Build a grid from nested rows, mostly useful for small literal grids
    ///
    /// # Errors
    ///
    /// Returns [`AspectError::ShapeMismatch`] if the rows are ragged.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        if let Some(ragged) = rows.iter().find(|r| r.as_ref().len() != cols) {
            return Err(AspectError::ShapeMismatch {
                rows: rows.len(),
                cols,
                len: ragged.as_ref().len(),
            });
        }
        let data: Vec<f64> = rows.iter().flat_map(|r| r.as_ref().iter().copied()).collect();
        Self::from_vec(rows.len(), cols, data)
    }

    /// Build a grid by evaluating `f(row, col)` for every cell
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                data.push(f(row, col));
            }
        }
        Self { data, rows, cols }
    }

    /// Grid shape as `(rows, cols)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `true` if the grid has no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `true` if at least one cell has a full 3×3 neighbourhood
    #[must_use]
    pub fn has_interior(&self) -> bool {
        self.rows >= 3 && self.cols >= 3
    }

    /// Row-major view of the cells
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume the grid, returning its row-major buffer
    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Get value at `(row, col)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(
            row < self.rows && col < self.cols,
            "Coordinates out of bounds"
        );
        self.data[row * self.cols + col]
    }

    /// Set value at `(row, col)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(
            row < self.rows && col < self.cols,
            "Coordinates out of bounds"
        );
        self.data[row * self.cols + col] = value;
    }

    /// Borrow one row
    #[must_use]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Copy the `rows × cols` window whose top-left corner is `(row, col)`
    ///
    /// # Panics
    ///
    /// Panics if the window extends past the grid.
    #[must_use]
    pub fn window(&self, row: usize, col: usize, rows: usize, cols: usize) -> Self {
        assert!(
            row + rows <= self.rows && col + cols <= self.cols,
            "Window out of bounds"
        );
        let mut data = Vec::with_capacity(rows * cols);
        for r in row..row + rows {
            let start = r * self.cols + col;
            data.extend_from_slice(&self.data[start..start + cols]);
        }
        Self { data, rows, cols }
    }

    /// Copy `src` into this grid with its top-left corner at `(row, col)`
    ///
    /// # Panics
    ///
    /// Panics if `src` does not fit.
    pub fn paste(&mut self, row: usize, col: usize, src: &Grid) {
        assert!(
            row + src.rows <= self.rows && col + src.cols <= self.cols,
            "Paste out of bounds"
        );
        for r in 0..src.rows {
            let dst = (row + r) * self.cols + col;
            self.data[dst..dst + src.cols].copy_from_slice(src.row(r));
        }
    }

    /// `true` if `(row, col)` lies on the outer one-cell ring
    #[must_use]
    pub fn is_border(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row + 1 >= self.rows || col + 1 >= self.cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_grid_is_all_nan() {
        let grid = Grid::missing(4, 5);
        assert_eq!(grid.shape(), (4, 5));
        assert!(grid.as_slice().iter().all(|&v| is_missing(v)));
    }

    #[test]
    fn from_vec_rejects_bad_length() {
        let err = Grid::from_vec(3, 3, vec![0.0; 8]).unwrap_err();
        assert!(matches!(
            err,
            AspectError::ShapeMismatch {
                rows: 3,
                cols: 3,
                len: 8
            }
        ));
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let rows: [&[f64]; 2] = [&[1.0, 2.0], &[3.0]];
        assert!(Grid::from_rows(&rows).is_err());
    }

    #[test]
    fn get_set_row_major() {
        let mut grid = Grid::with_value(3, 4, 0.0);
        grid.set(2, 1, 7.5);
        assert_eq!(grid.get(2, 1), 7.5);
        assert_eq!(grid.as_slice()[2 * 4 + 1], 7.5);
    }

    #[test]
    fn window_and_paste_round_trip_a_block() {
        let grid = Grid::from_fn(5, 6, |r, c| (r * 10 + c) as f64);
        let block = grid.window(1, 2, 3, 2);
        assert_eq!(block.shape(), (3, 2));
        assert_eq!(block.get(0, 0), 12.0);
        assert_eq!(block.get(2, 1), 33.0);

        let mut target = Grid::missing(5, 6);
        target.paste(1, 2, &block);
        assert_eq!(target.get(3, 3), 33.0);
        assert!(is_missing(target.get(0, 0)));
    }

    #[test]
    fn border_detection() {
        let grid = Grid::missing(4, 4);
        assert!(grid.is_border(0, 2));
        assert!(grid.is_border(3, 1));
        assert!(grid.is_border(1, 0));
        assert!(!grid.is_border(1, 2));
        assert!(grid.has_interior());
        assert!(!Grid::missing(2, 9).has_interior());
    }

    #[test]
    #[should_panic(expected = "Coordinates out of bounds")]
    fn bounds_check() {
        let grid = Grid::missing(3, 3);
        let _ = grid.get(3, 0);
    }
}
