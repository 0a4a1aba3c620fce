//! Halo padding around a single tile
//!
//! Wraps any evaluator so a tile's own edge cells are computed instead of
//! left missing: the tile is padded by one reflected cell on every side,
//! evaluated, and the halo is trimmed back off. The padded copy lives only for
//! the duration of [`evaluate_tile`].

use crate::error::{AspectError, Result};
use crate::evaluator::AspectEvaluator;
use crate::grid::Grid;

/// Width of the halo the 3×3 kernel needs
pub const HALO: usize = 1;

/// Mirror an out-of-range index back into `0..len`, excluding the edge cell
///
/// `-1` maps to `1` and `len` maps to `len - 2`. An axis of length one has
/// nothing to mirror and repeats its only cell.
#[inline]
fn reflect(idx: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mirrored = if idx < 0 {
        -idx
    } else if idx > last {
        2 * last - idx
    } else {
        idx
    };
    mirrored as usize
}

/// Pad `tile` by [`HALO`] cells on every side in reflect mode
///
/// # Errors
///
/// Returns [`AspectError::EmptyTile`] if the tile has no cells.
pub fn pad_reflect(tile: &Grid) -> Result<Grid> {
    let (rows, cols) = tile.shape();
    if rows == 0 || cols == 0 {
        return Err(AspectError::EmptyTile { rows, cols });
    }

    let halo = HALO as isize;
    Ok(Grid::from_fn(rows + 2 * HALO, cols + 2 * HALO, |r, c| {
        let src_row = reflect(r as isize - halo, rows);
        let src_col = reflect(c as isize - halo, cols);
        tile.get(src_row, src_col)
    }))
}

/// Drop the outer [`HALO`] ring of `padded`
///
/// # Panics
///
/// Panics if `padded` is smaller than two halos in either dimension.
#[must_use]
pub fn trim_halo(padded: &Grid) -> Grid {
    let (rows, cols) = padded.shape();
    assert!(
        rows >= 2 * HALO && cols >= 2 * HALO,
        "Grid too small to trim halo"
    );
    padded.window(HALO, HALO, rows - 2 * HALO, cols - 2 * HALO)
}

/// Evaluate one tile with a reflected halo
///
/// The result has the tile's shape. Every cell is computed, including the
/// tile's own edge, whose missing neighbours are supplied by reflection.
/// When the tile already carries a real one-cell overlap from its
/// neighbours, the cells inside that overlap match a whole-grid evaluation.
///
/// # Errors
///
/// Returns [`AspectError::EmptyTile`] for a zero-sized tile and propagates
/// evaluator failures.
pub fn evaluate_tile<E>(tile: &Grid, evaluator: &E) -> Result<Grid>
where
    E: AspectEvaluator + ?Sized,
{
    let evaluated = {
        let padded = pad_reflect(tile)?;
        evaluator.evaluate(&padded)?
    };
    Ok(trim_halo(&evaluated))
}
