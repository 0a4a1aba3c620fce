//! Chunked evaluation of large grids
//!
//! Splits a grid into blocks, hands each block plus a one-cell overlap to the
//! tile adapter, and stitches the block footprints back together. Blocks are
//! independent once their overlap is cut, so they can run on the rayon pool.
//!
//! The grid's own outer edge is padded with the missing sentinel before
//! cutting, and the outer ring of the stitched result is reset to missing.
//! Device kernels may compile with finite-math assumptions, so NaN in the
//! padding is not trusted to survive evaluation.

use crate::error::{AspectError, Result};
use crate::evaluator::AspectEvaluator;
use crate::grid::{Grid, MISSING};
use crate::tiled::{evaluate_tile, HALO};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How chunks are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessingMode {
    /// One chunk after another on the calling thread
    Sequential,
    /// Chunks fanned out over the rayon pool
    #[default]
    Parallel,
}

/// A block of the source grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Row offset in the source grid
    pub row_offset: usize,
    /// Column offset in the source grid
    pub col_offset: usize,
    /// Number of rows in this block
    pub rows: usize,
    /// Number of columns in this block
    pub cols: usize,
}

/// Regular block partition of a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkLayout {
    /// Rows per block (the last block row may be shorter)
    pub rows: usize,
    /// Columns per block (the last block column may be narrower)
    pub cols: usize,
}

impl ChunkLayout {
    /// Create a layout
    ///
    /// # Errors
    ///
    /// Returns [`AspectError::InvalidChunking`] if either extent is zero.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let layout = Self { rows, cols };
        layout.validate()?;
        Ok(layout)
    }

    fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(AspectError::InvalidChunking {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    /// Blocks covering a `total_rows × total_cols` grid in row-major order
    pub fn chunks(&self, total_rows: usize, total_cols: usize) -> ChunkIterator {
        ChunkIterator {
            total_rows,
            total_cols,
            chunk_rows: self.rows.max(1),
            chunk_cols: self.cols.max(1),
            current_row: 0,
            current_col: 0,
        }
    }
}

/// Iterator over the blocks of a [`ChunkLayout`]
pub struct ChunkIterator {
    total_rows: usize,
    total_cols: usize,
    chunk_rows: usize,
    chunk_cols: usize,
    current_row: usize,
    current_col: usize,
}

impl Iterator for ChunkIterator {
    type Item = Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.total_rows || self.total_cols == 0 {
            return None;
        }

        let chunk = Chunk {
            row_offset: self.current_row,
            col_offset: self.current_col,
            rows: self.chunk_rows.min(self.total_rows - self.current_row),
            cols: self.chunk_cols.min(self.total_cols - self.current_col),
        };

        // Move to next block
        self.current_col += self.chunk_cols;
        if self.current_col >= self.total_cols {
            self.current_col = 0;
            self.current_row += self.chunk_rows;
        }

        Some(chunk)
    }
}

/// Surround `grid` with a ring of missing values
fn pad_missing(grid: &Grid) -> Grid {
    let (rows, cols) = grid.shape();
    let mut padded = Grid::missing(rows + 2 * HALO, cols + 2 * HALO);
    padded.paste(HALO, HALO, grid);
    padded
}

/// Reset the outer one-cell ring of `grid` to the missing value
fn mask_border(grid: &mut Grid) {
    let (rows, cols) = grid.shape();
    for r in 0..rows {
        for c in 0..cols {
            if grid.is_border(r, c) {
                grid.set(r, c, MISSING);
            }
        }
    }
}

/// Evaluate one block: cut it with its overlap, run the tile adapter, keep
/// the block footprint
fn evaluate_chunk<E>(padded: &Grid, chunk: Chunk, evaluator: &E) -> Result<Grid>
where
    E: AspectEvaluator + ?Sized,
{
    // Block (r, c) sits at (r + HALO, c + HALO) in the padded grid, so its
    // window with overlap starts at (r, c).
    let window = padded.window(
        chunk.row_offset,
        chunk.col_offset,
        chunk.rows + 2 * HALO,
        chunk.cols + 2 * HALO,
    );
    let out = evaluate_tile(&window, evaluator)?;
    Ok(out.window(HALO, HALO, chunk.rows, chunk.cols))
}

/// Evaluate `grid` block by block and stitch the results
///
/// The output equals a whole-grid evaluation with the same evaluator,
/// including the missing outer ring.
///
/// # Errors
///
/// Returns [`AspectError::InvalidChunking`] for a zero-extent layout and
/// propagates the first evaluator failure.
pub fn evaluate_chunked<E>(
    grid: &Grid,
    layout: ChunkLayout,
    mode: ProcessingMode,
    evaluator: &E,
) -> Result<Grid>
where
    E: AspectEvaluator + ?Sized,
{
    layout.validate()?;

    let (rows, cols) = grid.shape();
    let mut out = Grid::with_value(rows, cols, MISSING);
    if grid.is_empty() {
        return Ok(out);
    }

    let padded = pad_missing(grid);
    let chunks: Vec<Chunk> = layout.chunks(rows, cols).collect();
    debug!(
        "Evaluating {}x{} grid as {} chunks of {}x{} ({:?}, {})",
        rows,
        cols,
        chunks.len(),
        layout.rows,
        layout.cols,
        mode,
        evaluator.name()
    );

    let results: Vec<(Chunk, Grid)> = match mode {
        ProcessingMode::Sequential => chunks
            .into_iter()
            .map(|chunk| evaluate_chunk(&padded, chunk, evaluator).map(|g| (chunk, g)))
            .collect::<Result<_>>()?,
        ProcessingMode::Parallel => chunks
            .into_par_iter()
            .map(|chunk| evaluate_chunk(&padded, chunk, evaluator).map(|g| (chunk, g)))
            .collect::<Result<_>>()?,
    };

    // Merge results into output
    for (chunk, block) in &results {
        out.paste(chunk.row_offset, chunk.col_offset, block);
    }
    mask_border(&mut out);

    Ok(out)
}
