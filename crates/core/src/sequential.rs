//! Single-threaded reference evaluator
//!
//! Walks every interior cell in row-major order and applies the kernel at
//! `f64`. This is the reference the other backends are validated against.

use crate::error::Result;
use crate::evaluator::{AspectEvaluator, Backend};
use crate::grid::Grid;
use crate::kernel::{horn_aspect, Neighborhood};
use tracing::debug;

/// Sequential `f64` evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialEvaluator;

impl SequentialEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Infallible form of [`AspectEvaluator::evaluate`]
    ///
    /// Grids with fewer than 3 rows or columns have no interior and come back
    /// entirely missing.
    #[must_use]
    pub fn run(&self, grid: &Grid) -> Grid {
        let (rows, cols) = grid.shape();
        let mut out = Grid::missing(rows, cols);

        if !grid.has_interior() {
            debug!(
                "Grid {}x{} has no interior cells, returning all-missing output",
                rows, cols
            );
            return out;
        }

        let input = grid.as_slice();
        let output = out.as_mut_slice();
        for y in 1..rows - 1 {
            for x in 1..cols - 1 {
                let nb = Neighborhood::gather(input, cols, y, x);
                output[y * cols + x] = horn_aspect(&nb).to_value();
            }
        }

        out
    }
}

impl AspectEvaluator for SequentialEvaluator {
    fn evaluate(&self, grid: &Grid) -> Result<Grid> {
        Ok(self.run(grid))
    }

    fn backend(&self) -> Backend {
        Backend::Cpu
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}
