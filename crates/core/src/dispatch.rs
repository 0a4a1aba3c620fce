//! Backend selection for elevation rasters
//!
//! Classifies a raster by where its cells live and routes it to the matching
//! evaluator. Whole-grid rasters go straight to their evaluator; chunked
//! rasters go through [`evaluate_chunked`], which adds the overlap and
//! stitches blocks back together.

use crate::chunked::{evaluate_chunked, ChunkLayout};
use crate::device::DeviceEvaluator;
use crate::error::{AspectError, Result};
use crate::evaluator::{AspectEvaluator, Backend};
use crate::grid::Grid;
use crate::options::AspectOptions;
use crate::raster::{ElevationRaster, Storage};
use crate::sequential::SequentialEvaluator;
use tracing::info;

/// Execution plan for one raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// One evaluator call over the whole grid
    Whole(Backend),
    /// Block-wise evaluation through the halo adapter
    Chunked {
        backend: Backend,
        layout: ChunkLayout,
    },
}

impl Dispatch {
    /// Map a storage kind to its execution plan
    ///
    /// # Errors
    ///
    /// Returns [`AspectError::Unimplemented`] for chunked device storage.
    pub fn classify(storage: Storage) -> Result<Self> {
        match storage {
            Storage::Host => Ok(Self::Whole(Backend::Cpu)),
            Storage::Device => Ok(Self::Whole(Backend::Device)),
            Storage::Chunked(layout) => Ok(Self::Chunked {
                backend: Backend::Cpu,
                layout,
            }),
            Storage::ChunkedDevice(_) => Err(AspectError::Unimplemented(
                "aspect for chunked device arrays",
            )),
        }
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        match self {
            Self::Whole(backend) | Self::Chunked { backend, .. } => *backend,
        }
    }

    /// Run the plan on `grid`
    ///
    /// # Errors
    ///
    /// Propagates evaluator construction and evaluation failures.
    pub fn run(&self, grid: &Grid, options: &AspectOptions) -> Result<Grid> {
        let evaluator = resolve(self.backend(), options)?;
        match *self {
            Self::Whole(_) => evaluator.evaluate(grid),
            Self::Chunked { layout, .. } => {
                evaluate_chunked(grid, layout, options.chunks, evaluator.as_ref())
            }
        }
    }
}

fn resolve(backend: Backend, options: &AspectOptions) -> Result<Box<dyn AspectEvaluator>> {
    let evaluator: Box<dyn AspectEvaluator> = match backend {
        Backend::Cpu => Box::new(SequentialEvaluator::new()),
        Backend::Device => Box::new(DeviceEvaluator::with_policy(options.device)?),
    };
    Ok(evaluator)
}

/// Compute terrain aspect for an elevation raster
///
/// Every interior cell receives a compass bearing in `[0, 360)` measured
/// clockwise from north, or `-1.0` where the surface is flat. Cells on the
/// outer ring of the grid are missing (`NaN`). The output keeps the input's
/// shape, dimension names, coordinates, attributes and storage kind and is
/// named after [`AspectOptions::name`].
///
/// # Errors
///
/// - [`AspectError::UnsupportedStorage`] for device storage in a build
///   without the `gpu` feature
/// - [`AspectError::DeviceUnavailable`] for device storage when no GPU can
///   be initialized and [`DevicePolicy::AllowHost`](crate::DevicePolicy) is not set
/// - [`AspectError::Unimplemented`] for chunked device storage
pub fn aspect(raster: &ElevationRaster, options: &AspectOptions) -> Result<ElevationRaster> {
    let plan = Dispatch::classify(raster.storage())?;
    let (rows, cols) = raster.shape();
    info!(
        "Computing aspect for {}x{} raster '{}' ({:?})",
        rows,
        cols,
        raster.name(),
        plan
    );

    let data = plan.run(raster.data(), options)?;
    Ok(raster.derive(data, options.name.clone()))
}
