//! Terrain Aspect Library
//!
//! Computes the compass direction each cell of an elevation grid faces,
//! using Horn's third-order finite difference over the 3×3 neighbourhood.
//!
//! ## Output Convention
//!
//! - Bearings in degrees, clockwise from north, in `[0, 360)`
//! - `-1.0` where the surface is flat (both gradient components exactly zero)
//! - `NaN` on the outer ring of the grid, where the neighbourhood is incomplete
//!
//! ## Backends
//!
//! - [`SequentialEvaluator`] - single-threaded `f64` reference
//! - [`DeviceEvaluator`] - one work item per cell at `f32`, on a wgpu compute
//!   pipeline or the rayon pool
//! - [`evaluate_tile`] / [`evaluate_chunked`] - reflect-halo tile adapter and
//!   the block driver built on it
//!
//! [`aspect`] picks one of these from the raster's [`Storage`].

pub mod chunked;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod evaluator;
pub mod grid;
pub mod kernel;
pub mod options;
pub mod raster;
pub mod sequential;
pub mod tiled;

// Re-export the public surface
pub use chunked::{evaluate_chunked, Chunk, ChunkLayout, ProcessingMode};
pub use device::{DeviceEvaluator, DevicePolicy, GpuInitResult};
pub use dispatch::{aspect, Dispatch};
pub use error::{AspectError, Result};
pub use evaluator::{AspectEvaluator, Backend};
pub use grid::{is_missing, Grid, MISSING};
pub use kernel::{compass_bearing, horn_aspect, horn_gradient, Aspect, Neighborhood, FLAT};
pub use options::AspectOptions;
pub use raster::{ElevationRaster, Storage};
pub use sequential::SequentialEvaluator;
pub use tiled::{evaluate_tile, pad_reflect, trim_halo, HALO};

#[cfg(feature = "gpu")]
pub use device::{GpuAspectKernel, GpuContext};
