//! Data-parallel device evaluator
//!
//! Runs the `f32` kernel with one independent work item per output cell.
//! Work items share nothing but the read-only input, so their order is
//! irrelevant; the caller blocks until every item has finished.
//!
//! # Feature Flags
//!
//! - `gpu` (default): enables the wgpu compute backend. Without it only the
//!   host execution target exists.
//!
//! # Execution Targets
//!
//! 1. [`DeviceEvaluator::Gpu`] - WGSL compute shader dispatched through wgpu
//! 2. [`DeviceEvaluator::Host`] - the same `f32` kernel fanned out over the
//!    rayon thread pool, used when no adapter is present and the caller
//!    explicitly allows it

mod context;
#[cfg(feature = "gpu")]
mod gpu;

pub use context::GpuInitResult;

#[cfg(feature = "gpu")]
pub use context::GpuContext;
#[cfg(feature = "gpu")]
pub use gpu::GpuAspectKernel;

use crate::error::{AspectError, Result};
use crate::evaluator::{AspectEvaluator, Backend};
use crate::grid::Grid;
use crate::kernel::{horn_aspect, Neighborhood};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What to do when a device evaluator is requested but no GPU can be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DevicePolicy {
    /// Fail with [`AspectError::DeviceUnavailable`]
    #[default]
    RequireGpu,
    /// Run the device kernel on host threads instead
    AllowHost,
}

/// Device evaluator supporting GPU and host execution targets
pub enum DeviceEvaluator {
    /// GPU compute pipeline
    /// Boxed to keep the enum small
    #[cfg(feature = "gpu")]
    Gpu(Box<GpuAspectKernel>),
    /// `f32` kernel on the rayon pool
    Host,
}

impl DeviceEvaluator {
    /// Initialize a GPU-backed evaluator
    ///
    /// # Errors
    ///
    /// Returns [`AspectError::DeviceUnavailable`] if no adapter is found or
    /// the device cannot be created, and [`AspectError::UnsupportedStorage`]
    /// if the crate was built without the `gpu` feature.
    #[cfg(feature = "gpu")]
    pub fn gpu() -> Result<Self> {
        match GpuContext::new() {
            GpuInitResult::Success(context) => {
                tracing::info!("Using GPU aspect kernel on {}", context.adapter_name());
                Ok(Self::Gpu(Box::new(GpuAspectKernel::new(context))))
            }
            GpuInitResult::NoGpuFound => Err(AspectError::DeviceUnavailable(
                "no compatible GPU adapter found".to_string(),
            )),
            GpuInitResult::InitFailed {
                adapter_name,
                error,
            } => Err(AspectError::DeviceUnavailable(format!(
                "GPU '{adapter_name}' found but failed to initialize: {error}"
            ))),
        }
    }

    /// Initialize a GPU-backed evaluator
    ///
    /// # Errors
    ///
    /// Always fails: this build has no GPU backend.
    #[cfg(not(feature = "gpu"))]
    pub fn gpu() -> Result<Self> {
        Err(AspectError::UnsupportedStorage(
            "device array (built without the `gpu` feature)".to_string(),
        ))
    }

    /// Host execution target, always available
    #[must_use]
    pub fn host() -> Self {
        Self::Host
    }

    /// Resolve an evaluator according to `policy`
    ///
    /// # Errors
    ///
    /// Propagates the GPU initialization error under
    /// [`DevicePolicy::RequireGpu`].
    pub fn with_policy(policy: DevicePolicy) -> Result<Self> {
        match (Self::gpu(), policy) {
            (Ok(evaluator), _) => Ok(evaluator),
            (Err(e), DevicePolicy::AllowHost) => {
                warn!("{e}. Running device kernel on host threads.");
                Ok(Self::Host)
            }
            (Err(e), DevicePolicy::RequireGpu) => Err(e),
        }
    }

    /// Check if this evaluator dispatches to a GPU
    #[must_use]
    pub fn is_gpu(&self) -> bool {
        !matches!(self, Self::Host)
    }
}

/// Evaluate every cell of `grid` on the rayon pool at `f32`
///
/// Each item computes one output cell from its own neighbourhood; cells
/// outside the interior keep the missing value.
fn run_host(grid: &Grid) -> Result<Grid> {
    let (rows, cols) = grid.shape();
    if !grid.has_interior() {
        return Ok(Grid::missing(rows, cols));
    }

    let input: Vec<f32> = grid.as_slice().iter().map(|&v| v as f32).collect();
    let values: Vec<f64> = (0..rows * cols)
        .into_par_iter()
        .map(|idx| {
            let (row, col) = (idx / cols, idx % cols);
            if row < 1 || col < 1 || row + 1 >= rows || col + 1 >= cols {
                return f64::NAN;
            }
            let nb = Neighborhood::gather(&input, cols, row, col);
            f64::from(horn_aspect(&nb).to_value())
        })
        .collect();

    Grid::from_vec(rows, cols, values)
}

impl AspectEvaluator for DeviceEvaluator {
    fn evaluate(&self, grid: &Grid) -> Result<Grid> {
        match self {
            #[cfg(feature = "gpu")]
            Self::Gpu(kernel) => kernel.run(grid),
            Self::Host => run_host(grid),
        }
    }

    fn backend(&self) -> Backend {
        Backend::Device
    }

    fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "gpu")]
            Self::Gpu(_) => "device-gpu",
            Self::Host => "device-host",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::is_missing;
    use crate::kernel::FLAT;
    use crate::sequential::SequentialEvaluator;

    #[test]
    fn host_flat_and_slope() {
        let flat = Grid::with_value(3, 3, 10.0);
        let out = DeviceEvaluator::host().evaluate(&flat).unwrap();
        assert_eq!(out.get(1, 1), FLAT);

        let slope = Grid::from_rows(&[
            [30.0, 30.0, 30.0],
            [20.0, 20.0, 20.0],
            [10.0, 10.0, 10.0],
        ])
        .unwrap();
        let out = DeviceEvaluator::host().evaluate(&slope).unwrap();
        assert!((out.get(1, 1) - 180.0).abs() < 1e-3);
    }

    #[test]
    fn host_matches_sequential() {
        let grid = Grid::from_fn(17, 23, |r, c| ((r * 7 + c * 3) % 11) as f64 + (r / 4) as f64);
        let host = DeviceEvaluator::host().evaluate(&grid).unwrap();
        let reference = SequentialEvaluator.run(&grid);

        for (i, (&h, &s)) in host.as_slice().iter().zip(reference.as_slice()).enumerate() {
            if is_missing(s) {
                assert!(is_missing(h), "cell {i}: expected missing, got {h}");
            } else if s == FLAT {
                assert_eq!(h, FLAT, "cell {i}: flatness disagrees");
            } else {
                let diff = (h - s).abs();
                assert!(diff.min(360.0 - diff) < 1e-3, "cell {i}: {h} vs {s}");
            }
        }
    }

    #[test]
    fn host_undersized_grid() {
        let out = DeviceEvaluator::host()
            .evaluate(&Grid::with_value(2, 8, 1.0))
            .unwrap();
        assert!(out.as_slice().iter().all(|&v| is_missing(v)));
    }

    #[test]
    fn policy_allow_host_always_resolves() {
        let evaluator = DeviceEvaluator::with_policy(DevicePolicy::AllowHost).unwrap();
        assert_eq!(evaluator.backend(), Backend::Device);
    }

    #[test]
    fn policy_require_gpu_reports_failure_kind() {
        match DeviceEvaluator::with_policy(DevicePolicy::RequireGpu) {
            Ok(evaluator) => assert!(evaluator.is_gpu()),
            Err(e) => assert!(matches!(
                e,
                AspectError::DeviceUnavailable(_) | AspectError::UnsupportedStorage(_)
            )),
        }
    }
}
