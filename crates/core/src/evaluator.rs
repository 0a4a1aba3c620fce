//! Evaluator trait definition
//!
//! This module defines the `AspectEvaluator` trait, the single contract every
//! execution backend implements. Adding a backend means adding one
//! implementation of this trait; nothing else dispatches on concrete types.

use crate::error::Result;
use crate::grid::Grid;
use serde::{Deserialize, Serialize};

/// Execution backend for the per-cell kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    /// Single-threaded `f64` evaluation on the host
    Cpu,
    /// Data-parallel `f32` evaluation, one work item per output cell
    Device,
}

/// Backend-agnostic interface for whole-grid aspect evaluation
///
/// Implementations read `grid`, allocate a fresh output of the same shape
/// filled with the missing sentinel, and overwrite only interior cells.
/// They hold no per-call state, so one evaluator may be shared across
/// threads evaluating different tiles.
pub trait AspectEvaluator: Send + Sync {
    /// Compute aspect for every interior cell of `grid`
    ///
    /// # Errors
    ///
    /// Host evaluators never fail. Device evaluators fail if the device
    /// cannot run the kernel or return its output.
    fn evaluate(&self, grid: &Grid) -> Result<Grid>;

    /// Which backend this evaluator runs on
    fn backend(&self) -> Backend;

    /// Short name for logging
    fn name(&self) -> &'static str;
}
