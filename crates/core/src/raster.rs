//! Elevation raster container
//!
//! Couples a [`Grid`] with the labelling a caller's container carries:
//! a name, dimension names, coordinate vectors and free-form attributes.
//! None of it is interpreted here; aspect output simply inherits it.

use crate::chunked::ChunkLayout;
use crate::grid::Grid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where the raster's cells physically live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Storage {
    /// One contiguous buffer in host memory
    #[default]
    Host,
    /// One contiguous buffer in device memory
    Device,
    /// Host memory split into blocks
    Chunked(ChunkLayout),
    /// Device memory split into blocks
    ChunkedDevice(ChunkLayout),
}

/// A named elevation grid with opaque metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationRaster {
    data: Grid,
    name: String,
    dims: Vec<String>,
    coords: BTreeMap<String, Vec<f64>>,
    attrs: BTreeMap<String, String>,
    storage: Storage,
}

impl ElevationRaster {
    /// Wrap `data` as an unnamed host raster with `("y", "x")` dimensions
    #[must_use]
    pub fn new(data: Grid) -> Self {
        Self {
            data,
            name: String::new(),
            dims: vec!["y".to_string(), "x".to_string()],
            coords: BTreeMap::new(),
            attrs: BTreeMap::new(),
            storage: Storage::Host,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_dims(mut self, row_dim: impl Into<String>, col_dim: impl Into<String>) -> Self {
        self.dims = vec![row_dim.into(), col_dim.into()];
        self
    }

    /// Attach a coordinate vector, replacing any previous one of that name
    pub fn with_coord(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.coords.insert(name.into(), values);
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = storage;
        self
    }

    /// A raster holding `data` under `name` with this raster's metadata
    #[must_use]
    pub fn derive(&self, data: Grid, name: impl Into<String>) -> Self {
        Self {
            data,
            name: name.into(),
            dims: self.dims.clone(),
            coords: self.coords.clone(),
            attrs: self.attrs.clone(),
            storage: self.storage,
        }
    }

    #[must_use]
    pub fn data(&self) -> &Grid {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> Grid {
        self.data
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    #[must_use]
    pub fn coords(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.coords
    }

    #[must_use]
    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    #[must_use]
    pub fn storage(&self) -> Storage {
        self.storage
    }

    /// Grid shape as `(rows, cols)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }
}
