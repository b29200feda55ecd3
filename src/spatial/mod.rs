//! Spatial data structures and raster composition
//!
//! This module contains spatial-related functionality including:
//! - Grid geometry for tile boxes and cells
//! - The accumulating mosaic raster and its usage manifest

/// Grid geometry and cell definitions
pub mod grid;
/// Mosaic raster compositing and manifest summarization
pub mod mosaic;

pub use grid::{Cell, GridLayout, TileBox};
