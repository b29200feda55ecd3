//! Greedy photomosaic construction with repetition-constrained tile matching
//!
//! Target and candidate images are reduced to fixed-size colour fingerprints,
//! each grid cell of the target is matched against the candidate catalog by
//! parallel fitting workers, and the chosen tiles are composited into a single
//! raster along with a position-ordered usage manifest.

#![deny(unsafe_code)]

/// Tile fitting, repetition tracking, cell ordering and the worker pipeline
pub mod algorithm;
/// Image fingerprinting, candidate catalog and target preparation
pub mod analysis;
/// Input/output operations, configuration and error handling
pub mod io;
/// Colour distance kernels
pub mod math;
/// Grid geometry and mosaic compositing
pub mod spatial;

pub use io::error::{MosaicError, Result};
