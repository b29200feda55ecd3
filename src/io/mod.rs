//! Input/output operations and error handling

/// Command-line front-end
pub mod cli;
/// Run constants and configuration defaults
pub mod configuration;
/// Error types for all mosaic operations
pub mod error;
/// Image decoding, cropping, resizing and export
pub mod image;
/// Cancellation token and interrupt wiring
pub mod interrupt;
/// JSON export of the finalized usage manifest
pub mod manifest;
/// Progress reporting for catalog loading and mosaic building
pub mod progress;
