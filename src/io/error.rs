//! Error types and path context for mosaic operations

use std::fmt;
use std::path::{Path, PathBuf};

/// Main error type for all mosaic operations
#[derive(Debug)]
pub enum MosaicError {
    /// Failed to load an image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// A candidate could not be decoded or cropped into a fingerprint
    ///
    /// Recovered locally: the catalog builder drops the candidate and counts it.
    UnusableImage {
        /// Identifier of the rejected candidate source
        identifier: String,
        /// Description of why the image was rejected
        reason: String,
    },

    /// No candidate survived fingerprinting
    EmptyCatalog {
        /// Number of candidate sources that were offered
        offered: usize,
        /// Number of sources rejected as unusable
        skipped: usize,
    },

    /// The run was cancelled before any cell reached the workers
    ///
    /// Nothing is written, so an existing output file is left untouched.
    Cancelled {
        /// Phase the run was in when cancellation was observed
        stage: &'static str,
    },

    /// Every catalog entry was excluded while fitting a cell
    NoEligibleCandidate {
        /// Size of the catalog that was scanned
        catalog_size: usize,
    },

    /// Shutdown discipline between submitter, workers and compositor was broken
    ChannelProtocol {
        /// Description of the violation
        reason: String,
    },

    /// Run parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Failed to save the composited image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Failed to serialize the usage manifest
    Manifest {
        /// Path the manifest was being written to
        path: PathBuf,
        /// Underlying serialization error
        source: serde_json::Error,
    },
}

impl fmt::Display for MosaicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::UnusableImage { identifier, reason } => {
                write!(f, "Unusable candidate '{identifier}': {reason}")
            }
            Self::EmptyCatalog { offered, skipped } => {
                write!(
                    f,
                    "No usable candidate tiles ({offered} offered, {skipped} unusable)"
                )
            }
            Self::Cancelled { stage } => {
                write!(f, "Cancelled during {stage}, no output written")
            }
            Self::NoEligibleCandidate { catalog_size } => {
                write!(
                    f,
                    "No eligible candidate among {catalog_size} catalog entries"
                )
            }
            Self::ChannelProtocol { reason } => {
                write!(f, "Pipeline shutdown protocol violated: {reason}")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Manifest { path, source } => {
                write!(
                    f,
                    "Failed to write manifest '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for MosaicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            Self::Manifest { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for mosaic results
pub type Result<T> = std::result::Result<T, MosaicError>;

/// Attaches the offending path to file system failures
pub trait WithPath<T> {
    /// Wrap an I/O failure with the path and operation that caused it
    ///
    /// # Errors
    ///
    /// Propagates the original error as [`MosaicError::FileSystem`]
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T>;
}

impl<T> WithPath<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T> {
        self.map_err(|source| MosaicError::FileSystem {
            path: path.to_path_buf(),
            operation,
            source,
        })
    }
}

impl From<image::ImageError> for MosaicError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageLoad {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<std::io::Error> for MosaicError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> MosaicError {
    MosaicError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a pipeline protocol violation error
pub fn protocol_violation(reason: &impl ToString) -> MosaicError {
    MosaicError::ChannelProtocol {
        reason: reason.to_string(),
    }
}
