//! Run constants and configuration defaults

/// Edge length in pixels of a composited tile
pub const DEFAULT_TILE_SIZE: u32 = 50;

// Small fingerprint edge is tile size divided by this factor
/// Pixel block size used when reducing tiles for matching
pub const DEFAULT_MATCH_RESOLUTION: u32 = 8;

/// Number of tiles across each row of the mosaic
pub const DEFAULT_TILES_PER_ROW: u32 = 100;

/// Upper bound of the uniform jitter applied to cell fill order
pub const DEFAULT_RANDOM_RANGE: u32 = 10;

/// Maximum number of cells a single candidate may fill
pub const DEFAULT_MAX_OCCURRENCES_PER_TILE: usize = 10;

// Zero disables the per-candidate distance multiplier
/// Magnitude of the random distance multiplier
pub const DEFAULT_DIFF_VARIATION: f64 = 0.0;

/// Output path of the composited mosaic
pub const DEFAULT_OUTPUT_FILE: &str = "mosaic.jpeg";

// Safety limit to prevent excessive memory allocation
/// Maximum allowed tile count along either axis
pub const MAX_TILES_PER_AXIS: u32 = 1_000;

/// Maximum allowed tile edge in pixels
pub const MAX_TILE_SIZE: u32 = 1_024;

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "greedymosaic=info";
