//! Fixed-size colour fingerprints and the reducer that produces them
//!
//! Every image is reduced twice: a large fingerprint at tile resolution that
//! gets painted into the mosaic, and a small fingerprint used for matching.
//! Both are square and derived from the same centred square crop.

use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::io::image::{center_square, pixels, resize_square};
use image::{DynamicImage, RgbImage};

/// One RGB sample
pub type Rgb = [u8; 3];

/// Square grid of RGB samples in row-major order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    edge: u32,
    pixels: Vec<Rgb>,
}

impl Fingerprint {
    /// Wrap row-major samples of an `edge` x `edge` grid
    ///
    /// # Errors
    ///
    /// Returns an error if the sample count is not `edge * edge`
    pub fn new(edge: u32, pixels: Vec<Rgb>) -> Result<Self> {
        let expected = (edge as usize) * (edge as usize);
        if edge == 0 || pixels.len() != expected {
            return Err(invalid_parameter(
                "fingerprint",
                &pixels.len(),
                &format!("expected {expected} samples for edge {edge}"),
            ));
        }
        Ok(Self { edge, pixels })
    }

    /// Fingerprint where every sample has the same colour
    pub fn uniform(edge: u32, colour: Rgb) -> Self {
        Self {
            edge,
            pixels: vec![colour; (edge as usize) * (edge as usize)],
        }
    }

    /// Take the samples of a square RGB raster
    ///
    /// # Errors
    ///
    /// Returns an error if the raster is empty or not square
    pub fn from_rgb_image(img: &RgbImage) -> Result<Self> {
        if img.width() != img.height() {
            return Err(invalid_parameter(
                "fingerprint",
                &format!("{}x{}", img.width(), img.height()),
                &"fingerprint rasters must be square",
            ));
        }
        Self::new(img.width(), pixels(img))
    }

    /// Edge length in samples
    pub const fn edge(&self) -> u32 {
        self.edge
    }

    /// Row-major samples
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Whether the fingerprint holds no samples
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Large and small fingerprints of one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFingerprints {
    /// Tile-resolution samples used for compositing
    pub large: Fingerprint,
    /// Low-resolution samples used for matching
    pub small: Fingerprint,
}

/// Reduces images to a pair of square fingerprints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintReducer {
    tile_size: u32,
    small_edge: u32,
}

impl FingerprintReducer {
    /// Create a reducer for the given tile edge and match resolution
    ///
    /// The match resolution is the block size in large pixels that collapses
    /// into one small sample. It is clamped to `1..=tile_size`.
    ///
    /// # Errors
    ///
    /// Returns an error if `tile_size` is zero
    pub fn new(tile_size: u32, match_resolution: u32) -> Result<Self> {
        if tile_size == 0 {
            return Err(invalid_parameter(
                "tile_size",
                &tile_size,
                &"must be positive",
            ));
        }
        Ok(Self {
            tile_size,
            small_edge: Self::small_edge_for(tile_size, match_resolution),
        })
    }

    /// Edge of the matching fingerprint for a tile edge and block size
    pub fn small_edge_for(tile_size: u32, match_resolution: u32) -> u32 {
        let block = match_resolution.clamp(1, tile_size.max(1));
        (tile_size / block).max(1)
    }

    /// Edge of the large fingerprint
    pub const fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Edge of the small fingerprint
    pub const fn small_edge(&self) -> u32 {
        self.small_edge
    }

    /// Crop, resize and sample an image into both fingerprints
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::UnusableImage`] if the image has no usable area
    pub fn reduce(&self, identifier: &str, img: &DynamicImage) -> Result<TileFingerprints> {
        let square = center_square(img).ok_or_else(|| MosaicError::UnusableImage {
            identifier: identifier.to_string(),
            reason: format!("cannot crop a {}x{} image", img.width(), img.height()),
        })?;

        let large_img = resize_square(&square, self.tile_size);
        let small_img = resize_square(&large_img, self.small_edge);

        Ok(TileFingerprints {
            large: Fingerprint::from_rgb_image(&large_img.to_rgb8())?,
            small: Fingerprint::from_rgb_image(&small_img.to_rgb8())?,
        })
    }
}
