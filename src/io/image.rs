//! Image decoding, square cropping, resizing and export

use crate::analysis::fingerprint::Rgb;
use crate::io::error::{MosaicError, Result, WithPath};
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader, ImageResult, RgbImage};
use std::io::{BufRead, Cursor, Seek};
use std::path::Path;

/// Interpolation used for every downscale
pub const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

// Applies EXIF orientation before handing the pixels back
fn decode_oriented<R: BufRead + Seek>(reader: ImageReader<R>) -> ImageResult<DynamicImage> {
    let mut decoder = reader.with_guessed_format()?.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Decode an image file, honouring its EXIF orientation
///
/// # Errors
///
/// Returns an error if the file cannot be opened or its contents cannot be decoded
pub fn decode_path(path: &Path) -> Result<DynamicImage> {
    let reader = ImageReader::open(path).with_path(path, "open image")?;
    decode_oriented(reader).map_err(|source| MosaicError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode an in-memory encoded image, honouring its EXIF orientation
///
/// # Errors
///
/// Returns an error if the format cannot be guessed or the bytes cannot be decoded
pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    decode_oriented(ImageReader::new(Cursor::new(bytes))).map_err(MosaicError::from)
}

/// Crop to the largest centred square
///
/// Returns `None` for degenerate images with a zero-length side.
pub fn center_square(img: &DynamicImage) -> Option<DynamicImage> {
    let (width, height) = (img.width(), img.height());
    let side = width.min(height);
    if side == 0 {
        return None;
    }
    let x = (width - side) / 2;
    let y = (height - side) / 2;
    Some(img.crop_imm(x, y, side, side))
}

/// Resize to an exact square edge
pub fn resize_square(img: &DynamicImage, edge: u32) -> DynamicImage {
    img.resize_exact(edge, edge, RESIZE_FILTER)
}

/// Row-major RGB samples of an image
pub fn pixels(img: &RgbImage) -> Vec<Rgb> {
    img.pixels().map(|pixel| pixel.0).collect()
}

/// Save an RGB raster, creating the parent directory if needed
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be created
/// - The image cannot be encoded to the format implied by the extension
pub fn save_image(img: &RgbImage, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_path(parent, "create directory")?;
        }
    }

    img.save(output_path)
        .map_err(|source| MosaicError::ImageExport {
            path: output_path.to_path_buf(),
            source,
        })
}
