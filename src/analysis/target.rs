//! Target image preparation and cell extraction

use crate::analysis::fingerprint::{Fingerprint, Rgb};
use crate::io::error::Result;
use crate::io::image::{RESIZE_FILTER, decode_path};
use crate::spatial::{Cell, GridLayout};
use image::DynamicImage;
use ndarray::{Array3, ArrayView1, Axis, s};
use std::path::Path;
use tracing::debug;

/// Matching raster of the target, split into grid cells
pub struct TargetImage {
    small: Array3<u8>,
    layout: GridLayout,
}

impl TargetImage {
    /// Load the target from disk and prepare it for the given layout
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be opened or decoded
    pub fn open(path: &Path, layout: GridLayout) -> Result<Self> {
        let img = decode_path(path)?;
        debug!(
            path = %path.display(),
            width = img.width(),
            height = img.height(),
            "Processing target image"
        );
        Ok(Self::from_image(&img, layout))
    }

    /// Prepare an already decoded target
    ///
    /// The image is stretched to the full mosaic size so every cell covers a
    /// whole tile, then reduced to the matching resolution.
    pub fn from_image(img: &DynamicImage, layout: GridLayout) -> Self {
        let large = img.resize_exact(layout.width(), layout.height(), RESIZE_FILTER);
        let small = large
            .resize_exact(layout.small_width(), layout.small_height(), RESIZE_FILTER)
            .to_rgb8();

        let shape = (small.height() as usize, small.width() as usize, 3);
        let raster = Array3::from_shape_fn(shape, |(y, x, c)| {
            small
                .get_pixel_checked(x as u32, y as u32)
                .and_then(|pixel| pixel.0.get(c).copied())
                .unwrap_or(0)
        });

        Self {
            small: raster,
            layout,
        }
    }

    /// Grid the target was prepared for
    pub const fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Matching fingerprint of a single cell
    pub fn cell_fingerprint(&self, grid_x: u32, grid_y: u32) -> Fingerprint {
        let tile_box = self.layout.small_box(grid_x, grid_y);
        let view = self.small.slice(s![
            tile_box.y0 as usize..tile_box.y1 as usize,
            tile_box.x0 as usize..tile_box.x1 as usize,
            ..
        ]);
        let samples: Vec<Rgb> = view.lanes(Axis(2)).into_iter().map(lane_rgb).collect();
        Fingerprint::new(self.layout.small_edge(), samples)
            .unwrap_or_else(|_| Fingerprint::uniform(self.layout.small_edge(), [0, 0, 0]))
    }

    /// Every cell of the grid, columns outermost
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(self.layout.cell_count());
        for grid_x in 0..self.layout.x_tiles() {
            for grid_y in 0..self.layout.y_tiles() {
                cells.push(Cell {
                    small: self.cell_fingerprint(grid_x, grid_y),
                    large_box: self.layout.large_box(grid_x, grid_y),
                    grid_x,
                    grid_y,
                });
            }
        }
        cells
    }
}

fn lane_rgb(lane: ArrayView1<'_, u8>) -> Rgb {
    let channel = |c: usize| lane.get(c).copied().unwrap_or(0);
    [channel(0), channel(1), channel(2)]
}
