//! Mosaic raster compositing and manifest summarization
//!
//! The compositor is the only owner of the output raster. Tiles arrive in
//! completion order, so the manifest is chronological until `finalize`
//! restores raster-scan order.

use crate::analysis::catalog::Candidate;
use crate::analysis::fingerprint::Fingerprint;
use crate::io::error::{Result, invalid_parameter};
use crate::io::image::save_image;
use crate::spatial::{GridLayout, TileBox};
use bitvec::prelude::{BitVec, bitvec};
use image::RgbImage;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Which candidate filled which cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Display name of the candidate
    pub display_name: String,
    /// Cell rectangle in the mosaic raster
    pub tile_box: TileBox,
    /// Encoded size of the candidate in bytes
    pub byte_size: u64,
    /// Catalog index of the candidate
    pub catalog_index: usize,
}

/// Position-ordered manifest plus download aggregates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MosaicSummary {
    /// Tile columns of the mosaic
    pub columns: u32,
    /// Tile rows of the mosaic
    pub rows: u32,
    /// Manifest sorted by `(y, x)` of each box
    pub entries: Vec<ManifestEntry>,
    /// Number of distinct display names used
    pub distinct_tiles: usize,
    /// Bytes summed over the first occurrence of each display name
    pub total_bytes: u64,
    /// Cells that received a tile
    pub painted_cells: usize,
    /// Cells in the grid
    pub total_cells: usize,
}

impl MosaicSummary {
    /// Build the summary from a chronological manifest
    pub fn from_manifest(
        mut entries: Vec<ManifestEntry>,
        layout: &GridLayout,
        painted_cells: usize,
    ) -> Self {
        entries.sort_by_key(|entry| entry.tile_box.raster_key());

        let mut seen = HashSet::new();
        let mut total_bytes = 0;
        for entry in &entries {
            if seen.insert(entry.display_name.as_str()) {
                total_bytes += entry.byte_size;
            }
        }
        let distinct_tiles = seen.len();

        Self {
            columns: layout.x_tiles(),
            rows: layout.y_tiles(),
            entries,
            distinct_tiles,
            total_bytes,
            painted_cells,
            total_cells: layout.cell_count(),
        }
    }

    /// Catalog indices in raster-scan order
    pub fn ordered_catalog_indices(&self) -> Vec<usize> {
        self.entries.iter().map(|entry| entry.catalog_index).collect()
    }

    /// Whether every cell received a tile
    pub const fn is_complete(&self) -> bool {
        self.painted_cells == self.total_cells
    }
}

/// Accumulating output raster and chronological usage manifest
pub struct MosaicImage {
    raster: RgbImage,
    layout: GridLayout,
    painted: BitVec,
    manifest: Vec<ManifestEntry>,
}

impl MosaicImage {
    /// Create a black raster sized for the layout
    pub fn new(layout: GridLayout) -> Self {
        Self {
            raster: RgbImage::new(layout.width(), layout.height()),
            layout,
            painted: bitvec![0; layout.cell_count()],
            manifest: Vec::new(),
        }
    }

    /// Paint a large fingerprint into a cell
    ///
    /// # Errors
    ///
    /// Returns an error if the box is not a cell of this grid or the
    /// fingerprint edge differs from the tile size
    pub fn add_tile(&mut self, large: &Fingerprint, tile_box: TileBox) -> Result<()> {
        let cell = self.layout.cell_index(&tile_box).ok_or_else(|| {
            invalid_parameter(
                "tile_box",
                &format!("{tile_box:?}"),
                &"not a cell of the mosaic grid",
            )
        })?;
        let edge = large.edge();
        if edge != self.layout.tile_size() {
            return Err(invalid_parameter(
                "fingerprint",
                &edge,
                &format!("tile fingerprints must have edge {}", self.layout.tile_size()),
            ));
        }

        for (offset, sample) in large.pixels().iter().enumerate() {
            let offset = offset as u32;
            let x = tile_box.x0 + offset % edge;
            let y = tile_box.y0 + offset / edge;
            if let Some(pixel) = self.raster.get_pixel_mut_checked(x, y) {
                *pixel = image::Rgb(*sample);
            }
        }
        self.painted.set(cell, true);
        Ok(())
    }

    /// Paint a candidate into a cell and append it to the manifest
    ///
    /// # Errors
    ///
    /// Returns an error if the tile cannot be painted
    pub fn place(&mut self, candidate: &Candidate, tile_box: TileBox) -> Result<()> {
        self.add_tile(candidate.large(), tile_box)?;
        self.manifest.push(ManifestEntry {
            display_name: candidate.display_name().to_string(),
            tile_box,
            byte_size: candidate.byte_size(),
            catalog_index: candidate.catalog_index(),
        });
        Ok(())
    }

    /// Grid the mosaic is laid out on
    pub const fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Current raster
    pub const fn raster(&self) -> &RgbImage {
        &self.raster
    }

    /// Manifest in completion order
    pub fn manifest(&self) -> &[ManifestEntry] {
        &self.manifest
    }

    /// Number of cells painted so far
    pub fn painted_cells(&self) -> usize {
        self.painted.count_ones()
    }

    /// Whether the cell at a grid position has been painted
    pub fn is_painted(&self, grid_x: u32, grid_y: u32) -> bool {
        let index = self.layout.cell_index(&self.layout.large_box(grid_x, grid_y));
        index
            .and_then(|index| self.painted.get(index).map(|bit| *bit))
            .unwrap_or(false)
    }

    /// Write the raster to disk
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be saved
    pub fn save(&self, path: &Path) -> Result<()> {
        save_image(&self.raster, path)
    }

    /// Summarize without persisting
    pub fn into_summary(self) -> MosaicSummary {
        let painted = self.painted_cells();
        MosaicSummary::from_manifest(self.manifest, &self.layout, painted)
    }

    /// Save the raster and summarize the manifest
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be saved
    pub fn finalize(self, path: &Path) -> Result<MosaicSummary> {
        self.save(path)?;
        info!("Finished, wrote output image to {}", path.display());
        Ok(self.into_summary())
    }
}
