//! Grid geometry for the target image
//!
//! The target is split into `x_tiles` by `y_tiles` cells. Each cell covers a
//! `tile_size` square in the large raster and a `small_edge` square in the
//! matching raster.

use crate::analysis::fingerprint::Fingerprint;
use crate::io::configuration::{MAX_TILE_SIZE, MAX_TILES_PER_AXIS};
use crate::io::error::{Result, invalid_parameter};
use serde::Serialize;

/// Pixel rectangle `[x0, x1) x [y0, y1)` in large raster coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TileBox {
    /// Left edge (inclusive)
    pub x0: u32,
    /// Top edge (inclusive)
    pub y0: u32,
    /// Right edge (exclusive)
    pub x1: u32,
    /// Bottom edge (exclusive)
    pub y1: u32,
}

impl TileBox {
    /// Width in pixels
    pub const fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    /// Height in pixels
    pub const fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    /// Sort key placing boxes in raster-scan order
    pub const fn raster_key(&self) -> (u32, u32) {
        (self.y0, self.x0)
    }
}

/// One grid position of the target awaiting a tile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Matching fingerprint of the target region
    pub small: Fingerprint,
    /// Destination rectangle in the mosaic raster
    pub large_box: TileBox,
    /// Column index
    pub grid_x: u32,
    /// Row index
    pub grid_y: u32,
}

/// Tile counts and edge lengths of a mosaic grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    x_tiles: u32,
    y_tiles: u32,
    tile_size: u32,
    small_edge: u32,
}

impl GridLayout {
    /// Create a validated layout
    ///
    /// # Errors
    ///
    /// Returns an error if any dimension is zero or exceeds the safety limits
    pub fn new(x_tiles: u32, y_tiles: u32, tile_size: u32, small_edge: u32) -> Result<Self> {
        for (parameter, value) in [("tiles_per_row", x_tiles), ("tiles_per_column", y_tiles)] {
            if value == 0 || value > MAX_TILES_PER_AXIS {
                return Err(invalid_parameter(
                    parameter,
                    &value,
                    &format!("must be between 1 and {MAX_TILES_PER_AXIS}"),
                ));
            }
        }
        if tile_size == 0 || tile_size > MAX_TILE_SIZE {
            return Err(invalid_parameter(
                "tile_size",
                &tile_size,
                &format!("must be between 1 and {MAX_TILE_SIZE}"),
            ));
        }
        if small_edge == 0 || small_edge > tile_size {
            return Err(invalid_parameter(
                "small_edge",
                &small_edge,
                &"must be between 1 and the tile size",
            ));
        }
        Ok(Self {
            x_tiles,
            y_tiles,
            tile_size,
            small_edge,
        })
    }

    /// Number of tile columns
    pub const fn x_tiles(&self) -> u32 {
        self.x_tiles
    }

    /// Number of tile rows
    pub const fn y_tiles(&self) -> u32 {
        self.y_tiles
    }

    /// Edge of a composited tile in pixels
    pub const fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Edge of a matching fingerprint in samples
    pub const fn small_edge(&self) -> u32 {
        self.small_edge
    }

    /// Total number of cells
    pub const fn cell_count(&self) -> usize {
        self.x_tiles as usize * self.y_tiles as usize
    }

    /// Width of the mosaic raster
    pub const fn width(&self) -> u32 {
        self.x_tiles * self.tile_size
    }

    /// Height of the mosaic raster
    pub const fn height(&self) -> u32 {
        self.y_tiles * self.tile_size
    }

    /// Width of the matching raster
    pub const fn small_width(&self) -> u32 {
        self.x_tiles * self.small_edge
    }

    /// Height of the matching raster
    pub const fn small_height(&self) -> u32 {
        self.y_tiles * self.small_edge
    }

    /// Destination rectangle of a cell in the mosaic raster
    pub const fn large_box(&self, grid_x: u32, grid_y: u32) -> TileBox {
        Self::scaled_box(grid_x, grid_y, self.tile_size)
    }

    /// Source rectangle of a cell in the matching raster
    pub const fn small_box(&self, grid_x: u32, grid_y: u32) -> TileBox {
        Self::scaled_box(grid_x, grid_y, self.small_edge)
    }

    const fn scaled_box(grid_x: u32, grid_y: u32, edge: u32) -> TileBox {
        TileBox {
            x0: grid_x * edge,
            y0: grid_y * edge,
            x1: (grid_x + 1) * edge,
            y1: (grid_y + 1) * edge,
        }
    }

    /// Raster-order index of the cell a large box covers
    ///
    /// Returns `None` if the box is not exactly one cell of this grid.
    pub const fn cell_index(&self, tile_box: &TileBox) -> Option<usize> {
        if tile_box.x0 % self.tile_size != 0 || tile_box.y0 % self.tile_size != 0 {
            return None;
        }
        if tile_box.width() != self.tile_size || tile_box.height() != self.tile_size {
            return None;
        }
        let grid_x = tile_box.x0 / self.tile_size;
        let grid_y = tile_box.y0 / self.tile_size;
        if grid_x >= self.x_tiles || grid_y >= self.y_tiles {
            return None;
        }
        Some(grid_y as usize * self.x_tiles as usize + grid_x as usize)
    }

    /// Grid coordinate of the centre cell
    pub fn center(&self) -> [f64; 2] {
        [f64::from(self.x_tiles / 2), f64::from(self.y_tiles / 2)]
    }
}
