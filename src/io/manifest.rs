//! JSON export of the position-ordered usage manifest

use crate::io::error::{MosaicError, Result, WithPath};
use crate::spatial::mosaic::{ManifestEntry, MosaicSummary};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
struct ManifestDocument<'a> {
    columns: u32,
    rows: u32,
    painted_cells: usize,
    total_cells: usize,
    distinct_tiles: usize,
    total_bytes: u64,
    ordered_catalog_indices: Vec<usize>,
    entries: &'a [ManifestEntry],
}

impl<'a> From<&'a MosaicSummary> for ManifestDocument<'a> {
    fn from(summary: &'a MosaicSummary) -> Self {
        Self {
            columns: summary.columns,
            rows: summary.rows,
            painted_cells: summary.painted_cells,
            total_cells: summary.total_cells,
            distinct_tiles: summary.distinct_tiles,
            total_bytes: summary.total_bytes,
            ordered_catalog_indices: summary.ordered_catalog_indices(),
            entries: &summary.entries,
        }
    }
}

/// Serialize a summary as pretty-printed JSON
///
/// # Errors
///
/// Returns an error if serialization fails
pub fn manifest_json(summary: &MosaicSummary) -> Result<String> {
    serde_json::to_string_pretty(&ManifestDocument::from(summary)).map_err(|source| {
        MosaicError::Manifest {
            path: "<memory>".into(),
            source,
        }
    })
}

/// Write a summary to `path` as pretty-printed JSON
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory or the file cannot be created
/// - Serialization or the final flush fails
pub fn write_manifest(summary: &MosaicSummary, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_path(parent, "create directory")?;
        }
    }

    let file = File::create(path).with_path(path, "create manifest")?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &ManifestDocument::from(summary)).map_err(
        |source| MosaicError::Manifest {
            path: path.to_path_buf(),
            source,
        },
    )?;
    writer.flush().with_path(path, "write manifest")
}
