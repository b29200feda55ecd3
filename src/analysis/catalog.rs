//! Candidate sources and the indexed candidate catalog
//!
//! The catalog is built once per run from every candidate source in
//! identifier order, so catalog indices are reproducible across runs.
//! Sources that fail to decode are dropped and counted, never fatal.

use crate::analysis::fingerprint::{Fingerprint, FingerprintReducer, TileFingerprints};
use crate::io::error::{MosaicError, Result, WithPath};
use crate::io::image::{decode_bytes, decode_path};
use crate::io::interrupt::CancelToken;
use crate::io::progress::{ProgressCounter, ProgressSink};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Where the encoded bytes of a candidate live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateData {
    /// Encoded image file on disk
    Path(PathBuf),
    /// Encoded image held in memory
    Bytes(Vec<u8>),
}

/// One candidate offered to the catalog builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSource {
    /// Sort key and display name of the candidate
    pub identifier: String,
    /// Encoded image data
    pub data: CandidateData,
    /// Size of the encoded image in bytes
    pub byte_size: u64,
}

impl CandidateSource {
    /// Describe an image file, using its file name as identifier
    ///
    /// # Errors
    ///
    /// Returns an error if the file metadata cannot be read
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).with_path(path, "read metadata")?;
        let identifier = path
            .file_name()
            .unwrap_or(path.as_os_str())
            .to_string_lossy()
            .to_string();
        Ok(Self {
            identifier,
            data: CandidateData::Path(path.to_path_buf()),
            byte_size: metadata.len(),
        })
    }

    /// Describe an in-memory encoded image
    pub fn from_bytes(identifier: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            identifier: identifier.into(),
            byte_size: bytes.len() as u64,
            data: CandidateData::Bytes(bytes),
        }
    }

    /// Decode and reduce this source
    ///
    /// # Errors
    ///
    /// Every failure is reported as [`MosaicError::UnusableImage`]
    pub fn fingerprint(&self, reducer: &FingerprintReducer) -> Result<TileFingerprints> {
        let decoded = match &self.data {
            CandidateData::Path(path) => decode_path(path),
            CandidateData::Bytes(bytes) => decode_bytes(bytes),
        };
        let img = decoded.map_err(|err| MosaicError::UnusableImage {
            identifier: self.identifier.clone(),
            reason: err.to_string(),
        })?;
        reducer.reduce(&self.identifier, &img)
    }
}

/// Recursively list every file below `root` as a candidate source
///
/// Entries within a directory are visited in file-name order.
///
/// # Errors
///
/// Returns an error if `root` is not a readable directory
pub fn enumerate_directory(root: &Path) -> Result<Vec<CandidateSource>> {
    if !root.is_dir() {
        return Err(MosaicError::FileSystem {
            path: root.to_path_buf(),
            operation: "scan tiles directory",
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(err) => warn!("Error accessing tile entry: {err}"),
        }
    }

    let sources = sources_from_files(&files);
    debug!(
        root = %root.display(),
        count = sources.len(),
        skipped = files.len() - sources.len(),
        "Tiles directory scanned"
    );
    Ok(sources)
}

/// Describe each file as a candidate source
///
/// Files whose metadata cannot be read are logged and left out.
pub fn sources_from_files<P: AsRef<Path>>(files: &[P]) -> Vec<CandidateSource> {
    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        match CandidateSource::from_path(file.as_ref()) {
            Ok(source) => sources.push(source),
            Err(err) => warn!("Skipping tile: {err}"),
        }
    }
    sources
}

/// List candidate sources from several directories
///
/// # Errors
///
/// Returns an error if any directory cannot be scanned
pub fn enumerate_directories(roots: &[PathBuf]) -> Result<Vec<CandidateSource>> {
    let mut sources = Vec::new();
    for root in roots {
        sources.extend(enumerate_directory(root)?);
    }
    Ok(sources)
}

/// An indexed candidate tile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    display_name: String,
    fingerprints: TileFingerprints,
    byte_size: u64,
    catalog_index: usize,
}

impl Candidate {
    /// Catalog-unique display name
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Matching fingerprint
    pub const fn small(&self) -> &Fingerprint {
        &self.fingerprints.small
    }

    /// Compositing fingerprint
    pub const fn large(&self) -> &Fingerprint {
        &self.fingerprints.large
    }

    /// Encoded size in bytes
    pub const fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// Position in the catalog
    pub const fn catalog_index(&self) -> usize {
        self.catalog_index
    }
}

/// Fingerprinted candidate awaiting an index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Catalog-unique display name
    pub display_name: String,
    /// Reduced image data
    pub fingerprints: TileFingerprints,
    /// Encoded size in bytes
    pub byte_size: u64,
}

/// Counts gathered while building a catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    /// Sources offered to the builder
    pub offered: usize,
    /// Sources that were indexed
    pub indexed: usize,
    /// Sources rejected as unusable images
    pub unusable: usize,
    /// Sources dropped because their display name was already indexed
    pub duplicates: usize,
}

/// Read-only, indexed set of candidate tiles
#[derive(Debug, Clone)]
pub struct Catalog {
    candidates: Vec<Candidate>,
    stats: CatalogStats,
}

impl Catalog {
    /// Fingerprint every source in identifier order and index the usable ones
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::EmptyCatalog`] if no source could be indexed
    pub fn build(
        sources: Vec<CandidateSource>,
        reducer: &FingerprintReducer,
        progress: &dyn ProgressSink,
    ) -> Result<Self> {
        Self::build_cancellable(sources, reducer, progress, &CancelToken::new())
    }

    /// Like [`Catalog::build`], checking `cancel` before each source
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::Cancelled`] once `cancel` is set, or
    /// [`MosaicError::EmptyCatalog`] if no source could be indexed
    pub fn build_cancellable(
        mut sources: Vec<CandidateSource>,
        reducer: &FingerprintReducer,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<Self> {
        sources.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        let mut stats = CatalogStats {
            offered: sources.len(),
            ..CatalogStats::default()
        };
        let mut counter = ProgressCounter::new(sources.len(), progress);
        let mut entries = Vec::with_capacity(sources.len());

        for source in sources {
            if cancel.is_cancelled() {
                return Err(MosaicError::Cancelled {
                    stage: "tile loading",
                });
            }
            match source.fingerprint(reducer) {
                Ok(fingerprints) => entries.push(CatalogEntry {
                    display_name: source.identifier,
                    fingerprints,
                    byte_size: source.byte_size,
                }),
                Err(err) => {
                    stats.unusable += 1;
                    debug!("Skipping candidate: {err}");
                }
            }
            counter.advance();
        }

        let catalog = Self::index(entries, &mut stats);
        info!(
            indexed = stats.indexed,
            unusable = stats.unusable,
            duplicates = stats.duplicates,
            "Processed {} tiles",
            stats.indexed
        );

        if catalog.is_empty() {
            return Err(MosaicError::EmptyCatalog {
                offered: stats.offered,
                skipped: stats.unusable + stats.duplicates,
            });
        }
        Ok(catalog)
    }

    /// Index already fingerprinted entries in the given order
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::EmptyCatalog`] if no entry could be indexed
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut stats = CatalogStats {
            offered: entries.len(),
            ..CatalogStats::default()
        };
        let catalog = Self::index(entries, &mut stats);
        if catalog.is_empty() {
            return Err(MosaicError::EmptyCatalog {
                offered: stats.offered,
                skipped: stats.duplicates,
            });
        }
        Ok(catalog)
    }

    // Assigns indices in order, keeping the first entry of each display name
    fn index(entries: Vec<CatalogEntry>, stats: &mut CatalogStats) -> Self {
        let mut seen = HashSet::new();
        let mut candidates = Vec::with_capacity(entries.len());

        for entry in entries {
            if !seen.insert(entry.display_name.clone()) {
                stats.duplicates += 1;
                warn!(name = %entry.display_name, "Duplicate tile name, keeping the first");
                continue;
            }
            let catalog_index = candidates.len();
            candidates.push(Candidate {
                display_name: entry.display_name,
                fingerprints: entry.fingerprints,
                byte_size: entry.byte_size,
                catalog_index,
            });
        }

        stats.indexed = candidates.len();
        Self {
            candidates,
            stats: *stats,
        }
    }

    /// Number of indexed candidates
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether no candidate is indexed
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidate at a catalog index
    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    /// Candidates in index order
    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    /// Counts gathered while building
    pub const fn stats(&self) -> CatalogStats {
        self.stats
    }
}
