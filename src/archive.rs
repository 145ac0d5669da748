//! Extraction of staged source archives.
//!
//! Staged sources are published as gzip-compressed tarballs whose entries are
//! relative to the extraction root. Entries that would escape the destination
//! are rejected before anything is written for them.

use log::debug;
use std::path::{Component, Path};

/// Trait for extracting archives, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extracts the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the number of entries unpacked.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if an entry attempts to
    /// escape `dest_dir`, [`ExtractionError::EmptyArchive`] if the archive
    /// has no entries, and [`ExtractionError::Io`] on I/O failures.
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extracting {archive}: {source}")]
    Io {
        /// The archive being extracted.
        archive: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no entries.
    #[error("archive contains no entries")]
    EmptyArchive,
}

/// Extractor for `.tar.gz` archives using the `flate2` and `tar` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> Result<usize, ExtractionError> {
        let io_error = |source| ExtractionError::Io {
            archive: archive_path.display().to_string(),
            source,
        };

        std::fs::create_dir_all(dest_dir).map_err(io_error)?;
        let file = std::fs::File::open(archive_path).map_err(io_error)?;
        let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
        archive.set_preserve_mtime(true);
        let mut unpacked = 0_usize;

        for entry_result in archive.entries().map_err(io_error)? {
            let mut entry = entry_result.map_err(io_error)?;
            let entry_path = entry.path().map_err(io_error)?.into_owned();

            validate_entry_path(&entry_path)?;

            if entry.unpack_in(dest_dir).map_err(io_error)? {
                unpacked += 1;
            } else {
                return Err(ExtractionError::PathTraversal {
                    path: entry_path.display().to_string(),
                });
            }
        }

        if unpacked == 0 {
            return Err(ExtractionError::EmptyArchive);
        }

        debug!(
            "Extracted {unpacked} entries from {} into {}",
            archive_path.display(),
            dest_dir.display()
        );
        Ok(unpacked)
    }
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}
