//! Object-storage access for staged build artefacts.
//!
//! [`ObjectStore`] copies a single object to a local path. Two backends are
//! provided: [`GcsObjectStore`] for Google Cloud Storage through `gsutil`, and
//! [`LocalObjectStore`] for buckets mirrored onto a local filesystem.

mod gcs;
mod local;

pub use self::gcs::{GCS_PREFIX, GcsObjectStore};
pub use self::local::{FILE_PREFIX, LocalObjectStore};

use crate::exec::CommandExecutor;
use std::path::Path;

/// Errors arising from object-storage operations.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    /// The object does not exist and missing objects are not allowed.
    #[error("object {key} does not exist")]
    NotFound {
        /// The key that was looked up.
        key: String,
    },

    /// The storage tool reported a failure.
    #[error("{operation} {key} failed: {message}")]
    Command {
        /// The operation (`stat`, `cp`).
        operation: &'static str,
        /// The key being accessed.
        key: String,
        /// Description of the failure.
        message: String,
    },

    /// A local I/O error occurred.
    #[error("I/O error copying {key}: {source}")]
    Io {
        /// The key being copied.
        key: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Object-storage collaborator.
#[cfg_attr(test, mockall::automock)]
pub trait ObjectStore {
    /// Copies the object at `src_key` to the local file `dst`.
    ///
    /// Returns `Ok(true)` if the object was copied and `Ok(false)` if it was
    /// missing and `allow_missing` permitted skipping it.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::NotFound`] when the object is missing and
    /// `allow_missing` is `false`, or another variant if the copy fails.
    fn copy_to_local(
        &self,
        src_key: &str,
        dst: &Path,
        allow_missing: bool,
    ) -> Result<bool, ObjectStoreError>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for Box<T> {
    fn copy_to_local(
        &self,
        src_key: &str,
        dst: &Path,
        allow_missing: bool,
    ) -> Result<bool, ObjectStoreError> {
        (**self).copy_to_local(src_key, dst, allow_missing)
    }
}

/// Selects the backend for `bucket`.
///
/// `file://` URLs and absolute paths are served from the local filesystem;
/// anything else (`gs://bucket` or a bare bucket name) goes to GCS.
pub fn object_store_for<'a>(
    bucket: &str,
    executor: &'a dyn CommandExecutor,
) -> Box<dyn ObjectStore + 'a> {
    if bucket.starts_with(FILE_PREFIX) || Path::new(bucket).is_absolute() {
        Box::new(LocalObjectStore)
    } else {
        Box::new(GcsObjectStore::new(executor))
    }
}
