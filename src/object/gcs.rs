//! Google Cloud Storage backend driven by `gsutil`.

use super::{ObjectStore, ObjectStoreError};
use crate::exec::{CommandExecutor, args, failure_message};
use log::{debug, info};
use std::path::Path;

/// URL scheme prefix of GCS object keys.
pub const GCS_PREFIX: &str = "gs://";

/// [`ObjectStore`] backed by the `gsutil` command-line client.
pub struct GcsObjectStore<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> GcsObjectStore<'a> {
    /// Creates a store that runs `gsutil` through `executor`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }

    /// Prefixes `key` with `gs://` unless it already carries the scheme.
    ///
    /// # Examples
    ///
    /// ```
    /// use release_workspace::object::GcsObjectStore;
    ///
    /// assert_eq!(GcsObjectStore::normalize("bucket/a"), "gs://bucket/a");
    /// assert_eq!(GcsObjectStore::normalize("gs://bucket/a"), "gs://bucket/a");
    /// ```
    #[must_use]
    pub fn normalize(key: &str) -> String {
        if key.starts_with(GCS_PREFIX) {
            key.to_owned()
        } else {
            format!("{GCS_PREFIX}{}", key.trim_start_matches('/'))
        }
    }

    /// Returns whether the object at `key` exists.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::Command`] if `gsutil` fails for a reason
    /// other than the object being absent.
    pub fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        let output = self
            .executor
            .run("gsutil", &args(["-q", "stat", key]))
            .map_err(|err| ObjectStoreError::Command {
                operation: "stat",
                key: key.to_owned(),
                message: err.to_string(),
            })?;

        if output.status.success() {
            return Ok(true);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if output.status.code() == Some(1)
            && (stderr.trim().is_empty() || stderr.contains("No URLs matched"))
        {
            return Ok(false);
        }

        Err(ObjectStoreError::Command {
            operation: "stat",
            key: key.to_owned(),
            message: failure_message(&output),
        })
    }
}

impl ObjectStore for GcsObjectStore<'_> {
    fn copy_to_local(
        &self,
        src_key: &str,
        dst: &Path,
        allow_missing: bool,
    ) -> Result<bool, ObjectStoreError> {
        let key = Self::normalize(src_key);

        if !self.exists(&key)? {
            if allow_missing {
                info!("Object {key} does not exist, skipping copy");
                return Ok(false);
            }
            return Err(ObjectStoreError::NotFound { key });
        }

        debug!("Copying {key} to {}", dst.display());
        let dst = dst.display().to_string();
        let output = self
            .executor
            .run("gsutil", &args(["-q", "cp", key.as_str(), dst.as_str()]))
            .map_err(|err| ObjectStoreError::Command {
                operation: "cp",
                key: key.clone(),
                message: err.to_string(),
            })?;

        if !output.status.success() {
            return Err(ObjectStoreError::Command {
                operation: "cp",
                key,
                message: failure_message(&output),
            });
        }

        Ok(true)
    }
}
