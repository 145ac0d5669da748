//! Filesystem-backed object store.
//!
//! Useful for air-gapped mirrors of a bucket and for exercising the release
//! pipeline end to end without cloud credentials.

use super::{ObjectStore, ObjectStoreError};
use log::{debug, info};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// URL scheme prefix accepted for local object keys.
pub const FILE_PREFIX: &str = "file://";

/// [`ObjectStore`] whose keys are local filesystem paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalObjectStore;

impl LocalObjectStore {
    fn resolve(key: &str) -> PathBuf {
        PathBuf::from(key.strip_prefix(FILE_PREFIX).unwrap_or(key))
    }
}

impl ObjectStore for LocalObjectStore {
    fn copy_to_local(
        &self,
        src_key: &str,
        dst: &Path,
        allow_missing: bool,
    ) -> Result<bool, ObjectStoreError> {
        let src = Self::resolve(src_key);
        let io_error = |source| ObjectStoreError::Io {
            key: src_key.to_owned(),
            source,
        };

        match std::fs::metadata(&src) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(ObjectStoreError::Command {
                    operation: "cp",
                    key: src_key.to_owned(),
                    message: "not a regular file".to_owned(),
                });
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                if allow_missing {
                    info!("Object {src_key} does not exist, skipping copy");
                    return Ok(false);
                }
                return Err(ObjectStoreError::NotFound {
                    key: src_key.to_owned(),
                });
            }
            Err(err) => return Err(io_error(err)),
        }

        debug!("Copying {} to {}", src.display(), dst.display());
        std::fs::copy(&src, dst).map_err(io_error)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain_path(false)]
    #[case::file_url(true)]
    fn copies_existing_file(#[case] as_url: bool) {
        let temp = tempfile::tempdir().expect("temp dir");
        let src = temp.path().join("kubernetes-src.tar.gz");
        std::fs::write(&src, b"archive").expect("write source");
        let dst = temp.path().join("copy.tar.gz");
        let key = if as_url {
            format!("{FILE_PREFIX}{}", src.display())
        } else {
            src.display().to_string()
        };

        let copied = LocalObjectStore
            .copy_to_local(&key, &dst, false)
            .expect("copy should succeed");

        assert!(copied);
        assert_eq!(std::fs::read(&dst).expect("read copy"), b"archive");
    }

    #[rstest]
    #[case::required(false)]
    #[case::optional(true)]
    fn missing_file_respects_allow_missing(#[case] allow_missing: bool) {
        let temp = tempfile::tempdir().expect("temp dir");
        let dst = temp.path().join("copy");
        let key = temp.path().join("absent").display().to_string();

        let result = LocalObjectStore.copy_to_local(&key, &dst, allow_missing);

        if allow_missing {
            assert!(matches!(result, Ok(false)));
        } else {
            assert!(matches!(result, Err(ObjectStoreError::NotFound { .. })));
        }
        assert!(!dst.exists());
    }

    #[test]
    fn directories_are_not_objects() {
        let temp = tempfile::tempdir().expect("temp dir");
        let key = temp.path().display().to_string();
        let result = LocalObjectStore.copy_to_local(&key, &temp.path().join("copy"), false);
        assert!(matches!(result, Err(ObjectStoreError::Command { .. })));
    }
}
