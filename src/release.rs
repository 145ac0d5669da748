//! The release phase: unpack the staged sources and re-authenticate the
//! checkout's push remote.
//!
//! The staged archive is downloaded into a temporary directory that only
//! lives for the duration of one [`WorkspaceReleaser::prepare_release`] call
//! and is removed on every exit path. The caller's workspace itself is never
//! deleted.

use crate::archive::ArchiveExtractor;
use crate::error::{Result, WorkspaceError};
use crate::git::{Checkout, SourceControl};
use crate::layout::{RepositoryIdentity, StagedLayout, extraction_destination};
use crate::object::ObjectStore;
use crate::remote::{RemoteUrl, Secret};
use crate::step::{Step, run_step};
use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of the per-call download directory.
const STAGING_PREFIX: &str = "staged-";

/// Outcome of a successful [`WorkspaceReleaser::prepare_release`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseReport {
    /// The checkout whose remote was updated.
    pub checkout: Checkout,
    /// Object-storage key the staged sources were fetched from.
    pub archive_key: String,
    /// Directory the archive was extracted into.
    pub extracted_to: Utf8PathBuf,
}

/// Prepares a workspace for the release phase.
pub struct WorkspaceReleaser<'a> {
    identity: RepositoryIdentity,
    layout: StagedLayout,
    temp_root: Option<PathBuf>,
    source_control: &'a dyn SourceControl,
    object_store: &'a dyn ObjectStore,
    extractor: &'a dyn ArchiveExtractor,
}

impl<'a> WorkspaceReleaser<'a> {
    /// Creates a releaser for `identity` and `layout` using the given
    /// collaborators.
    #[must_use]
    pub fn new(
        identity: RepositoryIdentity,
        layout: StagedLayout,
        source_control: &'a dyn SourceControl,
        object_store: &'a dyn ObjectStore,
        extractor: &'a dyn ArchiveExtractor,
    ) -> Self {
        Self {
            identity,
            layout,
            temp_root: None,
            source_control,
            object_store,
            extractor,
        }
    }

    /// Creates the per-call download directory under `root` instead of the
    /// system temporary directory.
    #[must_use]
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Fetches the staged sources for `build_version` from `bucket`, extracts
    /// them into `directory`, and points the checkout's remote at an
    /// authenticated URL built from the token environment variable.
    ///
    /// # Errors
    ///
    /// - [`WorkspaceError::InvalidArgument`] if `build_version` or `bucket`
    ///   is empty. Other values are used verbatim.
    /// - [`WorkspaceError::Environment`] if the download directory cannot be
    ///   created, or cannot be removed after an otherwise successful run.
    /// - [`WorkspaceError::MissingEnvVar`] if the token variable is unset, or
    ///   [`WorkspaceError::InvalidEnvVar`] if it is not UTF-8. The remote is
    ///   left untouched in both cases. An empty token is accepted.
    /// - [`WorkspaceError::Collaborator`] tagged with the failing step.
    pub fn prepare_release(
        &self,
        directory: &Utf8Path,
        build_version: &str,
        bucket: &str,
    ) -> Result<ReleaseReport> {
        require_non_empty("build version", build_version)?;
        require_non_empty("bucket", bucket)?;

        info!("Preparing release workspace in {directory} for {build_version}");

        let staging = self.create_staging_dir()?;
        let outcome = self.release_with(staging.path(), directory, build_version, bucket);
        let staging_path = staging.path().to_owned();

        match (outcome, staging.close()) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(source)) => Err(WorkspaceError::Environment {
                operation: "remove",
                source,
            }),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(cleanup)) => {
                warn!(
                    "Failed to remove staged sources temp dir {}: {cleanup}",
                    staging_path.display()
                );
                Err(err)
            }
        }
    }

    fn create_staging_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX);
        let created = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        created.map_err(|source| WorkspaceError::Environment {
            operation: "create",
            source,
        })
    }

    fn release_with(
        &self,
        staging: &Path,
        directory: &Utf8Path,
        build_version: &str,
        bucket: &str,
    ) -> Result<ReleaseReport> {
        let archive_key = self.layout.archive_key(bucket, build_version);
        let archive_path = staging.join(&self.layout.archive_name);

        run_step(Step::FetchStagedSources, || {
            self.object_store
                .copy_to_local(&archive_key, &archive_path, false)
        })?;
        info!("Fetched {archive_key}");

        let destination = extraction_destination(directory, &self.identity.source_suffix());
        let entries = run_step(Step::Extract, || {
            self.extractor
                .extract(&archive_path, destination.as_std_path())
        })?;
        info!("Extracted {entries} entries into {destination}");

        let token = self.read_token()?;
        let url = RemoteUrl::authenticated(&self.identity, token);
        let checkout = run_step(Step::SetRemote, || {
            let checkout = self.source_control.open(directory)?;
            self.source_control
                .set_remote_url(&checkout, &self.identity.remote, &url)?;
            Ok::<_, crate::git::GitError>(checkout)
        })?;
        info!("Set remote {} of {} to {url}", self.identity.remote, checkout.root());

        Ok(ReleaseReport {
            checkout,
            archive_key,
            extracted_to: destination,
        })
    }

    fn read_token(&self) -> Result<Secret> {
        let variable = &self.identity.token_env;
        // Presence is what counts: an empty token is passed through as is.
        let value = std::env::var_os(variable).ok_or_else(|| WorkspaceError::MissingEnvVar {
            variable: variable.clone(),
        })?;
        let token = value
            .into_string()
            .map_err(|_| WorkspaceError::InvalidEnvVar {
                variable: variable.clone(),
            })?;
        Ok(Secret::new(token))
    }
}

fn require_non_empty(name: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(WorkspaceError::InvalidArgument {
            name,
            reason: "must not be empty".to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "release_tests.rs"]
mod tests;
