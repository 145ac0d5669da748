//! The stage phase: clone the source checkout and prewarm the license cache.
//!
//! Both steps run in order and the first failure stops the pipeline. Nothing
//! is rolled back; a failed license prewarm leaves the checkout in place so a
//! retry only repeats the work that failed.

use crate::error::Result;
use crate::git::{Checkout, SourceControl};
use crate::layout::RepositoryIdentity;
use crate::license::{LicenseDownloaderFactory, LicenseOptions};
use crate::step::{Step, run_step};
use camino::{Utf8Path, Utf8PathBuf};
use log::info;

/// Outcome of a successful [`WorkspaceStager::prepare_stage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    /// The checkout that was cloned or reopened.
    pub checkout: Checkout,
    /// Number of licenses now present in the cache.
    pub licenses: usize,
    /// The license cache directory that was prewarmed.
    pub cache_dir: Utf8PathBuf,
}

/// Prepares a workspace for the stage phase.
pub struct WorkspaceStager<'a> {
    identity: RepositoryIdentity,
    licenses: LicenseOptions,
    source_control: &'a dyn SourceControl,
    license_factory: &'a dyn LicenseDownloaderFactory,
}

impl<'a> WorkspaceStager<'a> {
    /// Creates a stager for `identity` using the given collaborators.
    #[must_use]
    pub fn new(
        identity: RepositoryIdentity,
        licenses: LicenseOptions,
        source_control: &'a dyn SourceControl,
        license_factory: &'a dyn LicenseDownloaderFactory,
    ) -> Self {
        Self {
            identity,
            licenses,
            source_control,
            license_factory,
        }
    }

    /// Clones (or reopens) the source checkout at `directory` and prewarms
    /// the license cache.
    ///
    /// Calling this again on an already-prepared directory reopens the
    /// existing checkout instead of cloning.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WorkspaceError::Collaborator`] tagged
    /// [`Step::Clone`] if the checkout cannot be prepared, or
    /// [`Step::LicenseCache`] if the cache cannot be built or filled.
    pub fn prepare_stage(&self, directory: &Utf8Path) -> Result<StageReport> {
        info!(
            "Preparing stage workspace for {} in {directory}",
            self.identity.slug()
        );

        let checkout = run_step(Step::Clone, || {
            self.source_control
                .clone_or_open(directory, &self.identity, false)
        })?;
        if checkout.was_cloned() {
            info!("Cloned {} into {}", self.identity.clone_url(), checkout.root());
        } else {
            info!("Reusing existing checkout at {}", checkout.root());
        }

        let options = self.licenses.downloader_options();
        let licenses = run_step(Step::LicenseCache, || {
            let downloader = self.license_factory.new_downloader(&options)?;
            downloader.fetch_all()
        })?;
        info!(
            "License cache at {} holds {} licenses",
            options.cache_dir,
            licenses.len()
        );

        Ok(StageReport {
            checkout,
            licenses: licenses.len(),
            cache_dir: options.cache_dir,
        })
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
