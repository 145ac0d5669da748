//! Workspace preparation for the stage and release phases of a release
//! pipeline.
//!
//! [`WorkspaceStager`] clones the source checkout and prewarms the SPDX
//! license cache. [`WorkspaceReleaser`] unpacks the staged sources for a build
//! version and points the checkout's push remote at an authenticated URL.
//! Both run their steps strictly in order and stop at the first failure,
//! reporting which step failed through [`WorkspaceError`].
//!
//! External systems sit behind traits ([`SourceControl`], [`ObjectStore`],
//! [`LicenseDownloaderFactory`], [`ArchiveExtractor`]) so that every
//! collaborator can be substituted in tests.

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod git;
pub mod layout;
pub mod license;
pub mod logging;
pub mod object;
pub mod release;
pub mod remote;
pub mod stage;
pub mod step;

#[cfg(test)]
mod test_utils;

pub use archive::{ArchiveExtractor, TarGzExtractor};
pub use config::Config;
pub use error::{ErrorKind, Result, WorkspaceError};
pub use git::{Checkout, GitCli, SourceControl};
pub use layout::{RepositoryIdentity, StagedLayout};
pub use license::{LicenseDownloaderFactory, LicenseOptions};
pub use object::ObjectStore;
pub use release::{ReleaseReport, WorkspaceReleaser};
pub use stage::{StageReport, WorkspaceStager};
pub use step::Step;
