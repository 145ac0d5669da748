//! Named pipeline steps and the fail-fast runner shared by both phases.

use crate::error::{CollaboratorError, Result, WorkspaceError};
use log::debug;
use std::fmt;

/// A named step of the stage or release pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Clone or open the source checkout.
    Clone,
    /// Prewarm the license-metadata cache.
    LicenseCache,
    /// Copy the staged sources archive out of object storage.
    FetchStagedSources,
    /// Extract the staged sources into the workspace.
    Extract,
    /// Rewrite the checkout's default remote with fresh credentials.
    SetRemote,
}

impl Step {
    /// Stable tag used in logs and error reports.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Clone => "clone",
            Self::LicenseCache => "license-cache",
            Self::FetchStagedSources => "fetch-staged-sources",
            Self::Extract => "extract",
            Self::SetRemote => "set-remote",
        }
    }

    /// Short phrase prefixed to the collaborator's error message.
    #[must_use]
    pub const fn context(self) -> &'static str {
        match self {
            Self::Clone => "clone source repository",
            Self::LicenseCache => "prewarm license cache",
            Self::FetchStagedSources => "copy staged sources from object storage",
            Self::Extract => "extract staged sources",
            Self::SetRemote => "change git remote of repository",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Runs one step, wrapping a failure with the step's tag.
///
/// # Errors
///
/// Returns [`WorkspaceError::Collaborator`] carrying `step` when `action`
/// fails.
pub fn run_step<T, E>(step: Step, action: impl FnOnce() -> std::result::Result<T, E>) -> Result<T>
where
    E: Into<CollaboratorError>,
{
    debug!("step {step}: starting");
    match action() {
        Ok(value) => {
            debug!("step {step}: done");
            Ok(value)
        }
        Err(err) => Err(WorkspaceError::Collaborator {
            step,
            source: err.into(),
        }),
    }
}
