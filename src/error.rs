//! Error types for workspace preparation.
//!
//! Every failure returned by [`crate::stage`] or [`crate::release`] is a
//! [`WorkspaceError`]. Collaborator failures keep their original error as the
//! source and are tagged with the [`Step`] that produced them, so callers can
//! report which part of the pipeline failed without parsing messages.

use crate::archive::ExtractionError;
use crate::git::GitError;
use crate::license::LicenseError;
use crate::object::ObjectStoreError;
use crate::step::Step;
use thiserror::Error;

/// Broad classification of a [`WorkspaceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required input or environment variable is missing or invalid.
    Configuration,
    /// An external collaborator (git, object storage, license source,
    /// extractor) failed.
    Collaborator,
    /// The local environment could not provide a scratch resource.
    Environment,
}

/// Errors returned by the stage and release pipelines.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// A required environment variable is not set.
    #[error("{variable} env variable is not set")]
    MissingEnvVar {
        /// Name of the missing variable.
        variable: String,
    },

    /// A required environment variable is set but does not hold UTF-8 text.
    #[error("{variable} env variable is not valid UTF-8")]
    InvalidEnvVar {
        /// Name of the offending variable.
        variable: String,
    },

    /// A caller-supplied argument was rejected before any work started.
    #[error("invalid {name}: {reason}")]
    InvalidArgument {
        /// Name of the argument.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A collaborator failed while executing a pipeline step.
    #[error("{}: {source}", step.context())]
    Collaborator {
        /// The step that failed.
        step: Step,
        /// The collaborator's own error.
        #[source]
        source: CollaboratorError,
    },

    /// Creating or removing the ephemeral download directory failed.
    #[error("{operation} staged sources temp dir: {source}")]
    Environment {
        /// `create` or `remove`.
        operation: &'static str,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

impl WorkspaceError {
    /// Returns the broad classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingEnvVar { .. }
            | Self::InvalidEnvVar { .. }
            | Self::InvalidArgument { .. } => ErrorKind::Configuration,
            Self::Collaborator { .. } => ErrorKind::Collaborator,
            Self::Environment { .. } => ErrorKind::Environment,
        }
    }

    /// Returns the failing step for collaborator errors.
    #[must_use]
    pub const fn step(&self) -> Option<Step> {
        match self {
            Self::Collaborator { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Failure reported by one of the external collaborators.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// Source control failure.
    #[error(transparent)]
    Git(#[from] GitError),

    /// Object storage failure.
    #[error(transparent)]
    ObjectStore(#[from] ObjectStoreError),

    /// License download or cache failure.
    #[error(transparent)]
    License(#[from] LicenseError),

    /// Archive extraction failure.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Result type alias using [`WorkspaceError`].
pub type Result<T> = std::result::Result<T, WorkspaceError>;
