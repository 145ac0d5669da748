//! Source-control operations on the workspace checkout.
//!
//! [`SourceControl`] is the seam the stager and releaser depend on. The
//! production implementation, [`GitCli`], drives the `git` binary through a
//! [`CommandExecutor`].

use crate::exec::{CommandExecutor, args, failure_message};
use crate::layout::RepositoryIdentity;
use crate::remote::RemoteUrl;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};

/// Errors arising from source-control operations.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// A git command failed or could not be run.
    #[error("git {operation} failed: {message}")]
    Command {
        /// The git operation (clone, remote set-url, ...).
        operation: &'static str,
        /// Description of the failure, with credentials redacted.
        message: String,
    },

    /// The directory is not a git checkout.
    #[error("{path} is not a git checkout")]
    NotACheckout {
        /// Path that was expected to be a checkout.
        path: Utf8PathBuf,
    },

    /// The directory holds a checkout of some other repository.
    #[error("{path} is a checkout of {found}, expected {expected}")]
    UnexpectedRepository {
        /// Path of the checkout.
        path: Utf8PathBuf,
        /// Remote URL found in the checkout.
        found: String,
        /// The expected `org/repo`.
        expected: String,
    },

    /// Preparing the clone destination failed.
    #[error("preparing {path}: {source}")]
    Io {
        /// Path being prepared.
        path: Utf8PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// A handle to an opened checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    root: Utf8PathBuf,
    cloned: bool,
}

impl Checkout {
    /// Creates a handle for the checkout at `root`.
    #[must_use]
    pub const fn new(root: Utf8PathBuf, cloned: bool) -> Self {
        Self { root, cloned }
    }

    /// Root directory of the checkout.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Whether the handle was produced by a fresh clone rather than by
    /// opening an existing checkout.
    #[must_use]
    pub const fn was_cloned(&self) -> bool {
        self.cloned
    }
}

/// Source-control collaborator.
#[cfg_attr(test, mockall::automock)]
pub trait SourceControl {
    /// Opens the checkout at `dir` if it is a valid checkout of `identity`,
    /// otherwise clones it there.
    ///
    /// # Errors
    ///
    /// Returns a [`GitError`] if the existing checkout belongs to another
    /// repository or the clone fails.
    fn clone_or_open(
        &self,
        dir: &Utf8Path,
        identity: &RepositoryIdentity,
        shallow: bool,
    ) -> Result<Checkout, GitError>;

    /// Opens an existing checkout.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::NotACheckout`] if `dir` is not a checkout.
    fn open(&self, dir: &Utf8Path) -> Result<Checkout, GitError>;

    /// Overwrites the URL of the named remote.
    ///
    /// # Errors
    ///
    /// Returns a [`GitError`] if git rejects the update.
    fn set_remote_url(
        &self,
        checkout: &Checkout,
        remote: &str,
        url: &RemoteUrl,
    ) -> Result<(), GitError>;
}

/// [`SourceControl`] backed by the `git` command-line client.
pub struct GitCli<'a> {
    executor: &'a dyn CommandExecutor,
    remote: String,
}

impl<'a> GitCli<'a> {
    /// Creates a client that runs git through `executor` and validates
    /// existing checkouts against `remote`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, remote: &str) -> Self {
        Self {
            executor,
            remote: remote.to_owned(),
        }
    }

    /// Returns `true` if `dir` is the root of a git work tree.
    #[must_use]
    pub fn is_checkout(&self, dir: &Utf8Path) -> bool {
        if !dir.join(".git").exists() {
            return false;
        }
        self.git(dir, "rev-parse", &["rev-parse", "--is-inside-work-tree"])
            .is_ok_and(|stdout| stdout.trim() == "true")
    }

    fn git(&self, dir: &Utf8Path, operation: &'static str, rest: &[&str]) -> Result<String, GitError> {
        let mut argv = args(["-C", dir.as_str()]);
        argv.extend(rest.iter().map(|arg| (*arg).to_owned()));
        self.run(operation, &argv, None)
    }

    fn run(
        &self,
        operation: &'static str,
        argv: &[String],
        url: Option<&RemoteUrl>,
    ) -> Result<String, GitError> {
        let redact = |text: String| match url {
            Some(url) => url.token().redact(&text),
            None => text,
        };

        let output = self
            .executor
            .run("git", argv)
            .map_err(|err| GitError::Command {
                operation,
                message: redact(err.to_string()),
            })?;

        if !output.status.success() {
            return Err(GitError::Command {
                operation,
                message: redact(failure_message(&output)),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn verify_identity(
        &self,
        dir: &Utf8Path,
        identity: &RepositoryIdentity,
    ) -> Result<(), GitError> {
        let found = self.git(dir, "remote get-url", &["remote", "get-url", self.remote.as_str()])?;
        let found = found.trim();
        if points_at(found, &identity.slug()) {
            return Ok(());
        }
        Err(GitError::UnexpectedRepository {
            path: dir.to_owned(),
            found: strip_userinfo(found),
            expected: identity.slug(),
        })
    }
}

impl SourceControl for GitCli<'_> {
    fn clone_or_open(
        &self,
        dir: &Utf8Path,
        identity: &RepositoryIdentity,
        shallow: bool,
    ) -> Result<Checkout, GitError> {
        if self.is_checkout(dir) {
            debug!("Found existing checkout in {dir}");
            self.verify_identity(dir, identity)?;
            return Ok(Checkout::new(dir.to_owned(), false));
        }

        if let Some(parent) = dir.parent().filter(|p| !p.as_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| GitError::Io {
                path: parent.to_owned(),
                source,
            })?;
        }

        let url = identity.clone_url();
        info!("Cloning {url} to {dir}");
        let mut argv = args(["clone"]);
        if shallow {
            argv.extend(args(["--depth", "1"]));
        }
        argv.extend(args(["--origin", self.remote.as_str(), url.as_str(), dir.as_str()]));
        self.run("clone", &argv, None)?;

        Ok(Checkout::new(dir.to_owned(), true))
    }

    fn open(&self, dir: &Utf8Path) -> Result<Checkout, GitError> {
        if self.is_checkout(dir) {
            Ok(Checkout::new(dir.to_owned(), false))
        } else {
            Err(GitError::NotACheckout {
                path: dir.to_owned(),
            })
        }
    }

    fn set_remote_url(
        &self,
        checkout: &Checkout,
        remote: &str,
        url: &RemoteUrl,
    ) -> Result<(), GitError> {
        debug!("Setting {remote} of {} to {url}", checkout.root());
        let exposed = url.expose();
        let argv = args([
            "-C",
            checkout.root().as_str(),
            "remote",
            "set-url",
            remote,
            exposed.as_str(),
        ]);
        self.run("remote set-url", &argv, Some(url)).map(drop)
    }
}

/// Returns `true` if the remote URL refers to the `org/repo` slug.
///
/// Accepts HTTPS (with or without credentials) and SCP-style SSH URLs, with
/// or without a `.git` suffix.
fn points_at(url: &str, slug: &str) -> bool {
    let path = url.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    path.strip_suffix(slug)
        .is_some_and(|prefix| prefix.ends_with('/') || prefix.ends_with(':'))
}

/// Drops any user-info from a URL so it can be reported safely.
fn strip_userinfo(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => match rest.split_once('@') {
            Some((_, host_path)) => format!("{scheme}://{host_path}"),
            None => url.to_owned(),
        },
        None => url.to_owned(),
    }
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
