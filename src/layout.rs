//! Fixed repository identity and staged-archive layout.
//!
//! These values identify the canonical source repository and where its staged
//! sources live in object storage. They are plain values handed to the
//! stager and releaser at construction so tests can substitute them.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// Default GitHub organization of the source repository.
pub const DEFAULT_ORG: &str = "kubernetes";

/// Default GitHub repository name.
pub const DEFAULT_REPO: &str = "kubernetes";

/// Default remote rewritten during release preparation.
pub const DEFAULT_REMOTE: &str = "origin";

/// Environment variable holding the release access token.
pub const TOKEN_ENV_KEY: &str = "GITHUB_TOKEN";

/// Object-storage path segment under which staged builds are published.
pub const STAGE_PATH: &str = "stage";

/// Base name of the staged sources archive.
pub const SOURCES_TAR: &str = "kubernetes-src.tar.gz";

/// Identity of the canonical source repository and how to push to it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryIdentity {
    /// Organization (owner) of the repository.
    pub org: String,
    /// Repository name.
    pub repo: String,
    /// Git hosting service host name.
    pub host: String,
    /// Name of the remote to re-authenticate.
    pub remote: String,
    /// Account name placed in the authenticated remote URL.
    pub account: String,
    /// Environment variable that supplies the access token.
    pub token_env: String,
    /// Location of the checkout inside the extracted source tree, relative
    /// to the extraction root.
    pub source_subpath: String,
}

impl Default for RepositoryIdentity {
    fn default() -> Self {
        Self {
            org: DEFAULT_ORG.to_owned(),
            repo: DEFAULT_REPO.to_owned(),
            host: "github.com".to_owned(),
            remote: DEFAULT_REMOTE.to_owned(),
            account: "git".to_owned(),
            token_env: TOKEN_ENV_KEY.to_owned(),
            source_subpath: "src/k8s.io/kubernetes".to_owned(),
        }
    }
}

impl RepositoryIdentity {
    /// Returns the `org/repo` path of the repository.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.org, self.repo)
    }

    /// Returns the anonymous HTTPS clone URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use release_workspace::layout::RepositoryIdentity;
    ///
    /// let identity = RepositoryIdentity::default();
    /// assert_eq!(identity.clone_url(), "https://github.com/kubernetes/kubernetes");
    /// ```
    #[must_use]
    pub fn clone_url(&self) -> String {
        format!("https://{}/{}", self.host, self.slug())
    }

    /// Returns the trailing path suffix that denotes the checkout location
    /// inside the extracted archive, with a leading `/`.
    #[must_use]
    pub fn source_suffix(&self) -> String {
        format!("/{}", self.source_subpath.trim_matches('/'))
    }
}

/// Object-storage layout of staged builds.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StagedLayout {
    /// Path segment between the bucket and the build version.
    pub stage_path: String,
    /// Base name of the sources archive.
    pub archive_name: String,
}

impl Default for StagedLayout {
    fn default() -> Self {
        Self {
            stage_path: STAGE_PATH.to_owned(),
            archive_name: SOURCES_TAR.to_owned(),
        }
    }
}

impl StagedLayout {
    /// Returns the storage key of the staged sources archive.
    ///
    /// The key depends only on `bucket`, the stage path and `build_version`;
    /// the segments are joined with `/` and otherwise used verbatim.
    ///
    /// # Examples
    ///
    /// ```
    /// use release_workspace::layout::StagedLayout;
    ///
    /// let key = StagedLayout::default().archive_key("gs://bucket", "v1.30.0");
    /// assert_eq!(key, "gs://bucket/stage/v1.30.0/kubernetes-src.tar.gz");
    /// ```
    #[must_use]
    pub fn archive_key(&self, bucket: &str, build_version: &str) -> String {
        format!(
            "{bucket}/{}/{build_version}/{}",
            self.stage_path, self.archive_name
        )
    }
}

/// Maps a workspace directory to the directory the staged archive must be
/// extracted into.
///
/// The archive stores the sources under the checkout's in-tree subpath, so
/// extracting into `directory` minus `suffix` lands them at `directory`.
/// Trailing separators on `directory` are ignored. A directory that does not
/// end with `suffix` is returned unchanged.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use release_workspace::layout::extraction_destination;
///
/// let dest = extraction_destination(
///     Utf8Path::new("/work/src/k8s.io/kubernetes"),
///     "/src/k8s.io/kubernetes",
/// );
/// assert_eq!(dest, Utf8Path::new("/work"));
/// ```
#[must_use]
pub fn extraction_destination(directory: &Utf8Path, suffix: &str) -> Utf8PathBuf {
    let raw = directory.as_str();
    let trimmed = match raw.trim_end_matches('/') {
        "" if raw.starts_with('/') => "/",
        other => other,
    };

    match trimmed.strip_suffix(suffix) {
        Some("") => Utf8PathBuf::from("/"),
        Some(parent) => Utf8PathBuf::from(parent),
        None => Utf8PathBuf::from(trimmed),
    }
}
