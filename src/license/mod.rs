//! SPDX license metadata and its on-disk cache.
//!
//! The stage phase prewarms the cache with the full license set so that
//! later attribution work never has to reach the network. The downloader is
//! built from [`DownloaderOptions`] derived from the configured
//! [`LicenseOptions`].

mod http;
mod spdx;

pub use self::http::{HttpClient, HttpError, UreqClient};
#[cfg(test)]
pub use self::http::MockHttpClient;
pub use self::spdx::{SpdxDownloader, SpdxDownloaderFactory};

use camino::Utf8PathBuf;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Default location of the SPDX license list.
pub const SPDX_LICENSE_LIST_URL: &str = "https://spdx.org/licenses/licenses.json";

/// Cache directory used when none is configured, relative to the system
/// temporary directory.
const DEFAULT_CACHE_SUBDIR: &str = "spdx/downloadCache";

/// Configured options of the license subsystem.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LicenseOptions {
    /// Directory holding cached license data. Defaults to
    /// `<temp>/spdx/downloadCache`.
    pub cache_dir: Option<Utf8PathBuf>,
    /// URL of the SPDX license list. Defaults to [`SPDX_LICENSE_LIST_URL`].
    pub list_url: Option<String>,
}

impl LicenseOptions {
    /// Returns the effective license cache directory.
    #[must_use]
    pub fn cache_dir(&self) -> Utf8PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            let temp = std::env::temp_dir();
            Utf8PathBuf::try_from(temp)
                .unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
                .join(DEFAULT_CACHE_SUBDIR)
        })
    }

    /// Returns the effective license list URL.
    #[must_use]
    pub fn list_url(&self) -> &str {
        self.list_url.as_deref().unwrap_or(SPDX_LICENSE_LIST_URL)
    }

    /// Derives the options a downloader is constructed with.
    #[must_use]
    pub fn downloader_options(&self) -> DownloaderOptions {
        DownloaderOptions {
            cache_dir: self.cache_dir(),
            list_url: self.list_url().to_owned(),
        }
    }
}

/// Options a [`LicenseDownloader`] is constructed with.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DownloaderOptions {
    /// Directory the downloader caches responses in.
    pub cache_dir: Utf8PathBuf,
    /// URL of the license list.
    pub list_url: String,
}

/// A single SPDX license.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct License {
    /// SPDX identifier, e.g. `Apache-2.0`.
    pub license_id: String,
    /// Human-readable name.
    pub name: String,
    /// Full license text, when the details document was fetched.
    #[serde(default)]
    pub license_text: String,
    /// Whether the identifier is deprecated.
    #[serde(default)]
    pub is_deprecated_license_id: bool,
    /// Whether the license is OSI approved.
    #[serde(default)]
    pub is_osi_approved: bool,
}

/// The full license set returned by [`LicenseDownloader::fetch_all`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LicenseSet {
    /// Version of the SPDX license list.
    pub list_version: String,
    /// Licenses keyed by SPDX identifier.
    pub licenses: BTreeMap<String, License>,
}

impl LicenseSet {
    /// Number of licenses in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    /// Returns `true` if the set holds no licenses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }

    /// Looks up a license by SPDX identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&License> {
        self.licenses.get(id)
    }
}

/// Errors arising from license download and caching.
#[derive(Debug, thiserror::Error)]
pub enum LicenseError {
    /// The cache directory could not be created or written.
    #[error("license cache directory {path} is not writable: {source}")]
    CacheNotWritable {
        /// The cache directory.
        path: Utf8PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Downloading a document failed.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// A downloaded or cached document could not be parsed.
    #[error("invalid license data from {url}: {source}")]
    Parse {
        /// Where the document came from.
        url: String,
        /// The JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing a cache entry failed.
    #[error("license cache I/O error at {path}: {source}")]
    CacheIo {
        /// The cache entry path.
        path: Utf8PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Fetches the complete license set.
#[cfg_attr(test, mockall::automock)]
pub trait LicenseDownloader {
    /// Fetches every known license, populating the cache as a side effect.
    ///
    /// # Errors
    ///
    /// Returns a [`LicenseError`] if any document cannot be fetched, parsed or
    /// cached.
    fn fetch_all(&self) -> Result<LicenseSet, LicenseError>;
}

/// Constructs [`LicenseDownloader`]s from options.
#[cfg_attr(test, mockall::automock)]
pub trait LicenseDownloaderFactory {
    /// Builds a downloader that caches into `options.cache_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::CacheNotWritable`] if the cache directory
    /// cannot be prepared.
    fn new_downloader(
        &self,
        options: &DownloaderOptions,
    ) -> Result<Box<dyn LicenseDownloader>, LicenseError>;
}
