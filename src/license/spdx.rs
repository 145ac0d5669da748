//! SPDX license list downloader with an on-disk response cache.

use super::{
    DownloaderOptions, HttpClient, License, LicenseDownloader, LicenseDownloaderFactory,
    LicenseError, LicenseSet,
};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::Write as _;

/// Scratch file written once to check that the cache is writable.
const WRITE_CHECK: &str = ".release-workspace-write-check";

/// Top-level SPDX license list document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LicenseList {
    license_list_version: String,
    licenses: Vec<ListEntry>,
}

/// One license as listed in the SPDX license list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEntry {
    license_id: String,
    #[serde(default)]
    details_url: String,
}

/// Downloads the SPDX license list and every license's details document,
/// caching each response body under the cache directory.
#[derive(Debug)]
pub struct SpdxDownloader<C> {
    options: DownloaderOptions,
    client: C,
}

impl<C: HttpClient> SpdxDownloader<C> {
    /// Creates a downloader, preparing the cache directory.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::CacheNotWritable`] if the cache directory
    /// cannot be created or written to.
    pub fn new(options: DownloaderOptions, client: C) -> Result<Self, LicenseError> {
        prepare_cache_dir(&options.cache_dir)?;
        Ok(Self { options, client })
    }

    /// Returns the cache directory in use.
    #[must_use]
    pub fn cache_dir(&self) -> &Utf8Path {
        &self.options.cache_dir
    }

    /// Returns the cache file that stores the response for `url`.
    #[must_use]
    pub fn cache_path(&self, url: &str) -> Utf8PathBuf {
        let name = format!("{:x}.json", Sha256::digest(url.as_bytes()));
        self.options.cache_dir.join(name)
    }

    /// Fetches and parses the JSON document at `url`, preferring the cache.
    fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, LicenseError> {
        let path = self.cache_path(url);
        let body = if path.exists() {
            debug!("Using cached {url}");
            std::fs::read_to_string(&path).map_err(|source| LicenseError::CacheIo {
                path: path.clone(),
                source,
            })?
        } else {
            let body = self.client.get_text(url)?;
            self.store(&path, &body)?;
            body
        };

        serde_json::from_str(&body).map_err(|source| LicenseError::Parse {
            url: url.to_owned(),
            source,
        })
    }

    /// Atomically writes a cache entry.
    fn store(&self, path: &Utf8Path, body: &str) -> Result<(), LicenseError> {
        let cache_io = |source| LicenseError::CacheIo {
            path: path.to_owned(),
            source,
        };
        let mut file = tempfile::NamedTempFile::new_in(&self.options.cache_dir).map_err(cache_io)?;
        file.write_all(body.as_bytes()).map_err(cache_io)?;
        file.persist(path).map_err(|err| cache_io(err.error))?;
        Ok(())
    }

    /// Resolves the details URL of a list entry.
    fn details_url(&self, entry: &ListEntry) -> String {
        if !entry.details_url.is_empty() {
            return entry.details_url.clone();
        }
        let base = self
            .options
            .list_url
            .rsplit_once('/')
            .map_or(self.options.list_url.as_str(), |(base, _)| base);
        format!("{base}/{}.json", entry.license_id)
    }
}

impl<C: HttpClient> LicenseDownloader for SpdxDownloader<C> {
    fn fetch_all(&self) -> Result<LicenseSet, LicenseError> {
        let list: LicenseList = self.fetch_json(&self.options.list_url)?;
        info!(
            "Fetching {} licenses from SPDX license list {}",
            list.licenses.len(),
            list.license_list_version
        );

        let mut licenses = BTreeMap::new();
        for entry in &list.licenses {
            let license: License = self.fetch_json(&self.details_url(entry))?;
            licenses.insert(entry.license_id.clone(), license);
        }

        Ok(LicenseSet {
            list_version: list.license_list_version,
            licenses,
        })
    }
}

/// Builds [`SpdxDownloader`]s sharing one HTTP client.
#[derive(Debug, Clone, Default)]
pub struct SpdxDownloaderFactory<C> {
    client: C,
}

impl<C> SpdxDownloaderFactory<C> {
    /// Creates a factory handing `client` to every downloader.
    #[must_use]
    pub const fn new(client: C) -> Self {
        Self { client }
    }
}

impl<C: HttpClient + Clone + 'static> LicenseDownloaderFactory for SpdxDownloaderFactory<C> {
    fn new_downloader(
        &self,
        options: &DownloaderOptions,
    ) -> Result<Box<dyn LicenseDownloader>, LicenseError> {
        let downloader = SpdxDownloader::new(options.clone(), self.client.clone())?;
        Ok(Box::new(downloader))
    }
}

/// Creates the cache directory and checks that files can be written to it.
fn prepare_cache_dir(dir: &Utf8Path) -> Result<(), LicenseError> {
    let not_writable = |source| LicenseError::CacheNotWritable {
        path: dir.to_owned(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(not_writable)?;
    let check = dir.join(WRITE_CHECK);
    std::fs::write(&check, b"").map_err(not_writable)?;
    // A leftover check file is harmless.
    let _ = std::fs::remove_file(&check);
    Ok(())
}

#[cfg(test)]
#[path = "spdx_tests.rs"]
mod tests;
