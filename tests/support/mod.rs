//! Shared fixtures for workspace lifecycle integration tests.

use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::write::GzEncoder;
use release_workspace::git::{Checkout, GitError, SourceControl};
use release_workspace::license::{HttpClient, HttpError};
use release_workspace::remote::RemoteUrl;
use release_workspace::RepositoryIdentity;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tempfile::TempDir;

/// A temporary directory exposed as a UTF-8 path.
pub struct TempTree {
    _temp: TempDir,
    pub path: Utf8PathBuf,
}

pub fn temp_tree() -> TempTree {
    let temp = TempDir::new().expect("failed to create temp dir");
    let path = Utf8PathBuf::try_from(temp.path().to_owned()).expect("non-UTF8 temp path");
    TempTree { _temp: temp, path }
}

/// Source control that treats a `.git` directory as a checkout and records
/// every remote URL it is asked to set.
#[derive(Default)]
pub struct FakeSourceControl {
    pub clones: RefCell<Vec<Utf8PathBuf>>,
    pub remotes: RefCell<Vec<(String, String)>>,
}

impl SourceControl for FakeSourceControl {
    fn clone_or_open(
        &self,
        dir: &Utf8Path,
        _identity: &RepositoryIdentity,
        _shallow: bool,
    ) -> Result<Checkout, GitError> {
        if dir.join(".git").is_dir() {
            return Ok(Checkout::new(dir.to_owned(), false));
        }
        std::fs::create_dir_all(dir.join(".git")).map_err(|source| GitError::Io {
            path: dir.to_owned(),
            source,
        })?;
        self.clones.borrow_mut().push(dir.to_owned());
        Ok(Checkout::new(dir.to_owned(), true))
    }

    fn open(&self, dir: &Utf8Path) -> Result<Checkout, GitError> {
        if dir.join(".git").is_dir() {
            Ok(Checkout::new(dir.to_owned(), false))
        } else {
            Err(GitError::NotACheckout {
                path: dir.to_owned(),
            })
        }
    }

    fn set_remote_url(
        &self,
        _checkout: &Checkout,
        remote: &str,
        url: &RemoteUrl,
    ) -> Result<(), GitError> {
        self.remotes
            .borrow_mut()
            .push((remote.to_owned(), url.expose()));
        Ok(())
    }
}

/// HTTP client serving a tiny SPDX license list.
#[derive(Clone)]
pub struct SpdxFixture {
    documents: Rc<HashMap<String, String>>,
    pub requests: Rc<RefCell<usize>>,
}

pub const LIST_URL: &str = "https://spdx.test/licenses/licenses.json";

impl SpdxFixture {
    pub fn new() -> Self {
        let list = serde_json::json!({
            "licenseListVersion": "3.24",
            "licenses": [
                { "licenseId": "Apache-2.0", "name": "Apache License 2.0" },
                { "licenseId": "MIT", "name": "MIT License" }
            ]
        });
        let details = |id: &str| {
            serde_json::json!({
                "licenseId": id,
                "name": id,
                "licenseText": format!("{id} text")
            })
            .to_string()
        };
        let documents = HashMap::from([
            (LIST_URL.to_owned(), list.to_string()),
            (
                "https://spdx.test/licenses/Apache-2.0.json".to_owned(),
                details("Apache-2.0"),
            ),
            (
                "https://spdx.test/licenses/MIT.json".to_owned(),
                details("MIT"),
            ),
        ]);
        Self {
            documents: Rc::new(documents),
            requests: Rc::default(),
        }
    }
}

impl HttpClient for SpdxFixture {
    fn get_text(&self, url: &str) -> Result<String, HttpError> {
        *self.requests.borrow_mut() += 1;
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| HttpError::NotFound {
                url: url.to_owned(),
            })
    }
}

/// Writes a staged sources archive to
/// `{bucket}/stage/{version}/kubernetes-src.tar.gz`.
pub fn publish_staged_sources(bucket: &Utf8Path, version: &str, entries: &[(&str, &str)]) {
    let dir = bucket.join("stage").join(version);
    std::fs::create_dir_all(&dir).expect("create stage dir");
    let file = std::fs::File::create(dir.join("kubernetes-src.tar.gz")).expect("create archive");
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::fast()));
    for (name, contents) in entries {
        // Names are written raw so hostile entries such as `../x` can be built.
        let mut header = tar::Header::new_old();
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder
            .append(&header, contents.as_bytes())
            .expect("append entry");
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip");
}
