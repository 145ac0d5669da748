//! Configuration loader backed by TOML.
//!
//! Every value has a default matching the canonical release repository, so a
//! missing configuration file is not an error. Tables deny unknown keys so
//! typos surface immediately instead of being silently ignored.
//!
//! ```toml
//! command_timeout_secs = 600
//!
//! [repository]
//! org = "kubernetes"
//! repo = "kubernetes"
//!
//! [staging]
//! archive_name = "kubernetes-src.tar.gz"
//!
//! [licenses]
//! cache_dir = "/var/cache/spdx"
//! ```

use crate::exec::DEFAULT_COMMAND_TIMEOUT;
use crate::layout::{RepositoryIdentity, StagedLayout};
use crate::license::LicenseOptions;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::time::Duration;

/// Directory name under the platform configuration directory.
const CONFIG_DIR_NAME: &str = "release-workspace";

/// File name of the configuration file.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors arising from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("reading configuration {path}: {source}")]
    Read {
        /// The configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid.
    #[error("parsing configuration {path}: {source}")]
    Parse {
        /// The configuration file.
        path: Utf8PathBuf,
        /// The TOML error.
        #[source]
        source: toml::de::Error,
    },
}

/// Tool configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Repository whose checkout is prepared.
    pub repository: RepositoryIdentity,
    /// Object-storage layout of staged builds.
    pub staging: StagedLayout,
    /// License cache settings.
    pub licenses: LicenseOptions,
    /// Upper bound, in seconds, on any single external command.
    pub command_timeout_secs: u64,
    /// Parent directory for per-call temporary directories. Defaults to the
    /// system temporary directory.
    pub temp_root: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository: RepositoryIdentity::default(),
            staging: StagedLayout::default(),
            licenses: LicenseOptions::default(),
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT.as_secs(),
            temp_root: None,
        }
    }
}

impl Config {
    /// Loads configuration from `explicit`, or else from the platform
    /// configuration file if one exists, or else returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the chosen file cannot be read or parsed.
    /// An explicit path that does not exist is a read error.
    pub fn load(explicit: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        Self::load_with(explicit, default_config_path())
    }

    /// Loads configuration, falling back to `fallback` when no explicit path
    /// is given.
    ///
    /// Separated from [`Self::load`] so tests can substitute the platform
    /// location.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with(
        explicit: Option<&Utf8Path>,
        fallback: Option<Utf8PathBuf>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match fallback {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Returns the per-command timeout.
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

/// Returns `<config_dir>/release-workspace/config.toml` for the current user.
#[must_use]
pub fn default_config_path() -> Option<Utf8PathBuf> {
    let dirs = directories_next::BaseDirs::new()?;
    let config_dir = Utf8PathBuf::try_from(dirs.config_dir().to_owned()).ok()?;
    Some(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::temp_workspace;
    use rstest::rstest;

    #[rstest]
    fn defaults_match_the_canonical_repository() {
        let config = Config::default();

        assert_eq!(config.repository.slug(), "kubernetes/kubernetes");
        assert_eq!(config.repository.remote, "origin");
        assert_eq!(config.repository.token_env, "GITHUB_TOKEN");
        assert_eq!(config.staging.stage_path, "stage");
        assert_eq!(config.staging.archive_name, "kubernetes-src.tar.gz");
        assert_eq!(config.command_timeout(), DEFAULT_COMMAND_TIMEOUT);
        assert!(config.temp_root.is_none());
    }

    #[rstest]
    fn empty_document_yields_defaults() {
        let config = toml::from_str::<Config>("").expect("empty config should parse");
        assert_eq!(config, Config::default());
    }

    #[rstest]
    fn partial_tables_keep_remaining_defaults() {
        let source = concat!(
            "command_timeout_secs = 60\n",
            "[repository]\n",
            "org = \"example\"\n",
            "[licenses]\n",
            "cache_dir = \"/var/cache/spdx\"\n",
        );

        let config = toml::from_str::<Config>(source).expect("config should parse");

        assert_eq!(config.repository.org, "example");
        assert_eq!(config.repository.repo, "kubernetes");
        assert_eq!(config.command_timeout(), Duration::from_secs(60));
        assert_eq!(
            config.licenses.cache_dir.as_deref(),
            Some(Utf8Path::new("/var/cache/spdx"))
        );
        assert_eq!(config.staging, StagedLayout::default());
    }

    #[rstest]
    #[case::top_level("unknown = 1\n")]
    #[case::nested("[repository]\norganisation = \"typo\"\n")]
    fn unknown_keys_are_rejected(#[case] source: &str) {
        let result = toml::from_str::<Config>(source);
        assert!(result.is_err(), "expected {source:?} to be rejected");
    }

    #[rstest]
    fn explicit_path_must_exist() {
        let temp = temp_workspace();
        let missing = temp.path.join("absent.toml");

        let err = Config::load_with(Some(missing.as_path()), None).expect_err("missing file");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[rstest]
    fn missing_fallback_yields_defaults() {
        let temp = temp_workspace();
        let config = Config::load_with(None, Some(temp.path.join("config.toml")))
            .expect("defaults");
        assert_eq!(config, Config::default());
    }

    #[rstest]
    fn fallback_file_is_used_when_present() {
        let temp = temp_workspace();
        let path = temp.path.join("config.toml");
        std::fs::write(&path, "[staging]\nstage_path = \"staging\"\n").expect("write config");

        let config = Config::load_with(None, Some(path)).expect("load fallback");
        assert_eq!(config.staging.stage_path, "staging");
    }

    #[rstest]
    fn parse_errors_name_the_file() {
        let temp = temp_workspace();
        let path = temp.path.join("broken.toml");
        std::fs::write(&path, "command_timeout_secs = \"soon\"\n").expect("write config");

        let err = Config::load_with(Some(path.as_path()), None).expect_err("invalid value");
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }
}
