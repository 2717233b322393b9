use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

/// Default HTTP timeout for metadata lookups, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Project configuration loaded from `.coderef.toml`.
pub struct Config {
    /// Directory local locators are resolved against.
    pub root: PathBuf,
    /// Directory remote references record as their store location.
    pub store_dir: PathBuf,
    /// Per-request timeout for metadata lookups.
    pub timeout: Duration,
    /// `User-Agent` sent with metadata lookups.
    pub user_agent: String,
}

/// Raw TOML structure for `.coderef.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct CoderefTomlConfig {
    root: Option<PathBuf>,
    store_dir: Option<PathBuf>,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

impl Config {
    /// Load config from `.coderef.toml` in the given directory.
    /// Returns defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; a config the user
    /// wrote is never silently replaced by defaults.
    ///
    /// Relative `root` and `store_dir` values are taken relative to `dir`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(dir: &Path) -> Result<Self, Error> {
        let path = dir.join(".coderef.toml");
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::defaults_for(dir)),
            Err(e) => return Err(Error::Io(e)),
        };

        let raw: CoderefTomlConfig = toml::from_str(&content)?;
        let defaults = Self::defaults_for(dir);
        tracing::debug!(path = %path.display(), "loaded config");

        return Ok(Self {
            root: raw.root.map_or(defaults.root, |root| return dir.join(root)),
            store_dir: raw.store_dir.map_or(defaults.store_dir, |store| return dir.join(store)),
            timeout: raw.timeout_secs.map_or(defaults.timeout, Duration::from_secs),
            user_agent: raw.user_agent.unwrap_or(defaults.user_agent),
        });
    }

    /// Config used when no `.coderef.toml` exists.
    fn defaults_for(dir: &Path) -> Self {
        return Self {
            root: dir.to_path_buf(),
            store_dir: dir.join(".coderef").join("store"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("coderef/{}", env!("CARGO_PKG_VERSION")),
        };
    }
}
