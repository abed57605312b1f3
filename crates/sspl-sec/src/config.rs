//! Configuration for the security method loader.
//!
//! # Resolution Algorithm
//!
//! 1. `SSPL_SEC_CONFIG` environment variable (path to a config file)
//! 2. `sspl_sec.toml` in the current directory
//! 3. `sspl/sspl_sec.toml` under the XDG config directory
//!
//! A missing file is not an error: callers fall back to
//! [`SecConfig::default`]. `SSPL_SEC_BACKEND_DIR` overrides `backend_dir`
//! from whichever file was found.
//!
//! # Example
//!
//! ```toml
//! default_method = "pki"
//! backend_dir = "/opt/seagate/sspl/lib"
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::registry::MethodId;

/// File name searched for in each candidate directory.
pub const CONFIG_FILE_NAME: &str = "sspl_sec.toml";

/// Directory under the XDG config home holding [`CONFIG_FILE_NAME`].
pub const CONFIG_DIR_NAME: &str = "sspl";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SSPL_SEC_CONFIG";

/// Environment variable overriding [`SecConfig::backend_dir`].
pub const BACKEND_DIR_ENV: &str = "SSPL_SEC_BACKEND_DIR";

/// Errors that can occur while resolving or loading configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// I/O error when reading a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error when a config file is malformed.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
}

/// Loader configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecConfig {
    /// Method to switch to once the default backend is loaded.
    pub default_method: MethodId,

    /// Directory holding the backend libraries. When unset, the platform
    /// library search path is used.
    pub backend_dir: Option<PathBuf>,
}

impl SecConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML, unknown keys, or an
    /// unknown method name.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file does not exist, or an
    /// I/O or parse error if it cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), method = %config.default_method, "Loaded security config");
        Ok(config)
    }

    /// Finds and loads configuration using the resolution algorithm.
    ///
    /// # Errors
    ///
    /// Returns an error if `SSPL_SEC_CONFIG` names a missing file, or if a
    /// found file cannot be read or parsed.
    pub fn resolve() -> Result<Option<Self>, ConfigError> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let current = std::env::current_dir()?;
        let config_home = dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME));
        Self::resolve_from(env_path.as_deref(), &current, config_home.as_deref())
    }

    /// Resolved configuration with environment overrides applied, or the
    /// defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Same as [`SecConfig::resolve`].
    pub fn from_environment() -> Result<Self, ConfigError> {
        let mut config = Self::resolve()?.unwrap_or_default();
        config.apply_backend_dir_override(std::env::var_os(BACKEND_DIR_ENV).map(PathBuf::from));
        Ok(config)
    }

    fn resolve_from(
        env_path: Option<&Path>,
        current_dir: &Path,
        config_home: Option<&Path>,
    ) -> Result<Option<Self>, ConfigError> {
        if let Some(path) = env_path {
            return Self::load(path).map(Some);
        }

        let candidates = std::iter::once(current_dir).chain(config_home);
        for dir in candidates {
            let path = dir.join(CONFIG_FILE_NAME);
            if path.is_file() {
                return Self::load(&path).map(Some);
            }
        }

        Ok(None)
    }

    fn apply_backend_dir_override(&mut self, dir: Option<PathBuf>) {
        if let Some(dir) = dir.filter(|d| !d.as_os_str().is_empty()) {
            self.backend_dir = Some(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, content).expect("write config");
        path
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = SecConfig::from_toml_str("").expect("parse");

        assert_eq!(config, SecConfig::default());
        assert_eq!(config.default_method, MethodId::None);
        assert!(config.backend_dir.is_none());
    }

    #[test]
    fn test_parses_method_and_backend_dir() {
        let config = SecConfig::from_toml_str(
            r#"
            default_method = "pki"
            backend_dir = "/opt/seagate/sspl/lib"
            "#,
        )
        .expect("parse");

        assert_eq!(config.default_method, MethodId::Pki);
        assert_eq!(
            config.backend_dir.as_deref(),
            Some(Path::new("/opt/seagate/sspl/lib"))
        );
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let result = SecConfig::from_toml_str(r#"default_method = "kerberos""#);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = SecConfig::from_toml_str(r#"methd = "pki""#);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_returns_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.toml");

        let result = SecConfig::load(&path);

        assert!(matches!(result, Err(ConfigError::NotFound(p)) if p == path));
    }

    #[test]
    fn test_resolve_prefers_explicit_path() {
        let explicit = tempfile::tempdir().expect("tempdir");
        let current = tempfile::tempdir().expect("tempdir");
        let explicit_path = write_config(&explicit, r#"default_method = "pki""#);
        write_config(&current, r#"default_method = "none""#);

        let config = SecConfig::resolve_from(Some(&explicit_path), current.path(), None)
            .expect("resolve")
            .expect("config found");

        assert_eq!(config.default_method, MethodId::Pki);
    }

    #[test]
    fn test_resolve_explicit_missing_path_is_an_error() {
        let current = tempfile::tempdir().expect("tempdir");
        let missing = current.path().join("nope.toml");

        let result = SecConfig::resolve_from(Some(&missing), current.path(), None);

        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_resolve_current_dir_before_config_home() {
        let current = tempfile::tempdir().expect("tempdir");
        let home = tempfile::tempdir().expect("tempdir");
        write_config(&current, r#"default_method = "pki""#);
        write_config(&home, r#"default_method = "none""#);

        let config = SecConfig::resolve_from(None, current.path(), Some(home.path()))
            .expect("resolve")
            .expect("config found");

        assert_eq!(config.default_method, MethodId::Pki);
    }

    #[test]
    fn test_resolve_falls_back_to_config_home() {
        let current = tempfile::tempdir().expect("tempdir");
        let home = tempfile::tempdir().expect("tempdir");
        write_config(&home, r#"backend_dir = "/usr/lib/sspl""#);

        let config = SecConfig::resolve_from(None, current.path(), Some(home.path()))
            .expect("resolve")
            .expect("config found");

        assert_eq!(config.backend_dir.as_deref(), Some(Path::new("/usr/lib/sspl")));
    }

    #[test]
    fn test_resolve_without_any_file_returns_none() {
        let current = tempfile::tempdir().expect("tempdir");

        let result = SecConfig::resolve_from(None, current.path(), None).expect("resolve");

        assert!(result.is_none());
    }

    #[test]
    fn test_backend_dir_override_replaces_configured_dir() {
        let mut config = SecConfig {
            default_method: MethodId::Pki,
            backend_dir: Some(PathBuf::from("/etc/ignored")),
        };

        config.apply_backend_dir_override(Some(PathBuf::from("/tmp/backends")));
        assert_eq!(config.backend_dir.as_deref(), Some(Path::new("/tmp/backends")));

        config.apply_backend_dir_override(Some(PathBuf::new()));
        config.apply_backend_dir_override(None);
        assert_eq!(config.backend_dir.as_deref(), Some(Path::new("/tmp/backends")));
    }
}
