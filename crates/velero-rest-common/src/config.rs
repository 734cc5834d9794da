//! Client configuration
//!
//! The Velero CLI keeps its settings in `~/.config/velero/config.json`. We read
//! the same file so the facade targets whatever namespace the CLI targets.
//!
//! Namespace resolution (highest priority first):
//! 1. Explicit `--namespace` flag / `VELERO_NAMESPACE` environment variable
//! 2. `namespace` key of the Velero client config
//! 3. `velero`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result, DEFAULT_VELERO_NAMESPACE};

const VELERO_CONFIG_DIR: &str = ".config/velero";
const VELERO_CONFIG_FILE: &str = "config.json";

/// Settings shared with the Velero CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VeleroConfig {
    /// Namespace Velero runs in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Comma-separated feature flags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<String>,
    /// CA bundle used when downloading backup contents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cacert: Option<String>,
    /// CLI output colouring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colorized: Option<bool>,
}

impl VeleroConfig {
    /// Feature flags as a list, empty entries dropped
    pub fn features(&self) -> Vec<String> {
        self.features
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Default location of the Velero client config.
pub fn default_velero_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(VELERO_CONFIG_DIR).join(VELERO_CONFIG_FILE))
}

/// Read the Velero client config at `path`.
///
/// A missing file is not an error and yields the default config.
pub fn read_velero_config(path: &Path) -> Result<VeleroConfig> {
    if !path.exists() {
        return Ok(VeleroConfig::default());
    }
    let data = std::fs::read_to_string(path).map_err(|e| Error::ConfigLoad {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    if data.trim().is_empty() {
        return Ok(VeleroConfig::default());
    }
    serde_json::from_str(&data).map_err(|e| Error::ConfigLoad {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Load the Velero client config, falling back to defaults on any failure.
///
/// Failures are logged as warnings; startup continues either way.
pub fn load_velero_config(path: Option<&Path>) -> VeleroConfig {
    let path = match path.map(Path::to_path_buf).or_else(default_velero_config_path) {
        Some(path) => path,
        None => return VeleroConfig::default(),
    };

    match read_velero_config(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Error reading config file, using defaults");
            VeleroConfig::default()
        }
    }
}

/// Resolve the namespace Velero resources live in.
pub fn resolve_namespace(explicit: Option<&str>, config: &VeleroConfig) -> String {
    explicit
        .filter(|ns| !ns.is_empty())
        .or_else(|| config.namespace.as_deref().filter(|ns| !ns.is_empty()))
        .unwrap_or(DEFAULT_VELERO_NAMESPACE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = read_velero_config(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, VeleroConfig::default());
    }

    #[test]
    fn reads_cli_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"namespace":"backup-system","features":"EnableCSI, ","colorized":false}"#,
        )
        .unwrap();

        let config = read_velero_config(&path).unwrap();
        assert_eq!(config.namespace.as_deref(), Some("backup-system"));
        assert_eq!(config.features(), vec!["EnableCSI".to_string()]);
        assert_eq!(config.colorized, Some(false));
    }

    #[test]
    fn invalid_file_is_config_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "namespace: velero").unwrap();

        let err = read_velero_config(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigLoad { .. }));
    }

    #[test]
    fn load_falls_back_to_defaults_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        assert_eq!(load_velero_config(Some(&path)), VeleroConfig::default());
    }

    #[test]
    fn default_path_is_under_home() {
        let expected = dirs::home_dir().map(|home| home.join(".config/velero/config.json"));
        assert_eq!(default_velero_config_path(), expected);
    }

    #[test]
    fn namespace_precedence() {
        let config = VeleroConfig {
            namespace: Some("from-file".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_namespace(Some("from-flag"), &config), "from-flag");
        assert_eq!(resolve_namespace(None, &config), "from-file");
        assert_eq!(resolve_namespace(Some(""), &config), "from-file");
        assert_eq!(
            resolve_namespace(None, &VeleroConfig::default()),
            DEFAULT_VELERO_NAMESPACE
        );
    }
}
