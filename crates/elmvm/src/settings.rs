use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use elmvm_backend::ElmVersion;
use elmvm_core::{
    CatalogConfig, DEFAULT_MANIFEST_KEY, DEFAULT_PACKAGE, DEFAULT_REGISTRY_URL,
    DEFAULT_VERSION_FLOOR, InstallConfig,
};
use elmvm_platform::AppPaths;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_registry_url")]
    pub registry_url: String,

    #[serde(default = "default_package_name")]
    pub package_name: String,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Empty disables the floor.
    #[serde(default = "default_version_floor")]
    pub version_floor: String,

    #[serde(default = "default_blacklist")]
    pub blacklist: Vec<String>,

    #[serde(default)]
    pub storage_root: Option<PathBuf>,

    #[serde(default = "default_manifest_names")]
    pub manifest_names: Vec<String>,

    #[serde(default = "default_manifest_key")]
    pub manifest_key: String,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_package_name() -> String {
    DEFAULT_PACKAGE.to_string()
}

fn default_http_timeout() -> u64 {
    5
}

fn default_version_floor() -> String {
    DEFAULT_VERSION_FLOOR.to_string()
}

fn default_blacklist() -> Vec<String> {
    vec!["0.0.0".to_string()]
}

fn default_manifest_names() -> Vec<String> {
    vec!["elm.json".to_string(), "elm-package.json".to_string()]
}

fn default_manifest_key() -> String {
    DEFAULT_MANIFEST_KEY.to_string()
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_url: default_registry_url(),
            package_name: default_package_name(),
            http_timeout_secs: default_http_timeout(),
            version_floor: default_version_floor(),
            blacklist: default_blacklist(),
            storage_root: None,
            manifest_names: default_manifest_names(),
            manifest_key: default_manifest_key(),
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
        }
    }
}

impl Settings {
    /// Read `settings.json`, falling back to defaults when it is missing or
    /// invalid.
    pub fn load(paths: &AppPaths) -> Self {
        Self::load_from(&paths.settings_file())
    }

    fn load_from(settings_path: &Path) -> Self {
        if !settings_path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(settings_path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Apply `storage_root` unless the environment already chose the data
    /// directory.
    #[must_use]
    pub fn apply_storage_root(&self, paths: AppPaths, env_override: bool) -> AppPaths {
        match &self.storage_root {
            Some(root) if !env_override => paths.with_data_dir(root),
            _ => paths,
        }
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        let floor = match self.version_floor.trim() {
            "" => None,
            raw => match ElmVersion::parse(raw) {
                Ok(floor) => Some(floor),
                Err(e) => {
                    log::warn!("Ignoring invalid version_floor {raw:?}: {e}");
                    None
                }
            },
        };

        CatalogConfig {
            registry_url: self.registry_url.clone(),
            package: self.package_name.clone(),
            timeout: Duration::from_secs(self.http_timeout_secs),
            floor,
            blacklist: self.blacklist.clone(),
            manifest_names: self.manifest_names.clone(),
            manifest_key: self.manifest_key.clone(),
        }
    }

    pub fn install_config(&self, root: &Path, npm: &Path) -> InstallConfig {
        InstallConfig {
            package: self.package_name.clone(),
            ..InstallConfig::new(root, npm)
        }
    }
}
