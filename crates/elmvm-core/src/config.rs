use std::path::PathBuf;
use std::time::Duration;

use elmvm_backend::ElmVersion;

pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";
pub const DEFAULT_PACKAGE: &str = "elm";
pub const DEFAULT_VERSION_FLOOR: &str = "0.15.0";
pub const DEFAULT_MANIFEST_KEY: &str = "elm-version";

/// Registry, filtering and manifest settings for [`crate::VersionCatalog`].
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub registry_url: String,
    pub package: String,
    pub timeout: Duration,
    /// Oldest release elmvm can install; anything below is dropped from pools.
    pub floor: Option<ElmVersion>,
    /// Expanded versions that are published but not installable.
    pub blacklist: Vec<String>,
    /// File names that mark a project root, checked in order.
    pub manifest_names: Vec<String>,
    pub manifest_key: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            package: DEFAULT_PACKAGE.to_string(),
            timeout: Duration::from_secs(5),
            floor: ElmVersion::parse(DEFAULT_VERSION_FLOOR).ok(),
            blacklist: vec!["0.0.0".to_string()],
            manifest_names: vec!["elm.json".to_string(), "elm-package.json".to_string()],
            manifest_key: DEFAULT_MANIFEST_KEY.to_string(),
        }
    }
}

impl CatalogConfig {
    #[must_use]
    pub fn admits(&self, version: &ElmVersion) -> bool {
        if self.floor.as_ref().is_some_and(|floor| version < floor) {
            return false;
        }
        !self.blacklist.iter().any(|b| b == version.expanded())
    }
}

/// Storage and npm settings for [`crate::InstallationManager`].
#[derive(Debug, Clone)]
pub struct InstallConfig {
    pub root: PathBuf,
    pub npm: PathBuf,
    pub package: String,
}

impl InstallConfig {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, npm: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            npm: npm.into(),
            package: DEFAULT_PACKAGE.to_string(),
        }
    }
}
