mod cache;
mod catalog;
mod config;
mod install;
mod manifest;
mod registry;

pub use cache::JsonFileCache;
pub use catalog::{Resolution, VersionCatalog};
pub use config::{
    CatalogConfig, DEFAULT_MANIFEST_KEY, DEFAULT_PACKAGE, DEFAULT_REGISTRY_URL,
    DEFAULT_VERSION_FLOOR, InstallConfig,
};
pub use install::{BIN_PATH_FILE, DirectoryPresence, InstallOutcome, InstallationManager};
pub use manifest::{find_project_manifest, read_constraint, read_constraint_string};
pub use registry::NpmRegistry;
