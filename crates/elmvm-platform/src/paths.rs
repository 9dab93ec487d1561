use std::path::{Path, PathBuf};
use thiserror::Error;

pub const HOME_ENV: &str = "ELMVM_HOME";
pub const CONFIG_DIR_ENV: &str = "ELMVM_CONFIG_DIR";

const APP_DIR: &str = "elmvm";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppPathsError {
    #[error("Could not determine home directory")]
    HomeDirUnavailable,
    #[error("Could not determine config directory")]
    ConfigDirUnavailable,
    #[error("Could not determine data directory")]
    DataDirUnavailable,
}

/// Where elmvm keeps its files.
///
/// `data_dir` is the storage root: one directory per installed version, the
/// version cache and the debug log all live directly under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Build application paths for the current platform, honoring the
    /// `ELMVM_HOME` and `ELMVM_CONFIG_DIR` overrides.
    ///
    /// # Errors
    /// Returns an error when a required base directory (for example the user
    /// home/config/data directory) cannot be determined and no override is set.
    pub fn new() -> Result<Self, AppPathsError> {
        let mut paths = Self::platform_defaults()?;
        if let Some(home) = env_path(HOME_ENV) {
            paths.data_dir = home;
        }
        if let Some(config) = env_path(CONFIG_DIR_ENV) {
            paths.config_dir = config;
        }
        Ok(paths)
    }

    /// Paths rooted at a single directory, used for `storage_root` overrides
    /// and tests.
    #[must_use]
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_dir: root.join("config"),
            data_dir: root,
        }
    }

    fn platform_defaults() -> Result<Self, AppPathsError> {
        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().ok_or(AppPathsError::HomeDirUnavailable)?;
            Ok(Self {
                config_dir: home.join("Library/Application Support").join(APP_DIR),
                data_dir: home.join("Library/Application Support").join(APP_DIR),
            })
        }

        #[cfg(not(target_os = "macos"))]
        {
            Ok(Self {
                config_dir: dirs::config_dir()
                    .ok_or(AppPathsError::ConfigDirUnavailable)?
                    .join(APP_DIR),
                data_dir: dirs::data_dir()
                    .ok_or(AppPathsError::DataDirUnavailable)?
                    .join(APP_DIR),
            })
        }
    }

    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    #[must_use]
    pub fn version_cache_file(&self) -> PathBuf {
        self.data_dir.join("versions.json")
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("debug.log")
    }

    #[must_use]
    pub fn storage_root(&self) -> &Path {
        &self.data_dir
    }

    /// Ensure all application directories exist on disk.
    ///
    /// # Errors
    /// Returns an error if any directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
