use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};

use elmvm_backend::{
    CommandSpec, ElmVersion, ElmvmError, InstallStep, IsInstalled, ProcessRunner,
};

use crate::config::InstallConfig;

pub const BIN_PATH_FILE: &str = "binpath";

/// A version directory counts as installed as soon as it exists. Contents are
/// not validated, so a half-written directory from a killed process is
/// reported as installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryPresence;

impl IsInstalled for DirectoryPresence {
    fn is_installed(&self, version_dir: &Path) -> bool {
        version_dir.is_dir()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    AlreadyInstalled(ElmVersion),
    Installed(ElmVersion),
}

impl InstallOutcome {
    #[must_use]
    pub fn version(&self) -> &ElmVersion {
        match self {
            Self::AlreadyInstalled(v) | Self::Installed(v) => v,
        }
    }

    #[must_use]
    pub fn was_installed_now(&self) -> bool {
        matches!(self, Self::Installed(_))
    }
}

/// Installs Elm releases through npm into `<root>/<expanded version>`.
#[derive(Clone)]
pub struct InstallationManager {
    config: InstallConfig,
    runner: Arc<dyn ProcessRunner>,
    installed: Arc<dyn IsInstalled>,
}

impl InstallationManager {
    #[must_use]
    pub fn new(config: InstallConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            config,
            runner,
            installed: Arc::new(DirectoryPresence),
        }
    }

    #[must_use]
    pub fn with_installed_check(mut self, installed: Arc<dyn IsInstalled>) -> Self {
        self.installed = installed;
        self
    }

    #[must_use]
    pub fn version_dir(&self, version: &ElmVersion) -> PathBuf {
        self.config.root.join(version.expanded())
    }

    #[must_use]
    pub fn is_installed(&self, version: &ElmVersion) -> bool {
        self.installed.is_installed(&self.version_dir(version))
    }

    /// Install `version` unless it is already present.
    ///
    /// # Errors
    /// Returns the [`ElmvmError::InstallFailed`] of the first failing step
    /// after removing any directory this call created.
    pub async fn ensure_installed(
        &self,
        version: &ElmVersion,
    ) -> Result<InstallOutcome, ElmvmError> {
        if self.is_installed(version) {
            debug!("Elm {version} already installed");
            return Ok(InstallOutcome::AlreadyInstalled(version.clone()));
        }

        let dir = self.version_dir(version);
        info!("Installing Elm {version} into {}", dir.display());

        let created = !dir.exists();
        tokio::fs::create_dir_all(&dir).await?;

        match self.run_install_steps(version, &dir).await {
            Ok(()) => {
                info!("Installed Elm {version}");
                Ok(InstallOutcome::Installed(version.clone()))
            }
            Err(e) => {
                error!("Installing Elm {version} failed: {e}");
                if created {
                    self.roll_back(&dir).await;
                }
                Err(e)
            }
        }
    }

    async fn run_install_steps(&self, version: &ElmVersion, dir: &Path) -> Result<(), ElmvmError> {
        let expanded = version.expanded();

        self.npm_step(InstallStep::NpmInit, expanded, dir, &["init", "-y"])
            .await?;

        let package = format!("{}@{expanded}", self.config.package);
        self.npm_step(
            InstallStep::ElmInstall,
            expanded,
            dir,
            &["install", "--save-exact", &package],
        )
        .await?;

        let root = self
            .npm_step(InstallStep::NpmBin, expanded, dir, &["root"])
            .await?;
        let root = root.trim();
        if root.is_empty() {
            return Err(ElmvmError::install_failed(
                InstallStep::NpmBin,
                expanded,
                "npm root printed nothing",
            ));
        }
        let bin_dir = Path::new(root).join(".bin");
        debug!("Elm {version} binaries live in {}", bin_dir.display());

        tokio::fs::write(
            dir.join(BIN_PATH_FILE),
            bin_dir.to_string_lossy().as_bytes(),
        )
        .await
        .map_err(|e| ElmvmError::install_failed(InstallStep::BinPathWrite, expanded, e.to_string()))
    }

    async fn npm_step(
        &self,
        step: InstallStep,
        version: &str,
        dir: &Path,
        args: &[&str],
    ) -> Result<String, ElmvmError> {
        let command = CommandSpec::new(&self.config.npm)
            .args(args.iter().copied())
            .current_dir(dir);

        let output = self
            .runner
            .output(&command)
            .await
            .map_err(|e| ElmvmError::install_failed(step, version, e.to_string()))?;

        if output.success() {
            Ok(output.stdout)
        } else {
            Err(ElmvmError::install_failed(
                step,
                version,
                output.failure_summary(),
            ))
        }
    }

    async fn roll_back(&self, dir: &Path) {
        debug!("Rolling back {}", dir.display());
        if let Err(e) = tokio::fs::remove_dir_all(dir).await {
            warn!("Could not remove partial install {}: {e}", dir.display());
        }
    }

    /// Delete an installed version.
    ///
    /// Returns `false` when the version was not installed.
    ///
    /// # Errors
    /// Returns an error if the directory exists but cannot be removed.
    pub async fn remove(&self, version: &ElmVersion) -> Result<bool, ElmvmError> {
        if !self.is_installed(version) {
            return Ok(false);
        }

        let dir = self.version_dir(version);
        info!("Removing Elm {version} from {}", dir.display());
        tokio::fs::remove_dir_all(&dir).await?;
        Ok(true)
    }

    /// Installed versions, newest first. A missing root means none.
    ///
    /// # Errors
    /// Returns an error if the root exists but cannot be listed.
    pub async fn list_installed(&self) -> Result<Vec<ElmVersion>, ElmvmError> {
        let mut entries = match tokio::fs::read_dir(&self.config.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut versions = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            // Only directories named by an expanded version are installs.
            if let Ok(version) = ElmVersion::parse(name)
                && version.expanded() == name
            {
                versions.push(version);
            }
        }

        versions.sort_by(|a, b| b.cmp(a));
        Ok(versions)
    }

    /// Directory holding the version's `elm` executable, as recorded at
    /// install time.
    ///
    /// # Errors
    /// Returns [`ElmvmError::BinPathRead`] if the record is missing.
    pub async fn bin_path(&self, version: &ElmVersion) -> Result<PathBuf, ElmvmError> {
        let record = self.version_dir(version).join(BIN_PATH_FILE);
        let content = tokio::fs::read_to_string(&record)
            .await
            .map_err(|e| ElmvmError::BinPathRead {
                version: version.to_string(),
                details: e.to_string(),
            })?;
        Ok(PathBuf::from(content.trim()))
    }

    /// Command running the version's `elm` with the caller's arguments and
    /// working directory.
    ///
    /// # Errors
    /// Returns [`ElmvmError::BinPathRead`] if the version has no bin record.
    pub async fn elm_command(
        &self,
        version: &ElmVersion,
        args: Vec<OsString>,
    ) -> Result<CommandSpec, ElmvmError> {
        let bin_dir = self.bin_path(version).await?;
        let program = bin_dir.join(elm_executable());
        Ok(CommandSpec::new(program).args(args).path_prefix(bin_dir))
    }

    /// Command running npm inside the version's directory.
    ///
    /// # Errors
    /// Returns [`ElmvmError::NotInstalled`] if the version is absent.
    pub fn npm_command(
        &self,
        version: &ElmVersion,
        args: Vec<OsString>,
    ) -> Result<CommandSpec, ElmvmError> {
        if !self.is_installed(version) {
            return Err(ElmvmError::NotInstalled {
                version: version.to_string(),
            });
        }
        Ok(CommandSpec::new(&self.config.npm)
            .args(args)
            .current_dir(self.version_dir(version)))
    }
}

fn elm_executable() -> &'static str {
    if cfg!(windows) { "elm.cmd" } else { "elm" }
}
