use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info};

use elmvm_backend::{ElmVersion, ElmvmError, ProcessRunner, VersionPool, find_suitable};
use elmvm_core::{
    InstallOutcome, InstallationManager, JsonFileCache, NpmRegistry, Resolution, VersionCatalog,
};
use elmvm_npm::{TokioProcessRunner, detect_npm};
use elmvm_platform::AppPaths;

use crate::cli::Command;
use crate::settings::Settings;

/// Program name recorded by managers that only touch the filesystem.
const OFFLINE_NPM: &str = "npm";

/// Everything a command needs, wired from settings.
pub struct App {
    settings: Settings,
    paths: AppPaths,
    cwd: PathBuf,
    catalog: VersionCatalog,
    runner: Arc<dyn ProcessRunner>,
}

impl App {
    /// # Errors
    /// Returns an error if the registry client cannot be built.
    pub fn new(settings: Settings, paths: AppPaths, cwd: PathBuf) -> Result<Self, ElmvmError> {
        let config = settings.catalog_config();
        let registry = NpmRegistry::new(&config)?;
        let cache = JsonFileCache::new(paths.version_cache_file());
        let catalog = VersionCatalog::new(config, Arc::new(registry), Arc::new(cache));

        Ok(Self {
            settings,
            paths,
            cwd,
            catalog,
            runner: Arc::new(TokioProcessRunner),
        })
    }

    #[cfg(test)]
    fn with_parts(
        settings: Settings,
        paths: AppPaths,
        cwd: PathBuf,
        catalog: VersionCatalog,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            settings,
            paths,
            cwd,
            catalog,
            runner,
        }
    }

    fn manager(&self, npm: PathBuf) -> InstallationManager {
        let config = self
            .settings
            .install_config(self.paths.storage_root(), &npm);
        InstallationManager::new(config, Arc::clone(&self.runner))
    }

    /// Manager for commands that never spawn npm.
    fn offline_manager(&self) -> InstallationManager {
        self.manager(PathBuf::from(OFFLINE_NPM))
    }

    async fn npm_manager(&self) -> Result<InstallationManager, ElmvmError> {
        let npm = detect_npm().await?;
        Ok(self.manager(npm.path))
    }

    /// Run one command and return the process exit code.
    ///
    /// # Errors
    /// Returns the first error the command hits.
    pub async fn run(&self, command: Command) -> Result<i32, ElmvmError> {
        debug!("Running {command:?} in {}", self.cwd.display());
        match command {
            Command::Install { version } => self.install(&version).await,
            Command::Remove { version } => self.remove(&version).await,
            Command::List { remote } => self.list(remote).await,
            Command::Current => self.current().await,
            Command::Refresh => self.refresh().await,
            Command::Npm { args } => self.npm(args).await,
            Command::Elm(args) => self.proxy(args).await,
        }
    }

    async fn install(&self, requested: &str) -> Result<i32, ElmvmError> {
        let version = self.catalog.resolve_request(requested).await?;
        match self.npm_manager().await?.ensure_installed(&version).await? {
            InstallOutcome::Installed(v) => println!("installed {v}"),
            InstallOutcome::AlreadyInstalled(v) => println!("{v} already installed"),
        }
        Ok(0)
    }

    async fn remove(&self, requested: &str) -> Result<i32, ElmvmError> {
        let manager = self.offline_manager();
        let installed = VersionPool::new(manager.list_installed().await?);
        let version = find_suitable(requested, &installed).ok_or_else(|| {
            ElmvmError::NotInstalled {
                version: requested.trim().to_string(),
            }
        })?;

        if manager.remove(version).await? {
            println!("removed {version}");
        } else {
            println!("{version} was not installed");
        }
        Ok(0)
    }

    async fn list(&self, remote: bool) -> Result<i32, ElmvmError> {
        let installed = self.offline_manager().list_installed().await?;

        if remote {
            let pool = self.catalog.resolve_pool().await?;
            for version in &pool {
                if is_listed(&installed, version) {
                    println!("{version} (installed)");
                } else {
                    println!("{version}");
                }
            }
        } else if installed.is_empty() {
            eprintln!("no Elm versions installed");
        } else {
            for version in &installed {
                println!("{version}");
            }
        }
        Ok(0)
    }

    async fn current(&self) -> Result<i32, ElmvmError> {
        let resolution = self.catalog.current_version(&self.cwd).await?;
        println!(
            "{} ({} requires {})",
            resolution.version,
            resolution.manifest.display(),
            resolution.constraint
        );
        Ok(0)
    }

    async fn refresh(&self) -> Result<i32, ElmvmError> {
        let pool = self.catalog.fetch_pool().await?;
        match pool.latest() {
            Some(latest) => println!("{} versions available, latest {latest}", pool.len()),
            None => println!("no installable versions published"),
        }
        Ok(0)
    }

    /// Resolve the project's version and install it if needed. npm is only
    /// looked up when installing or when `npm_needed` is set.
    async fn prepare(
        &self,
        npm_needed: bool,
    ) -> Result<(InstallationManager, ElmVersion), ElmvmError> {
        let Resolution { version, .. } = self.catalog.current_version(&self.cwd).await?;

        let offline = self.offline_manager();
        let installed = offline.is_installed(&version);
        if installed && !npm_needed {
            return Ok((offline, version));
        }

        let manager = self.npm_manager().await?;
        if !installed {
            eprintln!("installing Elm {version}");
            manager.ensure_installed(&version).await?;
        }
        Ok((manager, version))
    }

    async fn npm(&self, args: Vec<OsString>) -> Result<i32, ElmvmError> {
        let (manager, version) = self.prepare(true).await?;
        let command = manager.npm_command(&version, args)?;
        self.runner
            .status(&command)
            .await
            .map_err(|e| ElmvmError::NpmCommand {
                details: e.to_string(),
            })
    }

    async fn proxy(&self, args: Vec<OsString>) -> Result<i32, ElmvmError> {
        let (manager, version) = self.prepare(false).await?;
        let command = manager.elm_command(&version, args).await?;
        info!("Proxying to Elm {version}");
        self.runner
            .status(&command)
            .await
            .map_err(|e| ElmvmError::ElmCommand {
                details: e.to_string(),
            })
    }
}

/// Matches on the expanded form: `0.19.0-rc` and `0.19.0-bugfix` are equal
/// as versions but are different releases.
fn is_listed(installed: &[ElmVersion], version: &ElmVersion) -> bool {
    installed.iter().any(|v| v.expanded() == version.expanded())
}
