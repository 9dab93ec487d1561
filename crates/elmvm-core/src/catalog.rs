use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

use elmvm_backend::{
    Constraint, ElmVersion, ElmvmError, RegistryClient, VersionCache, VersionPool, find_suitable,
    select_best,
};

use crate::config::CatalogConfig;
use crate::manifest::{find_project_manifest, read_constraint};

/// Version resolved for a project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub version: ElmVersion,
    pub manifest: PathBuf,
    pub constraint: Constraint,
}

/// Produces version pools, preferring the local cache over the registry.
///
/// The cache only saves a round trip; it is never trusted over a live answer
/// and any failure reading or writing it is recovered from here.
#[derive(Clone)]
pub struct VersionCatalog {
    config: CatalogConfig,
    registry: Arc<dyn RegistryClient>,
    cache: Arc<dyn VersionCache>,
}

impl VersionCatalog {
    #[must_use]
    pub fn new(
        config: CatalogConfig,
        registry: Arc<dyn RegistryClient>,
        cache: Arc<dyn VersionCache>,
    ) -> Self {
        Self {
            config,
            registry,
            cache,
        }
    }

    #[must_use]
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Turn a raw oldest-first registry listing into a newest-first pool,
    /// dropping invalid, too-old and blacklisted versions.
    #[must_use]
    pub fn filter_listing<S: AsRef<str>>(&self, listing: &[S]) -> VersionPool {
        let admitted = listing
            .iter()
            .filter_map(|raw| match ElmVersion::parse(raw.as_ref()) {
                Ok(version) => Some(version),
                Err(e) => {
                    debug!("Skipping registry entry {:?}: {e}", raw.as_ref());
                    None
                }
            })
            .filter(|version| self.config.admits(version))
            .collect();
        VersionPool::from_oldest_first(admitted)
    }

    /// Pool from the cache file only.
    ///
    /// # Errors
    /// Returns [`ElmvmError::VersionCacheRead`] if the cache is missing or
    /// unreadable.
    pub async fn cached_pool(&self) -> Result<VersionPool, ElmvmError> {
        self.cache.load().await
    }

    /// Query the registry and persist the result. A failed cache write is
    /// logged and otherwise ignored.
    ///
    /// # Errors
    /// Returns registry errors ([`ElmvmError::NpmCommunication`],
    /// [`ElmvmError::NoElmVersions`]).
    pub async fn fetch_pool(&self) -> Result<VersionPool, ElmvmError> {
        info!("Querying registry for {} versions", self.registry.package());
        let listing = self.registry.fetch_listing().await?;
        let pool = self.filter_listing(&listing);

        if let Err(e) = self.cache.store(&pool).await {
            warn!("Version cache not updated: {e}");
        }

        Ok(pool)
    }

    /// Cached pool when available and non-empty, otherwise a fresh one.
    ///
    /// # Errors
    /// Returns registry errors when the cache cannot be used.
    pub async fn resolve_pool(&self) -> Result<VersionPool, ElmvmError> {
        match self.cached_pool().await {
            Ok(pool) if !pool.is_empty() => Ok(pool),
            Ok(_) => {
                debug!("Version cache is empty");
                self.fetch_pool().await
            }
            Err(e) => {
                debug!("{e}");
                self.fetch_pool().await
            }
        }
    }

    /// Newest version inside `constraint`, from the cache if it has one and
    /// from the registry otherwise.
    ///
    /// # Errors
    /// Returns registry errors, or [`ElmvmError::NoMatchingVersion`] when the
    /// fresh pool has no match either.
    pub async fn resolve_constraint(
        &self,
        constraint: &Constraint,
    ) -> Result<ElmVersion, ElmvmError> {
        self.resolve_with(
            |pool| select_best(pool, constraint).ok().cloned(),
            || constraint.to_string(),
        )
        .await
    }

    /// Resolve an explicit request (`latest`, exact or prefix) with the same
    /// cache-then-registry strategy.
    ///
    /// # Errors
    /// Returns registry errors, or [`ElmvmError::NoMatchingVersion`].
    pub async fn resolve_request(&self, requested: &str) -> Result<ElmVersion, ElmvmError> {
        self.resolve_with(
            |pool| find_suitable(requested, pool).cloned(),
            || requested.to_string(),
        )
        .await
    }

    async fn resolve_with<F, D>(&self, pick: F, describe: D) -> Result<ElmVersion, ElmvmError>
    where
        F: Fn(&VersionPool) -> Option<ElmVersion>,
        D: Fn() -> String,
    {
        match self.cached_pool().await {
            Ok(pool) => {
                if let Some(version) = pick(&pool) {
                    debug!("Resolved {version} from cache");
                    return Ok(version);
                }
                debug!("No cached version matches {}", describe());
            }
            Err(e) => debug!("{e}"),
        }

        let fresh = self.fetch_pool().await?;
        pick(&fresh).ok_or_else(|| ElmvmError::no_matching_version(describe()))
    }

    /// Resolve the Elm version the project containing `start` asks for.
    ///
    /// # Errors
    /// Returns [`ElmvmError::NoElmProject`], manifest and constraint errors,
    /// registry errors or [`ElmvmError::NoMatchingVersion`].
    pub async fn current_version(&self, start: &Path) -> Result<Resolution, ElmvmError> {
        let manifest = find_project_manifest(start, &self.config.manifest_names)?;
        let constraint = read_constraint(&manifest, &self.config.manifest_key).await?;
        debug!("{} requires {constraint}", manifest.display());

        let version = self.resolve_constraint(&constraint).await?;

        Ok(Resolution {
            version,
            manifest,
            constraint,
        })
    }
}
