use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use elmvm_backend::{ElmvmError, VersionCache, VersionPool};

/// Version cache stored as a JSON array of expanded version strings,
/// newest first.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    path: PathBuf,
}

impl JsonFileCache {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Decode cache file content. Entries that are not strings, or strings that
/// are not versions, are dropped; anything other than an array is an error.
fn decode_pool(data: &str) -> Result<VersionPool, String> {
    let value: serde_json::Value = serde_json::from_str(data).map_err(|e| e.to_string())?;
    let entries = value
        .as_array()
        .ok_or_else(|| "cache content is not a JSON array".to_string())?;
    Ok(VersionPool::from_expanded(
        entries.iter().filter_map(serde_json::Value::as_str),
    ))
}

#[async_trait]
impl VersionCache for JsonFileCache {
    async fn load(&self) -> Result<VersionPool, ElmvmError> {
        let data = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ElmvmError::cache_read(&self.path, e.to_string()))?;
        decode_pool(&data).map_err(|details| ElmvmError::cache_read(&self.path, details))
    }

    async fn store(&self, pool: &VersionPool) -> Result<(), ElmvmError> {
        let data = serde_json::to_vec(&pool.expanded_strings())
            .map_err(|e| ElmvmError::cache_write(&self.path, e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ElmvmError::cache_write(&self.path, e.to_string()))?;
        }
        write_atomic(&self.path, &data).map_err(|e| ElmvmError::cache_write(&self.path, e.to_string()))
    }
}

/// Write and sync `data` into a freshly created temp file. The file is
/// removed again if either step fails.
fn fill_temp_file(
    mut file: std::fs::File,
    tmp_path: &Path,
    data: &[u8],
) -> std::io::Result<()> {
    if let Err(error) = file.write_all(data).and_then(|()| file.sync_all()) {
        drop(file);
        let _ = std::fs::remove_file(tmp_path);
        return Err(error);
    }
    Ok(())
}

fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "cache path has no parent")
    })?;

    let file_name = path
        .file_name()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("versions");
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    let pid = std::process::id();

    let mut tmp_path = None;
    for attempt in 0..16_u8 {
        let candidate = parent.join(format!(".{file_name}.{pid}.{timestamp}.{attempt}.tmp"));
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => {
                fill_temp_file(file, &candidate, data)?;
                tmp_path = Some(candidate);
                break;
            }
            Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(error) => return Err(error),
        }
    }

    let Some(tmp_path) = tmp_path else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "failed to create unique cache temp file",
        ));
    };

    if let Err(error) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(error);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_and_load_round_trip_preserves_order() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let cache = JsonFileCache::new(temp_dir.path().join("versions.json"));
        let pool = VersionPool::from_expanded(["0.19.1", "0.19.0", "0.18.0"]);

        cache.store(&pool).await.expect("cache should be written");
        let loaded = cache.load().await.expect("cache should load");

        assert_eq!(loaded.expanded_strings(), vec!["0.19.1", "0.19.0", "0.18.0"]);
    }

    #[tokio::test]
    async fn load_skips_non_string_and_invalid_entries() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("versions.json");
        std::fs::write(&path, r#"["0.19.1", 42, null, "nope", {"v": 1}, "0.18.0"]"#)
            .expect("cache file should be written");

        let loaded = JsonFileCache::new(&path).load().await.expect("cache should load");

        assert_eq!(loaded.expanded_strings(), vec!["0.19.1", "0.18.0"]);
    }

    #[tokio::test]
    async fn missing_file_is_cache_read_failure() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let cache = JsonFileCache::new(temp_dir.path().join("absent.json"));

        assert!(matches!(
            cache.load().await,
            Err(ElmvmError::VersionCacheRead { .. })
        ));
    }

    #[tokio::test]
    async fn non_array_content_is_cache_read_failure() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("versions.json");
        std::fs::write(&path, r#"{"versions": ["0.19.1"]}"#).expect("cache file should be written");

        assert!(matches!(
            JsonFileCache::new(&path).load().await,
            Err(ElmvmError::VersionCacheRead { .. })
        ));
    }

    #[tokio::test]
    async fn corrupt_content_is_cache_read_failure() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("versions.json");
        std::fs::write(&path, "[\"0.19.1\"").expect("cache file should be written");

        assert!(JsonFileCache::new(&path).load().await.is_err());
    }

    #[test]
    fn failed_temp_write_removes_the_temp_file() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let tmp_path = temp_dir.path().join(".versions.json.1.2.0.tmp");
        std::fs::write(&tmp_path, "").expect("temp file should be created");
        let read_only = std::fs::File::open(&tmp_path).expect("temp file should open");

        let result = fill_temp_file(read_only, &tmp_path, br#"["0.19.1"]"#);

        assert!(result.is_err());
        assert!(!tmp_path.exists());
    }

    #[tokio::test]
    async fn store_replaces_existing_file_without_leaving_temp_files() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("versions.json");
        std::fs::write(&path, "{not-valid-json").expect("invalid file should be written");

        let cache = JsonFileCache::new(&path);
        cache
            .store(&VersionPool::from_expanded(["0.19.1"]))
            .await
            .expect("cache should be written");

        let loaded = cache.load().await.expect("cache should load after overwrite");
        assert_eq!(loaded.len(), 1);

        let temp_files = std::fs::read_dir(temp_dir.path())
            .expect("read temp dir entries")
            .filter_map(Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .contains(".versions.json.")
            })
            .count();
        assert_eq!(temp_files, 0);
    }

    #[tokio::test]
    async fn store_creates_missing_parent_directory() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let cache = JsonFileCache::new(temp_dir.path().join("nested").join("versions.json"));

        cache
            .store(&VersionPool::from_expanded(["0.19.1"]))
            .await
            .expect("cache should be written");

        assert!(cache.path().is_file());
    }
}
