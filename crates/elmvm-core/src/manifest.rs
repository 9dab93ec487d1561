use std::path::{Path, PathBuf};

use elmvm_backend::{Constraint, ElmvmError};

/// Walk from `start` up to the filesystem root and return the first manifest
/// found. Names are tried in order inside each directory before moving up.
///
/// # Errors
/// Returns [`ElmvmError::NoElmProject`] when no ancestor holds a manifest.
pub fn find_project_manifest(start: &Path, names: &[String]) -> Result<PathBuf, ElmvmError> {
    for dir in start.ancestors() {
        for name in names {
            let candidate = dir.join(name);
            if candidate.is_file() {
                log::debug!("Found project manifest {}", candidate.display());
                return Ok(candidate);
            }
        }
    }

    Err(ElmvmError::NoElmProject {
        start: start.to_path_buf(),
    })
}

/// Read the raw constraint string under `key`.
///
/// # Errors
/// Returns [`ElmvmError::ManifestRead`] for unreadable files or invalid JSON
/// and [`ElmvmError::MissingElmVersion`] when the key is absent or not a
/// string.
pub async fn read_constraint_string(path: &Path, key: &str) -> Result<String, ElmvmError> {
    let manifest_read = |details: String| ElmvmError::ManifestRead {
        path: path.to_path_buf(),
        details,
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| manifest_read(e.to_string()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| manifest_read(e.to_string()))?;

    value
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ElmvmError::MissingElmVersion {
            path: path.to_path_buf(),
            key: key.to_string(),
        })
}

/// Read and parse the project's declared Elm version range.
///
/// # Errors
/// Propagates [`read_constraint_string`] errors and
/// [`ElmvmError::ParseConstraint`].
pub async fn read_constraint(path: &Path, key: &str) -> Result<Constraint, ElmvmError> {
    let raw = read_constraint_string(path, key).await?;
    Constraint::parse(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["elm.json".to_string(), "elm-package.json".to_string()]
    }

    #[test]
    fn finds_manifest_in_ancestor_directory() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let project = temp_dir.path().join("app");
        let nested = project.join("src").join("Page");
        std::fs::create_dir_all(&nested).expect("nested dirs should be created");
        std::fs::write(project.join("elm.json"), "{}").expect("manifest should be written");

        let found = find_project_manifest(&nested, &names()).expect("manifest should be found");

        assert_eq!(found, project.join("elm.json"));
    }

    #[test]
    fn nearest_manifest_wins() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let inner = temp_dir.path().join("inner");
        std::fs::create_dir_all(&inner).expect("inner dir should be created");
        std::fs::write(temp_dir.path().join("elm.json"), "{}").expect("outer manifest");
        std::fs::write(inner.join("elm-package.json"), "{}").expect("inner manifest");

        let found = find_project_manifest(&inner, &names()).expect("manifest should be found");

        assert_eq!(found, inner.join("elm-package.json"));
    }

    #[test]
    fn missing_manifest_is_no_elm_project() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let only = vec!["elmvm-test-manifest-that-does-not-exist.json".to_string()];

        let result = find_project_manifest(temp_dir.path(), &only);

        assert!(matches!(result, Err(ElmvmError::NoElmProject { .. })));
    }

    #[tokio::test]
    async fn reads_declared_constraint() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("elm-package.json");
        std::fs::write(
            &path,
            r#"{"version": "1.0.0", "elm-version": "0.18.0 <= v < 0.19.0"}"#,
        )
        .expect("manifest should be written");

        let constraint = read_constraint(&path, "elm-version")
            .await
            .expect("constraint should parse");

        assert_eq!(constraint.to_string(), "0.18.0 <= v < 0.19.0");
    }

    #[tokio::test]
    async fn missing_key_is_reported_distinctly() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("elm.json");
        std::fs::write(&path, r#"{"type": "application"}"#).expect("manifest should be written");

        let result = read_constraint(&path, "elm-version").await;

        assert!(
            matches!(result, Err(ElmvmError::MissingElmVersion { ref key, .. }) if key == "elm-version")
        );
    }

    #[tokio::test]
    async fn non_string_value_counts_as_missing() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("elm.json");
        std::fs::write(&path, r#"{"elm-version": 19}"#).expect("manifest should be written");

        let result = read_constraint(&path, "elm-version").await;

        assert!(matches!(result, Err(ElmvmError::MissingElmVersion { .. })));
    }

    #[tokio::test]
    async fn invalid_json_is_manifest_read_failure() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("elm.json");
        std::fs::write(&path, "{not json").expect("manifest should be written");

        let result = read_constraint(&path, "elm-version").await;

        assert!(matches!(result, Err(ElmvmError::ManifestRead { .. })));
    }

    #[tokio::test]
    async fn unparseable_value_is_constraint_failure() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp_dir.path().join("elm.json");
        std::fs::write(&path, r#"{"elm-version": "0.19.1"}"#).expect("manifest should be written");

        let result = read_constraint(&path, "elm-version").await;

        assert!(matches!(result, Err(ElmvmError::ParseConstraint { .. })));
    }
}
