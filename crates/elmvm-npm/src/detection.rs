use std::path::{Path, PathBuf};

use log::{debug, warn};
use tokio::process::Command;
use which::which;

use elmvm_backend::ElmvmError;
use elmvm_platform::HideWindow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpmDetection {
    pub path: PathBuf,
    pub version: Option<String>,
}

/// Locate an npm executable, preferring `PATH` over well-known install
/// locations.
///
/// # Errors
/// Returns [`ElmvmError::NpmNotFound`] when no candidate exists.
pub async fn detect_npm() -> Result<NpmDetection, ElmvmError> {
    let on_path = which("npm").ok();
    let (path, in_path) =
        select_npm(on_path, get_common_npm_paths()).ok_or(ElmvmError::NpmNotFound)?;

    let version = get_npm_version(&path).await;
    let source = if in_path { "PATH" } else { "a well-known location" };
    match &version {
        Some(version) => debug!("Using npm {version} at {} (from {source})", path.display()),
        None => warn!(
            "npm at {} (from {source}) did not report a version",
            path.display()
        ),
    }

    Ok(NpmDetection { path, version })
}

fn select_npm(on_path: Option<PathBuf>, candidates: Vec<PathBuf>) -> Option<(PathBuf, bool)> {
    if let Some(path) = on_path {
        return Some((path, true));
    }

    candidates
        .into_iter()
        .find(|candidate| candidate.is_file())
        .map(|path| (path, false))
}

fn get_common_npm_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(target_os = "macos")]
    {
        paths.push(PathBuf::from("/opt/homebrew/bin/npm"));
    }

    #[cfg(unix)]
    {
        paths.push(PathBuf::from("/usr/local/bin/npm"));
        paths.push(PathBuf::from("/usr/bin/npm"));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".local").join("bin").join("npm"));
            paths.push(home.join(".volta").join("bin").join("npm"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(program_files) = std::env::var_os("ProgramFiles") {
            paths.push(PathBuf::from(program_files).join("nodejs").join("npm.cmd"));
        }
        if let Some(app_data) = dirs::data_dir() {
            paths.push(app_data.join("npm").join("npm.cmd"));
        }
    }

    paths
}

async fn get_npm_version(path: &Path) -> Option<String> {
    let output = Command::new(path)
        .arg("--version")
        .hide_window()
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!version.is_empty()).then_some(version)
}
