use std::ffi::OsString;
use std::path::Path;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// Adjustments applied to every child elmvm spawns.
pub trait HideWindow {
    /// Keep captured helper processes from flashing a console on Windows.
    fn hide_window(&mut self) -> &mut Self;

    /// Put `dir` in front of the inherited `PATH`.
    fn prepend_path(&mut self, dir: &Path) -> &mut Self;
}

impl HideWindow for tokio::process::Command {
    #[cfg(windows)]
    fn hide_window(&mut self) -> &mut Self {
        self.creation_flags(CREATE_NO_WINDOW)
    }

    #[cfg(not(windows))]
    fn hide_window(&mut self) -> &mut Self {
        self
    }

    fn prepend_path(&mut self, dir: &Path) -> &mut Self {
        match prepend_to_path(dir, std::env::var_os("PATH")) {
            Ok(path) => self.env("PATH", path),
            Err(_) => self,
        }
    }
}

/// Join `dir` in front of an existing `PATH` value.
///
/// # Errors
/// Returns an error if `dir` contains the platform's path separator.
pub fn prepend_to_path(
    dir: &Path,
    current: Option<OsString>,
) -> Result<OsString, std::env::JoinPathsError> {
    let mut entries = vec![dir.to_path_buf()];
    if let Some(current) = current {
        entries.extend(std::env::split_paths(&current));
    }
    std::env::join_paths(entries)
}
