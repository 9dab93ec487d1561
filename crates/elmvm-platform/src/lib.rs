mod commands;
mod paths;

pub use commands::{HideWindow, prepend_to_path};
pub use paths::{AppPaths, AppPathsError, CONFIG_DIR_ENV, HOME_ENV};
