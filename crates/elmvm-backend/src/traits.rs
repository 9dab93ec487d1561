use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::ElmvmError;
use crate::types::VersionPool;

/// Source of the raw version listing, oldest first.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    fn package(&self) -> &str;

    async fn fetch_listing(&self) -> Result<Vec<String>, ElmvmError>;
}

/// Persistent copy of the last registry pool.
#[async_trait]
pub trait VersionCache: Send + Sync {
    async fn load(&self) -> Result<VersionPool, ElmvmError>;

    async fn store(&self, pool: &VersionPool) -> Result<(), ElmvmError>;
}

/// Whether a version directory counts as installed.
pub trait IsInstalled: Send + Sync {
    fn is_installed(&self, version_dir: &Path) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    /// Directory prepended to the child's `PATH`.
    pub path_prefix: Option<PathBuf>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            path_prefix: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    #[must_use]
    pub fn path_prefix(mut self, dir: impl Into<PathBuf>) -> Self {
        self.path_prefix = Some(dir.into());
        self
    }

    #[must_use]
    pub fn display_args(&self) -> String {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the child was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Short description of a failed run for error messages.
    #[must_use]
    pub fn failure_summary(&self) -> String {
        let stderr = self.stderr.trim();
        match (self.code, stderr.is_empty()) {
            (Some(code), true) => format!("exited with status {code}"),
            (Some(code), false) => format!("exited with status {code}: {stderr}"),
            (None, true) => "terminated by signal".to_string(),
            (None, false) => format!("terminated by signal: {stderr}"),
        }
    }
}

/// Spawns child processes.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run with captured stdout/stderr.
    async fn output(&self, command: &CommandSpec) -> std::io::Result<CommandOutput>;

    /// Run with inherited standard streams and return the exit code.
    async fn status(&self, command: &CommandSpec) -> std::io::Result<i32>;
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn command_spec_builder_collects_arguments() {
        let spec = CommandSpec::new("npm")
            .arg("install")
            .args(["--save-exact", "elm@0.19.1"])
            .current_dir("/tmp/elmvm/0.19.1");

        assert_eq!(spec.program, PathBuf::from("npm"));
        assert_eq!(spec.display_args(), "install --save-exact elm@0.19.1");
        assert_eq!(spec.cwd, Some(PathBuf::from("/tmp/elmvm/0.19.1")));
        assert!(spec.path_prefix.is_none());
    }

    #[test]
    fn failure_summary_includes_stderr_when_present() {
        let output = CommandOutput {
            code: Some(1),
            stdout: String::new(),
            stderr: "npm ERR! 404\n".to_string(),
        };
        assert!(!output.success());
        assert_eq!(output.failure_summary(), "exited with status 1: npm ERR! 404");

        let killed = CommandOutput {
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(killed.failure_summary(), "terminated by signal");
    }

    struct RecordingRunner {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProcessRunner for RecordingRunner {
        async fn output(&self, command: &CommandSpec) -> std::io::Result<CommandOutput> {
            self.seen
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(command.display_args());
            Ok(CommandOutput {
                code: Some(0),
                stdout: "ok".to_string(),
                stderr: String::new(),
            })
        }

        async fn status(&self, command: &CommandSpec) -> std::io::Result<i32> {
            self.output(command).await.map(|_| 3)
        }
    }

    #[tokio::test]
    async fn runner_trait_objects_are_usable_behind_box() {
        let runner: Box<dyn ProcessRunner> = Box::new(RecordingRunner {
            seen: Mutex::new(Vec::new()),
        });

        let code = runner
            .status(&CommandSpec::new("elm").arg("make"))
            .await
            .expect("recording runner never fails");

        assert_eq!(code, 3);
    }
}
