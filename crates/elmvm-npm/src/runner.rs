use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use log::{debug, error, info, trace};
use tokio::process::Command;

use elmvm_backend::{CommandOutput, CommandSpec, ProcessRunner};
use elmvm_platform::HideWindow;

/// Code reported for children that ended without one.
const NO_EXIT_CODE: i32 = 1;

/// [`ProcessRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    fn build_command(command: &CommandSpec) -> Command {
        debug!(
            "Building command: {} {}",
            command.program.display(),
            command.display_args()
        );

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);

        if let Some(dir) = &command.cwd {
            debug!("Working directory: {}", dir.display());
            cmd.current_dir(dir);
        }

        if let Some(prefix) = &command.path_prefix {
            debug!("Prepending {} to PATH", prefix.display());
            cmd.prepend_path(prefix);
        }

        cmd
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn output(&self, command: &CommandSpec) -> std::io::Result<CommandOutput> {
        info!(
            "Executing {}: {}",
            command.program.display(),
            command.display_args()
        );

        let output = Self::build_command(command)
            .stdin(Stdio::null())
            .hide_window()
            .output()
            .await?;

        debug!("Exit status: {:?}", output.status);
        trace!("stdout: {}", String::from_utf8_lossy(&output.stdout));
        if !output.stderr.is_empty() {
            trace!("stderr: {}", String::from_utf8_lossy(&output.stderr));
        }

        let result = CommandOutput {
            code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() {
            error!(
                "Command failed: {} {}: {}",
                command.program.display(),
                command.display_args(),
                result.failure_summary()
            );
        }

        Ok(result)
    }

    async fn status(&self, command: &CommandSpec) -> std::io::Result<i32> {
        info!(
            "Running {}: {}",
            command.program.display(),
            command.display_args()
        );

        let status = Self::build_command(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;

        debug!("Exit status: {status:?}");
        Ok(exit_code(status).unwrap_or(NO_EXIT_CODE))
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;

    // Shell convention for signal deaths.
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> Option<i32> {
    status.code()
}
