//! Command Executor: the I/O boundary that actually releases and renews the
//! network lease.
//!
//! The controller only sees [`LeaseExecutor`]; [`ShellExecutor`] is the
//! production implementation that shells out to the platform's commands.

pub mod commands;

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use crate::error::ExecError;

pub use commands::{CommandSpec, LeaseCommands};

/// Takes the link down and brings it back. Implementations must not retry.
pub trait LeaseExecutor: Send + Sync + 'static {
    fn bring_down(&self) -> impl Future<Output = Result<(), ExecError>> + Send;
    fn bring_up(&self) -> impl Future<Output = Result<(), ExecError>> + Send;
}

/// Runs the release/renew commands as child processes with a bounded timeout.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    commands: LeaseCommands,
    timeout: Duration,
}

impl ShellExecutor {
    pub fn new(commands: LeaseCommands, timeout: Duration) -> Self {
        Self { commands, timeout }
    }

    pub fn commands(&self) -> &LeaseCommands {
        &self.commands
    }

    async fn run(&self, spec: &CommandSpec) -> Result<(), ExecError> {
        let command = spec.to_string();
        tracing::debug!("Running `{command}`");

        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                return Err(ExecError::TimedOut {
                    command,
                    timeout: self.timeout,
                })
            }
            Ok(Err(source)) => return Err(ExecError::Spawn { command, source }),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(ExecError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tracing::debug!("`{command}` finished: {}", output.status);
        Ok(())
    }
}

impl LeaseExecutor for ShellExecutor {
    async fn bring_down(&self) -> Result<(), ExecError> {
        self.run(&self.commands.release).await
    }

    async fn bring_up(&self) -> Result<(), ExecError> {
        self.run(&self.commands.renew).await
    }
}
