use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::process::Stdio;

use async_trait::async_trait;
use dashmap::DashMap;
#[cfg(test)]
use mockall::automock;
use nix::sys::signal::kill;
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use tokio::process::Child;
use tokio::process::Command;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::ProcessError;
use crate::Result;
use crate::UsageError;

/// Exclusive reference to a spawned process.
///
/// Not `Clone`: whoever holds the handle is the only party allowed to
/// signal or reap the process, and reaping consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct ProcessHandle {
    pid: u32,
    program: String,
}

impl ProcessHandle {
    pub fn new(
        pid: u32,
        program: impl Into<String>,
    ) -> Self {
        Self {
            pid,
            program: program.into(),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

/// Result of a program run to completion
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Starts `argv[0]` with the remaining arguments and returns without
    /// waiting for it or connecting to it.
    async fn spawn(
        &self,
        argv: &[String],
    ) -> Result<ProcessHandle>;

    async fn signal(
        &self,
        handle: &ProcessHandle,
        signal: Signal,
    ) -> Result<()>;

    /// Blocks until the process exits. Death by signal `n` reports `128 + n`.
    async fn wait(
        &self,
        handle: ProcessHandle,
    ) -> Result<i32>;

    /// Runs a program to completion, capturing its output.
    async fn output(
        &self,
        argv: &[String],
    ) -> Result<ProcessOutput>;

    /// Gives up on a process nobody will wait for: it is killed and
    /// forgotten so the launcher does not keep tracking it.
    fn abandon(
        &self,
        handle: ProcessHandle,
    );
}

/// Launcher backed by `tokio::process`.
///
/// Children are tracked by pid so handles stay plain values; dropping the
/// launcher kills whatever is still running.
#[derive(Debug, Default)]
pub struct TokioLauncher {
    children: DashMap<u32, Child>,
}

impl TokioLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of spawned processes not yet reaped
    pub fn live(&self) -> usize {
        self.children.len()
    }
}

#[async_trait]
impl ProcessLauncher for TokioLauncher {
    async fn spawn(
        &self,
        argv: &[String],
    ) -> Result<ProcessHandle> {
        let (program, args) = argv.split_first().ok_or(UsageError::EmptyArgv)?;
        debug!(?argv, "spawning process");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: program.clone(),
                source,
            })?;
        let pid = child.id().ok_or_else(|| ProcessError::NoPid {
            program: program.clone(),
        })?;
        self.children.insert(pid, child);

        info!(pid, %program, "process started");
        Ok(ProcessHandle::new(pid, program.clone()))
    }

    async fn signal(
        &self,
        handle: &ProcessHandle,
        signal: Signal,
    ) -> Result<()> {
        let pid = handle.pid();
        if !self.children.contains_key(&pid) {
            return Err(ProcessError::UnknownHandle { pid }.into());
        }

        debug!(pid, signal = signal.as_str(), "sending signal");
        kill(Pid::from_raw(pid as i32), signal).map_err(|errno| ProcessError::Signal {
            pid,
            signal: signal.as_str().to_string(),
            reason: errno.to_string(),
        })?;
        Ok(())
    }

    async fn wait(
        &self,
        handle: ProcessHandle,
    ) -> Result<i32> {
        let pid = handle.pid();
        let (_, mut child) = self
            .children
            .remove(&pid)
            .ok_or(ProcessError::UnknownHandle { pid })?;

        let status = child.wait().await.map_err(|source| ProcessError::Wait { pid, source })?;
        let code = exit_code(status);
        info!(pid, code, program = handle.program(), "process exited");
        Ok(code)
    }

    async fn output(
        &self,
        argv: &[String],
    ) -> Result<ProcessOutput> {
        let (program, args) = argv.split_first().ok_or(UsageError::EmptyArgv)?;
        debug!(?argv, "running program to completion");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ProcessError::Spawn {
                program: program.clone(),
                source,
            })?;

        Ok(ProcessOutput {
            code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn abandon(
        &self,
        handle: ProcessHandle,
    ) {
        let pid = handle.pid();
        let Some((_, mut child)) = self.children.remove(&pid) else {
            debug!(pid, "abandoned process already reaped");
            return;
        };
        // the tokio runtime reaps the zombie once the child is dropped
        if let Err(e) = child.start_kill() {
            debug!(pid, error = %e, "abandoned process already gone");
        }
        warn!(pid, program = handle.program(), "process abandoned without wait, killed");
    }
}

pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => -1,
    }
}
