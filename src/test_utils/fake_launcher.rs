use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use dashmap::DashMap;
use nix::sys::signal::Signal;
use parking_lot::Mutex;

use crate::ProcessError;
use crate::ProcessHandle;
use crate::ProcessLauncher;
use crate::ProcessOutput;
use crate::Result;
use crate::UsageError;

/// Launcher that records every argv and never starts anything.
///
/// Signalled processes report `128 + signo` on wait, untouched ones 0.
pub struct FakeLauncher {
    next_pid: AtomicU32,
    live: DashMap<u32, Option<i32>>,
    spawned: Mutex<Vec<Vec<String>>>,
    signals: Mutex<Vec<(u32, Signal)>>,
    outputs: Mutex<Vec<Vec<String>>>,
    abandoned: Mutex<Vec<u32>>,
    output: Mutex<ProcessOutput>,
    exit_code: Mutex<Option<i32>>,
}

impl Default for FakeLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self {
            next_pid: AtomicU32::new(1000),
            live: DashMap::new(),
            spawned: Mutex::new(Vec::new()),
            signals: Mutex::new(Vec::new()),
            outputs: Mutex::new(Vec::new()),
            abandoned: Mutex::new(Vec::new()),
            output: Mutex::new(ProcessOutput::default()),
            exit_code: Mutex::new(None),
        }
    }

    /// Argv of every `spawn`, in call order
    pub fn spawned(&self) -> Vec<Vec<String>> {
        self.spawned.lock().clone()
    }

    pub fn last_spawned(&self) -> Option<Vec<String>> {
        self.spawned.lock().last().cloned()
    }

    pub fn signals(&self) -> Vec<(u32, Signal)> {
        self.signals.lock().clone()
    }

    /// Argv of every `output`, in call order
    pub fn outputs(&self) -> Vec<Vec<String>> {
        self.outputs.lock().clone()
    }

    /// Pids given up through `abandon`
    pub fn abandoned(&self) -> Vec<u32> {
        self.abandoned.lock().clone()
    }

    pub fn live(&self) -> usize {
        self.live.len()
    }

    /// What `output` returns from now on
    pub fn set_output(
        &self,
        output: ProcessOutput,
    ) {
        *self.output.lock() = output;
    }

    /// Exit code `wait` reports regardless of signals
    pub fn set_exit_code(
        &self,
        code: i32,
    ) {
        *self.exit_code.lock() = Some(code);
    }
}

#[async_trait]
impl ProcessLauncher for FakeLauncher {
    async fn spawn(
        &self,
        argv: &[String],
    ) -> Result<ProcessHandle> {
        let program = argv.first().ok_or(UsageError::EmptyArgv)?;
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        self.spawned.lock().push(argv.to_vec());
        self.live.insert(pid, None);
        Ok(ProcessHandle::new(pid, program.clone()))
    }

    async fn signal(
        &self,
        handle: &ProcessHandle,
        signal: Signal,
    ) -> Result<()> {
        let pid = handle.pid();
        let mut entry = self.live.get_mut(&pid).ok_or(ProcessError::UnknownHandle { pid })?;
        *entry = Some(128 + signal as i32);
        self.signals.lock().push((pid, signal));
        Ok(())
    }

    async fn wait(
        &self,
        handle: ProcessHandle,
    ) -> Result<i32> {
        let pid = handle.pid();
        let (_, code) = self.live.remove(&pid).ok_or(ProcessError::UnknownHandle { pid })?;
        Ok(self.exit_code.lock().or(code).unwrap_or(0))
    }

    async fn output(
        &self,
        argv: &[String],
    ) -> Result<ProcessOutput> {
        if argv.is_empty() {
            return Err(UsageError::EmptyArgv.into());
        }
        self.outputs.lock().push(argv.to_vec());
        Ok(self.output.lock().clone())
    }

    fn abandon(
        &self,
        handle: ProcessHandle,
    ) {
        if self.live.remove(&handle.pid()).is_some() {
            self.abandoned.lock().push(handle.pid());
        }
    }
}
