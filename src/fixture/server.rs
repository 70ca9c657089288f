use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use nix::sys::signal::Signal;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::utils::file_io::ensure_directory;
use crate::utils::file_io::remove_file_if_exists;
use crate::utils::file_io::reset_directory;
use crate::Connection;
use crate::NodeConfig;
use crate::NodeOverrides;
use crate::NodeRole;
use crate::NodeSpecBuilder;
use crate::ProcessHandle;
use crate::Result;
use crate::TestEnvironment;
use crate::UsageError;

/// Observable lifecycle of a [`ServerFixture`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Running,
    Stopped,
}

enum FixtureState {
    NotStarted,
    Running(RunningNode),
    Stopped,
}

struct RunningNode {
    handle: ProcessHandle,
    connection: Arc<dyn Connection>,
}

/// Lifecycle wrapper around one server process.
///
/// At most one live process per fixture: starting while running is a usage
/// error, stopping while not running does nothing.
pub struct ServerFixture {
    env: Arc<TestEnvironment>,
    name: String,
    port: u16,
    data_dir: PathBuf,
    role: NodeRole,
    overrides: NodeOverrides,
    state: FixtureState,
    last_config: Option<NodeConfig>,
}

impl ServerFixture {
    pub fn new(
        env: &Arc<TestEnvironment>,
        name: impl Into<String>,
        port: u16,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            env: env.clone(),
            name: name.into(),
            port,
            data_dir: data_dir.into(),
            role: NodeRole::Standalone,
            overrides: NodeOverrides::default(),
            state: FixtureState::NotStarted,
            last_config: None,
        }
    }

    /// Standalone node on a freshly allocated port, stored under
    /// `<data_root>/<name>`.
    pub fn standalone(
        env: &Arc<TestEnvironment>,
        name: &str,
    ) -> Result<Self> {
        let port = env.ports().allocate_one()?;
        Ok(Self::new(env, name, port, env.data_path(name)))
    }

    pub fn with_overrides(
        mut self,
        overrides: NodeOverrides,
    ) -> Self {
        self.overrides = overrides;
        self
    }

    /// Role and overrides used by the next `start`
    pub(crate) fn configure(
        &mut self,
        role: NodeRole,
        overrides: NodeOverrides,
    ) {
        self.role = role;
        self.overrides = overrides;
    }

    pub(crate) fn env(&self) -> &Arc<TestEnvironment> {
        &self.env
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn address(&self) -> String {
        self.env.options().network.address(self.port)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.data_dir.join(&self.env.options().storage.lock_file_name)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, FixtureState::Running(_))
    }

    pub fn state(&self) -> LifecycleState {
        match self.state {
            FixtureState::NotStarted => LifecycleState::NotStarted,
            FixtureState::Running(_) => LifecycleState::Running,
            FixtureState::Stopped => LifecycleState::Stopped,
        }
    }

    /// Configuration of the most recent start, kept after stop
    pub fn config(&self) -> Option<&NodeConfig> {
        self.last_config.as_ref()
    }

    pub fn connection(&self) -> Option<Arc<dyn Connection>> {
        match &self.state {
            FixtureState::Running(node) => Some(node.connection.clone()),
            _ => None,
        }
    }

    /// Spawns the server and returns a connection once it accepts clients.
    ///
    /// Without `reuse_data` the data directory is wiped first. A stale lock
    /// file is removed in both cases.
    pub async fn start(
        &mut self,
        reuse_data: bool,
    ) -> Result<Arc<dyn Connection>> {
        if self.is_running() {
            return Err(UsageError::AlreadyRunning {
                name: self.name.clone(),
            }
            .into());
        }

        let options = self.env.options();
        let config = NodeSpecBuilder::new(options, self.port, self.data_dir.clone())
            .role(self.role.clone())
            .overrides(self.overrides.clone())
            .build()?;

        if reuse_data {
            ensure_directory(&self.data_dir).await?;
        } else {
            reset_directory(&self.data_dir).await?;
        }
        if remove_file_if_exists(&self.lock_file()).await? {
            debug!(name = %self.name, "cleared stale lock file");
        }

        let argv = config.to_argv(&options.binaries.server);
        let handle = self.env.launcher().spawn(&argv).await?;
        self.last_config = Some(config);

        let address = self.address();
        let connection = match self.env.connector().connect(&address).await {
            Ok(connection) => connection,
            Err(e) => {
                warn!(name = %self.name, %address, error = %e, "server never became reachable, killing it");
                self.reap(handle, Signal::SIGKILL).await;
                self.state = FixtureState::Stopped;
                return Err(e);
            }
        };

        info!(name = %self.name, port = self.port, role = self.role.name(), reuse_data, "server started");
        self.state = FixtureState::Running(RunningNode {
            handle,
            connection: connection.clone(),
        });
        Ok(connection)
    }

    /// Delivers `signal` and blocks until the process exits.
    ///
    /// Returns the exit code, or `None` if nothing was running.
    pub async fn stop(
        &mut self,
        signal: Signal,
    ) -> Result<Option<i32>> {
        let node = match std::mem::replace(&mut self.state, FixtureState::Stopped) {
            FixtureState::Running(node) => node,
            other => {
                self.state = other;
                debug!(name = %self.name, "stop on a server that is not running");
                return Ok(None);
            }
        };

        let launcher = self.env.launcher().clone();
        if let Err(e) = launcher.signal(&node.handle, signal).await {
            self.state = FixtureState::Running(node);
            return Err(e);
        }
        let code = launcher.wait(node.handle).await?;

        info!(name = %self.name, port = self.port, signal = signal.as_str(), code, "server stopped");
        Ok(Some(code))
    }

    /// Graceful stop with `SIGTERM`
    pub async fn terminate(&mut self) -> Result<Option<i32>> {
        self.stop(Signal::SIGTERM).await
    }

    /// Best-effort cleanup of a process that never became usable
    async fn reap(
        &self,
        handle: ProcessHandle,
        signal: Signal,
    ) {
        let launcher = self.env.launcher();
        if let Err(e) = launcher.signal(&handle, signal).await {
            warn!(pid = handle.pid(), error = %e, "failed to signal unusable server");
        }
        if let Err(e) = launcher.wait(handle).await {
            warn!(error = %e, "failed to reap unusable server");
        }
    }
}

impl Drop for ServerFixture {
    fn drop(&mut self) {
        if let FixtureState::Running(node) = std::mem::replace(&mut self.state, FixtureState::Stopped) {
            warn!(name = %self.name, pid = node.handle.pid(), "server fixture dropped while running");
            self.env.launcher().abandon(node.handle);
        }
    }
}

impl std::fmt::Debug for ServerFixture {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ServerFixture")
            .field("name", &self.name)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("state", &self.state())
            .finish()
    }
}
