use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use super::TestOptions;
use crate::Connector;
use crate::PortAllocator;
use crate::ProcessLauncher;
use crate::Result;
use crate::ShellConnector;
use crate::TokioLauncher;

/// Everything a fixture needs from the surrounding test run.
///
/// Constructed once per run and shared by reference; fixtures never consult
/// global state for options, ports, or process control.
pub struct TestEnvironment {
    options: TestOptions,
    ports: Arc<PortAllocator>,
    launcher: Arc<dyn ProcessLauncher>,
    connector: Arc<dyn Connector>,
}

impl std::fmt::Debug for TestEnvironment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TestEnvironment").field("options", &self.options).finish()
    }
}

impl TestEnvironment {
    /// Validates `options` and wires the tokio process launcher, the
    /// shell-backed connector and the process-wide port pool.
    pub fn new(options: TestOptions) -> Result<Self> {
        let options = options.validate()?;
        let ports = PortAllocator::global(&options.ports);
        let launcher: Arc<dyn ProcessLauncher> = Arc::new(TokioLauncher::new());
        let connector: Arc<dyn Connector> =
            Arc::new(ShellConnector::new(launcher.clone(), &options));
        debug!(?options, "test environment ready");

        Ok(Self {
            options,
            ports,
            launcher,
            connector,
        })
    }

    /// Loads [`TestOptions`] from defaults, `CONFIG_PATH` and `HARNESS__*`
    /// variables, then builds the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(TestOptions::new()?)
    }

    pub fn with_launcher(
        mut self,
        launcher: Arc<dyn ProcessLauncher>,
    ) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn with_connector(
        mut self,
        connector: Arc<dyn Connector>,
    ) -> Self {
        self.connector = connector;
        self
    }

    pub fn with_port_allocator(
        mut self,
        ports: Arc<PortAllocator>,
    ) -> Self {
        self.ports = ports;
        self
    }

    pub fn options(&self) -> &TestOptions {
        &self.options
    }

    pub fn ports(&self) -> &PortAllocator {
        &self.ports
    }

    pub fn launcher(&self) -> &Arc<dyn ProcessLauncher> {
        &self.launcher
    }

    pub fn connector(&self) -> &Arc<dyn Connector> {
        &self.connector
    }

    /// Data directory for a fixture-chosen name under the run's data root
    pub fn data_path(
        &self,
        name: &str,
    ) -> PathBuf {
        self.options.storage.data_root.join(name)
    }
}
