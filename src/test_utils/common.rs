use std::path::Path;
use std::sync::Arc;

use crate::constants::DEFAULT_BASE_PORT;
use crate::PortAllocator;
use crate::SequentialPorts;
use crate::TestEnvironment;
use crate::TestOptions;

use super::FakeLauncher;
use super::StubConnector;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// Default options rooted at `root`
pub fn test_options(root: &Path) -> TestOptions {
    let mut options = TestOptions::default();
    options.storage.data_root = root.to_path_buf();
    options
}

pub struct TestContext {
    pub env: Arc<TestEnvironment>,
    pub launcher: Arc<FakeLauncher>,
    pub connector: Arc<StubConnector>,
}

/// Environment backed by [`FakeLauncher`], [`StubConnector`] and a private
/// sequential port pool.
pub fn test_env(options: TestOptions) -> TestContext {
    let launcher = Arc::new(FakeLauncher::new());
    let connector = Arc::new(StubConnector::new());
    let env = TestEnvironment::new(options)
        .expect("valid test options")
        .with_launcher(launcher.clone())
        .with_connector(connector.clone())
        .with_port_allocator(Arc::new(PortAllocator::new(Box::new(SequentialPorts::new(
            DEFAULT_BASE_PORT,
        )))));
    TestContext {
        env: Arc::new(env),
        launcher,
        connector,
    }
}
