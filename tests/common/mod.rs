use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use d_harness::Connection;
use d_harness::Connector;
use d_harness::Credentials;
use d_harness::Result;
use d_harness::TestEnvironment;
use d_harness::TestOptions;
use serde_json::json;
use serde_json::Value;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for integration test.");
}

/// Server stand-in: ignores its flags and idles until signalled.
pub const FAKE_SERVER: &str = "#!/bin/sh\nexec sleep 30\n";

/// Writes an executable shell script into `dir`.
///
/// Tests that call this run `#[serial]`: a fork in a concurrent test can
/// hold the write descriptor open and fail the exec with ETXTBSY.
pub fn write_script(
    dir: &Path,
    name: &str,
    body: &str,
) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Options rooted at `<root>/db` with every binary replaced by a script in
/// `<root>/bin`.
pub fn fake_options(
    root: &Path,
    shell_body: &str,
) -> TestOptions {
    let bin = root.join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    let server = write_script(&bin, "fake-server", FAKE_SERVER);
    let shell = write_script(&bin, "fake-shell", shell_body);
    write_script(&bin, "fake-echo", "#!/bin/sh\necho \"$@\"\n");

    let mut options = TestOptions::default();
    options.storage.data_root = root.join("db");
    options.binaries.server = server.display().to_string();
    options.binaries.shell = shell.display().to_string();
    options.binaries.tool_prefix = bin.join("fake-").display().to_string();
    options
}

/// Real process launcher, sessions that never touch the network.
pub fn harness(options: TestOptions) -> Arc<TestEnvironment> {
    enable_logger();
    let env = TestEnvironment::new(options)
        .unwrap()
        .with_connector(Arc::new(StaticConnector));
    Arc::new(env)
}

/// Every session reports the same digest.
pub struct StaticConnector;

#[async_trait]
impl Connector for StaticConnector {
    async fn connect(
        &self,
        address: &str,
    ) -> Result<Arc<dyn Connection>> {
        Ok(Arc::new(StaticConnection {
            address: address.to_string(),
        }))
    }
}

pub struct StaticConnection {
    address: String,
}

#[async_trait]
impl Connection for StaticConnection {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn run_command(
        &self,
        _database: &str,
        _command: &Value,
    ) -> Result<Value> {
        Ok(json!({ "md5": "d41d8cd98f00b204e9800998ecf8427e", "ok": 1 }))
    }

    async fn authenticate(
        &self,
        _credentials: &Credentials,
    ) -> Result<()> {
        Ok(())
    }

    fn set_secondary_ok(&self) {}
}
