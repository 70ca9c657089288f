use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::constants::FLAG_EVAL;
use crate::constants::FLAG_HOST;
use crate::constants::FLAG_NODB;
use crate::constants::FLAG_PORT;
use crate::constants::TEST_DATA_BINDING;
use crate::ArgList;
use crate::ProcessError;
use crate::ProcessHandle;
use crate::ProcessLauncher;
use crate::Result;
use crate::ScriptBody;
use crate::ScriptTemplate;
use crate::TestEnvironment;

/// Session the calling test currently talks through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultConnection {
    /// Database the caller's `db` handle points at
    pub database: String,
    /// `host:port` of the caller's session
    pub address: String,
}

/// Caller state mirrored into a spawned shell
#[derive(Debug, Clone, Default)]
pub struct ShellContext {
    pub default_connection: Option<DefaultConnection>,
    /// Shared test configuration, bound as `TestData`
    pub test_data: Option<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShellTarget {
    /// Explicit port; otherwise taken from the default connection
    pub port: Option<u16>,
    /// Start with `--nodb`
    pub no_connect: bool,
}

/// Spawns client shells that run concurrently with the test.
pub struct ParallelShellLauncher {
    env: Arc<TestEnvironment>,
}

impl ParallelShellLauncher {
    pub fn new(env: &Arc<TestEnvironment>) -> Self {
        Self { env: env.clone() }
    }

    /// Full program text: bindings, then the database handle when
    /// connecting, then the body.
    pub fn script(
        &self,
        template: &ScriptTemplate,
        context: &ShellContext,
        no_connect: bool,
    ) -> String {
        let mut script = String::new();
        for (name, value) in template.bindings() {
            script.push_str(&format!("{name} = {value};"));
        }
        if let Some(test_data) = &context.test_data {
            script.push_str(&format!("{TEST_DATA_BINDING} = {test_data};"));
        }
        if !no_connect {
            if let Some(connection) = &context.default_connection {
                script.push_str(&format!(
                    "db = db.getSiblingDB({});",
                    Value::from(connection.database.as_str())
                ));
            }
        }
        script.push_str(&template.body().render());
        script
    }

    pub fn argv(
        &self,
        template: &ScriptTemplate,
        context: &ShellContext,
        target: ShellTarget,
    ) -> Vec<String> {
        let options = self.env.options();
        let mut flags = ArgList::new();

        if target.no_connect {
            flags.flag(FLAG_NODB);
        }
        flags.option(FLAG_EVAL, self.script(template, context, target.no_connect));

        let mut port = target.port.map(|p| p.to_string());
        if let Some(connection) = &context.default_connection {
            let (host, default_port) = match connection.address.split_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (connection.address.as_str(), None),
            };
            flags.option(FLAG_HOST, host);
            if port.is_none() {
                port = default_port.map(str::to_string);
            }
        }
        if let Some(port) = port {
            flags.option(FLAG_PORT, port);
        }

        if !target.no_connect {
            if let Some(transport) = options.security.transport() {
                flags.extend(transport.client_flags());
            }
        }

        let mut argv = vec![options.binaries.shell.clone()];
        argv.extend(flags.to_argv());
        argv
    }

    /// Spawns the shell without connecting to it.
    pub async fn launch(
        &self,
        template: &ScriptTemplate,
        context: &ShellContext,
        target: ShellTarget,
    ) -> Result<ParallelShellHandle> {
        let argv = self.argv(template, context, target);
        debug!(?argv, "starting parallel shell");
        let launcher = self.env.launcher().clone();
        let handle = launcher.spawn(&argv).await?;
        info!(pid = handle.pid(), ?target, "parallel shell started");
        Ok(ParallelShellHandle {
            pid: handle.pid(),
            handle: Some(handle),
            launcher,
        })
    }

    /// Like [`Self::launch`] for an untyped body; an unsupported body
    /// fails before anything is spawned.
    pub async fn launch_value(
        &self,
        body: Value,
        context: &ShellContext,
        target: ShellTarget,
    ) -> Result<ParallelShellHandle> {
        let template = ScriptTemplate::new(ScriptBody::try_from(body)?);
        self.launch(&template, context, target).await
    }
}

/// Running parallel shell; `join` is the only way to observe it finish.
///
/// Dropping it unjoined kills the shell.
#[must_use = "a parallel shell should be joined"]
pub struct ParallelShellHandle {
    pid: u32,
    /// `None` once joined
    handle: Option<ProcessHandle>,
    launcher: Arc<dyn ProcessLauncher>,
}

impl ParallelShellHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Blocks until the shell exits and returns its exit code.
    pub async fn join(mut self) -> Result<i32> {
        let pid = self.pid;
        let handle = self.handle.take().ok_or(ProcessError::UnknownHandle { pid })?;
        let code = self.launcher.wait(handle).await?;
        debug!(pid, code, "parallel shell finished");
        Ok(code)
    }
}

impl Drop for ParallelShellHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            warn!(pid = self.pid, "parallel shell dropped without join");
            self.launcher.abandon(handle);
        }
    }
}

impl std::fmt::Debug for ParallelShellHandle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ParallelShellHandle").field("handle", &self.handle).finish()
    }
}
