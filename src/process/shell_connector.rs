//! Connection capability implemented on top of the client shell binary.
//!
//! Each command runs as a short-lived shell process that prints the reply
//! as JSON; the session state (credentials, secondary reads) is replayed on
//! every invocation.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use crate::constants::FLAG_AUTH_DB;
use crate::constants::FLAG_AUTH_MECHANISM;
use crate::constants::FLAG_EVAL;
use crate::constants::FLAG_HOST;
use crate::constants::FLAG_PASSWORD;
use crate::constants::FLAG_QUIET;
use crate::constants::FLAG_USERNAME;
use crate::utils::net::wait_until_listening;
use crate::ArgList;
use crate::Connection;
use crate::ConnectionError;
use crate::Connector;
use crate::Credentials;
use crate::ProcessLauncher;
use crate::ProcessOutput;
use crate::Result;
use crate::TestOptions;
use crate::TransportSecurity;

const SECONDARY_OK_PREFIX: &str = "db.getMongo().setSlaveOk();";

pub struct ShellConnector {
    launcher: Arc<dyn ProcessLauncher>,
    shell: String,
    transport: Option<TransportSecurity>,
    startup_timeout: Duration,
    probe_interval: Duration,
}

impl ShellConnector {
    pub fn new(
        launcher: Arc<dyn ProcessLauncher>,
        options: &TestOptions,
    ) -> Self {
        Self {
            launcher,
            shell: options.binaries.shell.clone(),
            transport: options.security.transport(),
            startup_timeout: options.network.startup_timeout(),
            probe_interval: options.network.probe_interval(),
        }
    }
}

#[async_trait]
impl Connector for ShellConnector {
    async fn connect(
        &self,
        address: &str,
    ) -> Result<Arc<dyn Connection>> {
        wait_until_listening(address, self.startup_timeout, self.probe_interval).await?;
        debug!(%address, "server is accepting connections");
        Ok(Arc::new(ShellConnection::new(
            self.launcher.clone(),
            self.shell.clone(),
            address.to_string(),
            self.transport.clone(),
        )))
    }
}

pub struct ShellConnection {
    launcher: Arc<dyn ProcessLauncher>,
    shell: String,
    address: String,
    transport: Option<TransportSecurity>,
    credentials: Mutex<Option<Credentials>>,
    secondary_ok: AtomicBool,
}

impl ShellConnection {
    pub fn new(
        launcher: Arc<dyn ProcessLauncher>,
        shell: String,
        address: String,
        transport: Option<TransportSecurity>,
    ) -> Self {
        Self {
            launcher,
            shell,
            address,
            transport,
            credentials: Mutex::new(None),
            secondary_ok: AtomicBool::new(false),
        }
    }

    /// Shell argv for evaluating `script` with the session's state applied
    pub(crate) fn eval_argv(
        &self,
        script: &str,
        credentials: Option<&Credentials>,
    ) -> Vec<String> {
        let mut flags = ArgList::new();
        flags.flag(FLAG_QUIET);
        flags.option(FLAG_HOST, self.address.clone());
        if let Some(transport) = &self.transport {
            flags.extend(transport.client_flags());
        }
        if let Some(credentials) = credentials {
            flags.extend(credential_flags(credentials));
        }

        let script = if self.secondary_ok.load(Ordering::Acquire) {
            format!("{SECONDARY_OK_PREFIX}{script}")
        } else {
            script.to_string()
        };
        flags.option(FLAG_EVAL, script);

        let mut argv = vec![self.shell.clone()];
        argv.extend(flags.to_argv());
        argv
    }

    async fn eval(
        &self,
        script: &str,
        credentials: Option<&Credentials>,
    ) -> Result<ProcessOutput> {
        let argv = self.eval_argv(script, credentials);
        self.launcher.output(&argv).await
    }
}

#[async_trait]
impl Connection for ShellConnection {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn run_command(
        &self,
        database: &str,
        command: &Value,
    ) -> Result<Value> {
        let script = format!(
            "print(JSON.stringify(db.getSiblingDB({}).runCommand({})));",
            Value::from(database),
            command
        );
        let credentials = self.credentials.lock().clone();
        let output = self.eval(&script, credentials.as_ref()).await?;

        if !output.success() {
            return Err(ConnectionError::CommandFailed {
                address: self.address.clone(),
                command: command.to_string(),
                code: output.code,
                stderr: output.stderr,
            }
            .into());
        }
        parse_reply(&self.address, &output.stdout)
    }

    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<()> {
        let mut request = json!({ "user": credentials.user });
        if let Some(password) = &credentials.password {
            request["pwd"] = Value::from(password.as_str());
        }
        if let Some(mechanism) = &credentials.mechanism {
            request["mechanism"] = Value::from(mechanism.as_str());
        }
        let script = format!(
            "quit(db.getSiblingDB({}).auth({}) ? 0 : 1);",
            Value::from(credentials.database.as_str()),
            request
        );

        let output = self.eval(&script, None).await?;
        if !output.success() {
            warn!(address = %self.address, user = %credentials.user, "auth handshake rejected");
            return Err(ConnectionError::AuthFailed {
                address: self.address.clone(),
                user: credentials.user.clone(),
            }
            .into());
        }

        *self.credentials.lock() = Some(credentials.clone());
        Ok(())
    }

    fn set_secondary_ok(&self) {
        self.secondary_ok.store(true, Ordering::Release);
    }
}

fn credential_flags(credentials: &Credentials) -> ArgList {
    let mut flags = ArgList::new();
    flags.option(FLAG_USERNAME, credentials.user.clone());
    if let Some(password) = &credentials.password {
        flags.option(FLAG_PASSWORD, password.clone());
    }
    flags.option(FLAG_AUTH_DB, credentials.database.clone());
    if let Some(mechanism) = &credentials.mechanism {
        flags.option(FLAG_AUTH_MECHANISM, mechanism.clone());
    }
    flags
}

/// Reply is the last non-empty stdout line; anything before it is shell
/// chatter.
pub(crate) fn parse_reply(
    address: &str,
    stdout: &str,
) -> Result<Value> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| ConnectionError::InvalidReply {
            address: address.to_string(),
            reason: "empty output".to_string(),
        })?;

    serde_json::from_str(line).map_err(|e| {
        ConnectionError::InvalidReply {
            address: address.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}
