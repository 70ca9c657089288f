use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::DashSet;
use parking_lot::Mutex;
use serde_json::json;
use serde_json::Value;

use crate::constants::DIGEST_COMMAND;
use crate::Connection;
use crate::ConnectionError;
use crate::Connector;
use crate::Credentials;
use crate::Result;

/// Connector whose sessions answer digest commands from a per-port table.
#[derive(Default)]
pub struct StubConnector {
    digests: Arc<DashMap<u16, String>>,
    unreachable: DashSet<u16>,
    reject_auth: Arc<AtomicBool>,
    sessions: DashMap<u16, Arc<StubConnection>>,
    connects: AtomicUsize,
}

impl StubConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_digest(
        &self,
        port: u16,
        digest: &str,
    ) {
        self.digests.insert(port, digest.to_string());
    }

    /// Connecting to `port` fails as if the server never came up
    pub fn make_unreachable(
        &self,
        port: u16,
    ) {
        self.unreachable.insert(port);
    }

    pub fn reject_auth(&self) {
        self.reject_auth.store(true, Ordering::SeqCst);
    }

    /// Latest session opened to `port`
    pub fn session(
        &self,
        port: u16,
    ) -> Option<Arc<StubConnection>> {
        self.sessions.get(&port).map(|s| s.value().clone())
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for StubConnector {
    async fn connect(
        &self,
        address: &str,
    ) -> Result<Arc<dyn Connection>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let port: u16 = address
            .rsplit_once(':')
            .and_then(|(_, p)| p.parse().ok())
            .expect("address ends with a port");
        if self.unreachable.contains(&port) {
            return Err(ConnectionError::NotReady {
                address: address.to_string(),
                timeout: Duration::ZERO,
            }
            .into());
        }

        let session = Arc::new(StubConnection {
            address: address.to_string(),
            port,
            digests: self.digests.clone(),
            reject_auth: self.reject_auth.clone(),
            credentials: Mutex::new(None),
            secondary_ok: AtomicBool::new(false),
            commands: Mutex::new(Vec::new()),
        });
        self.sessions.insert(port, session.clone());
        Ok(session)
    }
}

pub struct StubConnection {
    address: String,
    port: u16,
    digests: Arc<DashMap<u16, String>>,
    reject_auth: Arc<AtomicBool>,
    credentials: Mutex<Option<Credentials>>,
    secondary_ok: AtomicBool,
    commands: Mutex<Vec<(String, Value)>>,
}

impl StubConnection {
    pub fn credentials(&self) -> Option<Credentials> {
        self.credentials.lock().clone()
    }

    pub fn is_secondary_ok(&self) -> bool {
        self.secondary_ok.load(Ordering::SeqCst)
    }

    /// `(database, command)` pairs in call order
    pub fn commands(&self) -> Vec<(String, Value)> {
        self.commands.lock().clone()
    }
}

#[async_trait]
impl Connection for StubConnection {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn run_command(
        &self,
        database: &str,
        command: &Value,
    ) -> Result<Value> {
        self.commands.lock().push((database.to_string(), command.clone()));
        if command.get(DIGEST_COMMAND).is_some() {
            if let Some(digest) = self.digests.get(&self.port) {
                return Ok(json!({ "md5": digest.clone(), "ok": 1 }));
            }
        }
        Ok(json!({ "ok": 1 }))
    }

    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<()> {
        if self.reject_auth.load(Ordering::SeqCst) {
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
        self.secondary_ok.store(true, Ordering::SeqCst);
    }
}
