use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde_json::Value;

use crate::Credentials;
use crate::Result;

/// Client session with one running server
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Connection: Send + Sync {
    /// `host:port` the session talks to
    fn address(&self) -> String;

    /// Runs an administrative command against `database` and returns the
    /// reply document.
    async fn run_command(
        &self,
        database: &str,
        command: &Value,
    ) -> Result<Value>;

    /// Logs in; later commands run as this user.
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<()>;

    /// Marks reads through this session as allowed to lag the primary.
    fn set_secondary_ok(&self);
}

impl std::fmt::Debug for dyn Connection {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.address())
            .finish()
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Waits until a server listens on `address` and opens a session to it.
    async fn connect(
        &self,
        address: &str,
    ) -> Result<Arc<dyn Connection>>;
}
