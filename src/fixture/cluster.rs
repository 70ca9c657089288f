use std::sync::Arc;

use nix::sys::signal::Signal;
use serde_json::json;
use serde_json::Value;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::completion_banner;
use super::ServerFixture;
use crate::constants::DEFAULT_CLUSTER_SIZE;
use crate::constants::DIGEST_COMMAND;
use crate::constants::DIGEST_FIELD;
use crate::Connection;
use crate::ConsistencyError;
use crate::Error;
use crate::NodeOverrides;
use crate::Result;
use crate::TestEnvironment;
use crate::UsageError;

/// Fixed-size set of peer servers sharing one naming and port scheme.
///
/// Members are peers, so start order carries no meaning. Member 0 is the
/// reference for consistency checks.
#[derive(Debug)]
pub struct ClusterFixture {
    name: String,
    members: Vec<ServerFixture>,
}

impl ClusterFixture {
    /// Starts `size` members named `<name>0..<name>{size-1}`.
    ///
    /// If any member fails to come up, the ones already started are stopped
    /// before the error is returned.
    pub async fn start(
        env: &Arc<TestEnvironment>,
        name: &str,
        size: usize,
        overrides: NodeOverrides,
    ) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidConfig(format!(
                "cluster {name} needs at least one member"
            )));
        }

        let ports = env.ports().allocate(size)?;
        let mut members: Vec<ServerFixture> = ports
            .into_iter()
            .enumerate()
            .map(|(i, port)| {
                let member_name = format!("{name}{i}");
                let data_dir = env.data_path(&member_name);
                ServerFixture::new(env, member_name, port, data_dir).with_overrides(overrides.clone())
            })
            .collect();

        for i in 0..members.len() {
            if let Err(e) = members[i].start(false).await {
                warn!(cluster = %name, member = i, error = %e, "member failed to start, tearing down cluster");
                for started in members.iter_mut().take(i) {
                    if let Err(stop_err) = started.terminate().await {
                        warn!(member = started.name(), error = %stop_err, "failed to stop member during teardown");
                    }
                }
                return Err(e);
            }
        }

        let cluster = Self {
            name: name.to_string(),
            members,
        };
        info!(cluster = %cluster.name, connection_string = %cluster.connection_string(), "cluster started");
        Ok(cluster)
    }

    pub async fn with_default_size(
        env: &Arc<TestEnvironment>,
        name: &str,
    ) -> Result<Self> {
        Self::start(env, name, DEFAULT_CLUSTER_SIZE, NodeOverrides::default()).await
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Comma-joined `host:port` of every member
    pub fn connection_string(&self) -> String {
        self.members.iter().map(ServerFixture::address).collect::<Vec<_>>().join(",")
    }

    pub fn members(&self) -> &[ServerFixture] {
        &self.members
    }

    pub fn member(
        &self,
        index: usize,
    ) -> Result<&ServerFixture> {
        let size = self.members.len();
        self.members
            .get(index)
            .ok_or_else(|| UsageError::MemberOutOfRange { index, size }.into())
    }

    fn member_mut(
        &mut self,
        index: usize,
    ) -> Result<&mut ServerFixture> {
        let size = self.members.len();
        self.members
            .get_mut(index)
            .ok_or_else(|| UsageError::MemberOutOfRange { index, size }.into())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Compares the digest of `namespace` on every member against member 0.
    ///
    /// `namespace` is `db` or `db.collection`. A mismatch fails with every
    /// digest and `message` attached.
    pub async fn check_consistency(
        &self,
        namespace: &str,
        message: &str,
    ) -> Result<()> {
        let (database, command) = digest_command(namespace);

        let mut digests = Vec::with_capacity(self.members.len());
        for (index, member) in self.members.iter().enumerate() {
            let connection = member.connection().ok_or_else(|| UsageError::NotRunning {
                name: member.name().to_string(),
            })?;
            digests.push(fetch_digest(connection.as_ref(), database, &command, index, namespace).await?);
        }

        let expected = &digests[0];
        if let Some((index, actual)) = digests.iter().enumerate().skip(1).find(|(_, d)| *d != expected) {
            error!(cluster = %self.name, %namespace, index, %expected, %actual, ?digests, "{}", message);
            return Err(ConsistencyError::DigestMismatch {
                namespace: namespace.to_string(),
                index,
                expected: expected.clone(),
                actual: actual.clone(),
                digests: digests.clone(),
                message: message.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Terminates one member; the others keep serving.
    pub async fn kill_member(
        &mut self,
        index: usize,
    ) -> Result<Option<i32>> {
        let member = self.member_mut(index)?;
        let code = member.stop(Signal::SIGTERM).await?;
        info!(member = member.name(), index, ?code, "cluster member killed");
        Ok(code)
    }

    /// Brings a member back on the same port and name with a fresh data
    /// directory.
    pub async fn restart_member(
        &mut self,
        index: usize,
    ) -> Result<Arc<dyn Connection>> {
        let member = self.member_mut(index)?;
        let connection = member.start(false).await?;
        info!(member = member.name(), index, port = member.port(), "cluster member restarted");
        Ok(connection)
    }

    /// Stops every member, reporting the first failure after trying all.
    pub async fn stop(&mut self) -> Result<()> {
        let mut first_err = None;
        for member in self.members.iter_mut() {
            if let Err(e) = member.terminate().await {
                warn!(member = member.name(), error = %e, "failed to stop cluster member");
                first_err.get_or_insert(e);
            }
        }
        if let Some(e) = first_err {
            return Err(e);
        }
        completion_banner(&self.name);
        Ok(())
    }
}

/// `db.coll` -> (`db`, `{dbhash: 1, collections: [coll]}`)
fn digest_command(namespace: &str) -> (&str, Value) {
    match namespace.split_once('.') {
        Some((database, collection)) => (
            database,
            json!({ DIGEST_COMMAND: 1, "collections": [collection] }),
        ),
        None => (namespace, json!({ DIGEST_COMMAND: 1 })),
    }
}

async fn fetch_digest(
    connection: &dyn Connection,
    database: &str,
    command: &Value,
    index: usize,
    namespace: &str,
) -> Result<String> {
    let reply = connection.run_command(database, command).await?;
    reply
        .get(DIGEST_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ConsistencyError::MissingDigest {
                index,
                namespace: namespace.to_string(),
            }
            .into()
        })
}
