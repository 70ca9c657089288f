use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use nix::sys::signal::Signal;
use tracing::info;
use tracing::warn;

use super::completion_banner;
use super::ServerFixture;
use crate::Connection;
use crate::NodeConfig;
use crate::NodeOverrides;
use crate::NodeRole;
use crate::NodeSpecBuilder;
use crate::Result;
use crate::TestEnvironment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Member {
    Primary,
    Secondary,
}

impl Member {
    pub fn as_str(&self) -> &'static str {
        match self {
            Member::Primary => "primary",
            Member::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Member {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a pair member is (re)started
#[derive(Debug, Clone, Default)]
pub struct PairStartOptions {
    pub overrides: NodeOverrides,
    /// Keep the member's data and skip the auth handshake
    pub restart: bool,
    /// Start without master/slave flags, as a plain standalone node
    pub no_replication_role: bool,
}

impl PairStartOptions {
    pub fn restart() -> Self {
        Self {
            restart: true,
            ..Default::default()
        }
    }
}

/// Primary/secondary pair using legacy master-slave replication.
///
/// Each member moves NotStarted -> Running -> Stopped and may be restarted
/// with its data preserved. The secondary always points at the primary's
/// port, which is fixed at construction.
#[derive(Debug)]
pub struct ReplicationPairFixture {
    env: Arc<TestEnvironment>,
    name: String,
    primary: ServerFixture,
    secondary: ServerFixture,
}

impl ReplicationPairFixture {
    pub fn new(
        env: &Arc<TestEnvironment>,
        name: &str,
    ) -> Result<Self> {
        let ports = env.ports().allocate(2)?;
        Ok(Self::with_ports(env, name, [ports[0], ports[1]]))
    }

    /// Pair on caller-chosen `[primary, secondary]` ports
    pub fn with_ports(
        env: &Arc<TestEnvironment>,
        name: &str,
        ports: [u16; 2],
    ) -> Self {
        let [primary_port, secondary_port] = ports;
        let primary = ServerFixture::new(
            env,
            format!("{name}-{}", Member::Primary),
            primary_port,
            member_path(env, name, Member::Primary),
        );
        let secondary = ServerFixture::new(
            env,
            format!("{name}-{}", Member::Secondary),
            secondary_port,
            member_path(env, name, Member::Secondary),
        );
        Self {
            env: env.clone(),
            name: name.to_string(),
            primary,
            secondary,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port(
        &self,
        member: Member,
    ) -> u16 {
        self.member(member).port()
    }

    pub fn path(
        &self,
        member: Member,
    ) -> PathBuf {
        member_path(&self.env, &self.name, member)
    }

    pub fn member(
        &self,
        member: Member,
    ) -> &ServerFixture {
        match member {
            Member::Primary => &self.primary,
            Member::Secondary => &self.secondary,
        }
    }

    fn member_mut(
        &mut self,
        member: Member,
    ) -> &mut ServerFixture {
        match member {
            Member::Primary => &mut self.primary,
            Member::Secondary => &mut self.secondary,
        }
    }

    pub fn is_running(
        &self,
        member: Member,
    ) -> bool {
        self.member(member).is_running()
    }

    fn role(
        &self,
        member: Member,
        start: &PairStartOptions,
    ) -> NodeRole {
        if start.no_replication_role {
            return NodeRole::Standalone;
        }
        match member {
            Member::Primary => NodeRole::Primary,
            Member::Secondary => {
                NodeRole::secondary_of(&self.env.options().network.bind_ip, self.primary.port())
            }
        }
    }

    /// Configuration `start` would launch `member` with
    pub fn options(
        &self,
        member: Member,
        start: &PairStartOptions,
    ) -> Result<NodeConfig> {
        NodeSpecBuilder::new(self.env.options(), self.port(member), self.path(member))
            .role(self.role(member, start))
            .overrides(start.overrides.clone())
            .build()
    }

    /// Starts one member.
    ///
    /// A fresh start authenticates when the run requires auth; a secondary's
    /// connection is switched to lag-tolerant reads.
    pub async fn start(
        &mut self,
        member: Member,
        start: PairStartOptions,
    ) -> Result<Arc<dyn Connection>> {
        let role = self.role(member, &start);
        let env = self.env.clone();
        let fixture = self.member_mut(member);
        fixture.configure(role, start.overrides);
        let connection = fixture.start(start.restart).await?;

        if !start.restart && env.options().requires_auth() {
            if let Err(e) = authenticate(&env, connection.as_ref()).await {
                warn!(%member, error = %e, "auth handshake failed, killing member");
                if let Err(stop_err) = fixture.stop(Signal::SIGKILL).await {
                    warn!(%member, error = %stop_err, "failed to kill member after auth failure");
                }
                return Err(e);
            }
        }

        if member == Member::Secondary {
            connection.set_secondary_ok();
        }
        info!(pair = %self.name, %member, restart = start.restart, "pair member ready");
        Ok(connection)
    }

    /// Stops `member`, or both members when `None`, with `signal`
    /// (default `SIGTERM`).
    pub async fn stop(
        &mut self,
        member: Option<Member>,
        signal: Option<Signal>,
    ) -> Result<()> {
        let signal = signal.unwrap_or(Signal::SIGTERM);
        match member {
            Some(member) => {
                let server = self.member_mut(member);
                server.stop(signal).await?;
                completion_banner(server.name());
            }
            None => {
                let primary = self.primary.stop(signal).await;
                let secondary = self.secondary.stop(signal).await;
                primary?;
                secondary?;
                completion_banner(&self.name);
            }
        }
        Ok(())
    }
}

fn member_path(
    env: &TestEnvironment,
    name: &str,
    member: Member,
) -> PathBuf {
    env.data_path(&format!("{name}-{member}"))
}

async fn authenticate(
    env: &TestEnvironment,
    connection: &dyn Connection,
) -> Result<()> {
    let credentials = env.options().security.credentials().await?;
    connection.authenticate(&credentials).await
}
