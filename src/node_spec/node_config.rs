use std::path::Path;
use std::path::PathBuf;

use crate::constants::FLAG_BIND_IP;
use crate::constants::FLAG_DBPATH;
use crate::constants::FLAG_PORT;
use crate::ArgList;
use crate::TransportSecurity;

/// Topology role a node is started in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRole {
    Standalone,
    Primary,
    /// Replicates from `upstream` (`host:port` of the primary)
    Secondary { upstream: String },
}

impl NodeRole {
    pub fn secondary_of(
        host: &str,
        primary_port: u16,
    ) -> Self {
        NodeRole::Secondary {
            upstream: format!("{host}:{primary_port}"),
        }
    }

    pub fn is_replicated(&self) -> bool {
        !matches!(self, NodeRole::Standalone)
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeRole::Standalone => "standalone",
            NodeRole::Primary => "primary",
            NodeRole::Secondary { .. } => "secondary",
        }
    }
}

/// Caller-supplied adjustments to a node's process configuration
#[derive(Debug, Clone, Default)]
pub struct NodeOverrides {
    /// Listen on every interface instead of loopback only
    pub bind_all_interfaces: bool,
    /// Extra flags; logical-only keys are filtered out at build time
    pub flags: ArgList,
}

impl NodeOverrides {
    pub fn with_flags(flags: ArgList) -> Self {
        Self {
            bind_all_interfaces: false,
            flags,
        }
    }
}

/// Fully derived configuration of one server process.
///
/// Built once per start by [`crate::NodeSpecBuilder`]; read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    pub(crate) port: u16,
    pub(crate) data_dir: PathBuf,
    pub(crate) role: NodeRole,
    pub(crate) bind_all_interfaces: bool,
    pub(crate) bind_ip: String,
    pub(crate) flags: ArgList,
    pub(crate) security: Option<TransportSecurity>,
}

impl NodeConfig {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn role(&self) -> &NodeRole {
        &self.role
    }

    pub fn bind_all_interfaces(&self) -> bool {
        self.bind_all_interfaces
    }

    pub fn flags(&self) -> &ArgList {
        &self.flags
    }

    pub fn security(&self) -> Option<&TransportSecurity> {
        self.security.as_ref()
    }

    /// `host:port` this node replicates from, secondaries only
    pub fn upstream(&self) -> Option<&str> {
        match &self.role {
            NodeRole::Secondary { upstream } => Some(upstream),
            _ => None,
        }
    }

    pub fn upstream_port(&self) -> Option<u16> {
        self.upstream()
            .and_then(|u| u.rsplit_once(':'))
            .and_then(|(_, port)| port.parse().ok())
    }

    /// Launcher argv: `binary --port P --dbpath D [--bind_ip IP] <flags>`
    pub fn to_argv(
        &self,
        binary: &str,
    ) -> Vec<String> {
        let mut argv = vec![
            binary.to_string(),
            format!("--{FLAG_PORT}"),
            self.port.to_string(),
            format!("--{FLAG_DBPATH}"),
            self.data_dir.display().to_string(),
        ];
        if !self.bind_all_interfaces {
            argv.push(format!("--{FLAG_BIND_IP}"));
            argv.push(self.bind_ip.clone());
        }
        argv.extend(self.flags.to_argv());
        argv
    }
}
