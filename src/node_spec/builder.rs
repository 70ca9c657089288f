//! Derives a [`NodeConfig`] from a role, the run's [`TestOptions`] and caller
//! overrides.
//!
//! Rules, in order:
//! - reserved flags (`master`, `slave`, `source`, `port`, `dbpath`,
//!   `bind_ip`) in overrides are rejected; the fixture owns them
//! - logical-only keys are dropped from overrides
//! - run-wide options (no journal, key file, SSL, x509) are injected unless
//!   the overrides already name the flag
//! - role flags are derived: `--master` for primaries, `--slave --source
//!   host:port` for secondaries
//! - replication roles get a default oplog size unless one is given

use std::path::PathBuf;

use tracing::debug;

use crate::constants::CLUSTER_AUTH_X509;
use crate::constants::FLAG_CLUSTER_AUTH_MODE;
use crate::constants::FLAG_KEY_FILE;
use crate::constants::FLAG_MASTER;
use crate::constants::FLAG_NO_JOURNAL;
use crate::constants::FLAG_OPLOG_SIZE;
use crate::constants::FLAG_SLAVE;
use crate::constants::FLAG_SOURCE;
use crate::constants::FLAG_SSL_CA_FILE;
use crate::constants::FLAG_SSL_MODE;
use crate::constants::FLAG_SSL_PEM_KEY_FILE;
use crate::constants::FLAG_SSL_WEAK_VALIDATION;
use crate::constants::LOGICAL_ONLY_KEYS;
use crate::constants::RESERVED_FLAGS;
use crate::constants::SSL_MODE_DISABLED;
use crate::constants::SSL_MODE_REQUIRE;
use crate::ArgList;
use crate::Flag;
use crate::NodeConfig;
use crate::NodeOverrides;
use crate::NodeRole;
use crate::Result;
use crate::TestOptions;
use crate::TransportSecurity;
use crate::UsageError;

pub struct NodeSpecBuilder<'a> {
    options: &'a TestOptions,
    port: u16,
    data_dir: PathBuf,
    role: NodeRole,
    overrides: NodeOverrides,
}

impl<'a> NodeSpecBuilder<'a> {
    pub fn new(
        options: &'a TestOptions,
        port: u16,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            options,
            port,
            data_dir: data_dir.into(),
            role: NodeRole::Standalone,
            overrides: NodeOverrides::default(),
        }
    }

    pub fn role(
        mut self,
        role: NodeRole,
    ) -> Self {
        self.role = role;
        self
    }

    pub fn overrides(
        mut self,
        overrides: NodeOverrides,
    ) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn build(self) -> Result<NodeConfig> {
        let caller = caller_flags(&self.overrides.flags)?;
        let mut flags = ArgList::new();

        let storage = &self.options.storage;
        let security = &self.options.security;

        if storage.no_journal {
            inject(&mut flags, &caller, FLAG_NO_JOURNAL, None);
        }
        if let Some(key_file) = &security.key_file {
            inject(
                &mut flags,
                &caller,
                FLAG_KEY_FILE,
                Some(key_file.display().to_string()),
            );
        }
        // a caller turning SSL off gets none of the certificate flags
        let ssl_disabled = caller.value_of(FLAG_SSL_MODE) == Some(SSL_MODE_DISABLED);
        if security.use_ssl && !ssl_disabled {
            inject(
                &mut flags,
                &caller,
                FLAG_SSL_MODE,
                Some(SSL_MODE_REQUIRE.to_string()),
            );
            inject(
                &mut flags,
                &caller,
                FLAG_SSL_PEM_KEY_FILE,
                Some(security.ssl.pem_key_file.display().to_string()),
            );
            inject(
                &mut flags,
                &caller,
                FLAG_SSL_CA_FILE,
                Some(security.ssl.ca_file.display().to_string()),
            );
            inject(&mut flags, &caller, FLAG_SSL_WEAK_VALIDATION, None);
        }
        if security.use_x509 {
            inject(
                &mut flags,
                &caller,
                FLAG_CLUSTER_AUTH_MODE,
                Some(CLUSTER_AUTH_X509.to_string()),
            );
        }

        match &self.role {
            NodeRole::Standalone => {}
            NodeRole::Primary => {
                flags.flag(FLAG_MASTER);
            }
            NodeRole::Secondary { upstream } => {
                flags.flag(FLAG_SLAVE);
                flags.option(FLAG_SOURCE, upstream.clone());
            }
        }

        if self.role.is_replicated() {
            inject(
                &mut flags,
                &caller,
                FLAG_OPLOG_SIZE,
                Some(storage.default_oplog_size_mb.clone()),
            );
        }

        flags.extend(caller);
        let transport = derive_transport(&flags, self.options);

        let config = NodeConfig {
            port: self.port,
            data_dir: self.data_dir,
            role: self.role,
            bind_all_interfaces: self.overrides.bind_all_interfaces,
            bind_ip: self.options.network.bind_ip.clone(),
            flags,
            security: transport,
        };
        debug!(port = config.port, role = config.role.name(), flags = ?config.flags.to_argv(), "node config built");
        Ok(config)
    }
}

/// Caller overrides minus logical-only keys; reserved flags are an error.
fn caller_flags(overrides: &ArgList) -> Result<ArgList> {
    let mut flags = ArgList::new();
    for flag in overrides.iter() {
        if RESERVED_FLAGS.contains(&flag.name.as_str()) {
            return Err(UsageError::ReservedFlag {
                flag: flag.name.clone(),
            }
            .into());
        }
        if LOGICAL_ONLY_KEYS.contains(&flag.name.as_str()) {
            debug!(key = %flag.name, "dropping logical-only override");
            continue;
        }
        flags.push(flag.clone());
    }
    Ok(flags)
}

/// Adds `name` unless the caller or an earlier rule already supplied it
fn inject(
    flags: &mut ArgList,
    caller: &ArgList,
    name: &str,
    value: Option<String>,
) {
    if caller.contains(name) || flags.contains(name) {
        return;
    }
    flags.push(Flag::new(name, value));
}

fn derive_transport(
    flags: &ArgList,
    options: &TestOptions,
) -> Option<TransportSecurity> {
    let mode = flags.value_of(FLAG_SSL_MODE)?;
    if mode == SSL_MODE_DISABLED {
        return None;
    }
    Some(TransportSecurity {
        mode: mode.to_string(),
        pem_key_file: flags
            .value_of(FLAG_SSL_PEM_KEY_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|| options.security.ssl.pem_key_file.clone()),
        ca_file: flags
            .value_of(FLAG_SSL_CA_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|| options.security.ssl.ca_file.clone()),
    })
}
