use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::LOOPBACK;
use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NetworkConfig {
    /// Interface servers bind to unless told to listen everywhere
    /// Default: "127.0.0.1"
    #[serde(default = "default_bind_ip")]
    pub bind_ip: String,

    /// How long a fresh server may take to accept connections
    /// Default: 60000
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,

    /// Delay between readiness probes
    /// Default: 250
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_ip: default_bind_ip(),
            startup_timeout_ms: default_startup_timeout_ms(),
            probe_interval_ms: default_probe_interval_ms(),
        }
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bind_ip.is_empty() {
            return Err(Error::InvalidConfig("network.bind_ip cannot be empty".into()));
        }
        if self.startup_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "network.startup_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.probe_interval_ms == 0 || self.probe_interval_ms > self.startup_timeout_ms {
            return Err(Error::InvalidConfig(format!(
                "network.probe_interval_ms ({}) must be in 1..={}",
                self.probe_interval_ms, self.startup_timeout_ms
            )));
        }
        Ok(())
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// `host:port` for a server of this run
    pub fn address(
        &self,
        port: u16,
    ) -> String {
        format!("{}:{}", self.bind_ip, port)
    }
}

fn default_bind_ip() -> String {
    LOOPBACK.into()
}
fn default_startup_timeout_ms() -> u64 {
    60_000
}
fn default_probe_interval_ms() -> u64 {
    250
}
