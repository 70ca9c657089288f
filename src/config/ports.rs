use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_BASE_PORT;
use crate::Error;
use crate::Result;

/// How the process-wide port pool hands out ports
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PortStrategy {
    /// Use the job's port range when the runner provides one, else count up
    #[default]
    Auto,
    /// Draw from the runner-assigned `range_start..range_end`
    Registry,
    /// Count up from `base_port`
    Sequential,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PortConfig {
    #[serde(default)]
    pub strategy: PortStrategy,

    /// First port of the sequential strategy
    /// Default: 31000
    #[serde(default = "default_base_port")]
    pub base_port: u16,

    /// First port of the range the test runner reserved for this job
    #[serde(default)]
    pub range_start: Option<u16>,

    /// End (exclusive) of the job's reserved range
    #[serde(default)]
    pub range_end: Option<u16>,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            strategy: PortStrategy::default(),
            base_port: default_base_port(),
            range_start: None,
            range_end: None,
        }
    }
}

impl PortConfig {
    pub fn validate(&self) -> Result<()> {
        if self.base_port == 0 {
            return Err(Error::InvalidConfig("ports.base_port must be non-zero".into()));
        }
        match (self.range_start, self.range_end) {
            (None, None) => {}
            (Some(start), Some(end)) if start > 0 && start < end => {}
            (Some(_), Some(_)) => {
                return Err(Error::InvalidConfig(
                    "ports.range_start must be non-zero and below ports.range_end".into(),
                ));
            }
            _ => {
                return Err(Error::InvalidConfig(
                    "ports.range_start and ports.range_end must be set together".into(),
                ));
            }
        }
        if self.strategy == PortStrategy::Registry && self.job_range().is_none() {
            return Err(Error::InvalidConfig(
                "ports.strategy = registry needs ports.range_start and ports.range_end".into(),
            ));
        }
        Ok(())
    }

    /// `(start, end)` of the job's reserved range, if the runner set one
    pub fn job_range(&self) -> Option<(u16, u16)> {
        self.range_start.zip(self.range_end)
    }
}

fn default_base_port() -> u16 {
    DEFAULT_BASE_PORT
}
