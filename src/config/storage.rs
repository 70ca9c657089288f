use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root under which every fixture gets its data directory
    /// Default: "/data/db/"
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// Starts servers with journaling disabled
    /// Default: false
    #[serde(default)]
    pub no_journal: bool,

    /// Marker file a crashed server leaves inside its data directory
    /// Default: "mongod.lock"
    #[serde(default = "default_lock_file_name")]
    pub lock_file_name: String,

    /// Oplog size (MB) injected for replication roles
    /// Default: "40"
    #[serde(default = "default_oplog_size_mb")]
    pub default_oplog_size_mb: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            no_journal: false,
            lock_file_name: default_lock_file_name(),
            default_oplog_size_mb: default_oplog_size_mb(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.data_root.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("storage.data_root cannot be empty".into()));
        }
        if self.lock_file_name.is_empty() || self.lock_file_name.contains('/') {
            return Err(Error::InvalidConfig(format!(
                "storage.lock_file_name must be a bare file name, got {:?}",
                self.lock_file_name
            )));
        }
        if self.default_oplog_size_mb.parse::<u64>().is_err() {
            return Err(Error::InvalidConfig(format!(
                "storage.default_oplog_size_mb must be a number, got {:?}",
                self.default_oplog_size_mb
            )));
        }
        Ok(())
    }
}

fn default_data_root() -> PathBuf {
    PathBuf::from("/data/db/")
}
fn default_lock_file_name() -> String {
    "mongod.lock".into()
}
fn default_oplog_size_mb() -> String {
    "40".into()
}
