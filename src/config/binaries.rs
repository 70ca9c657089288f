use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BinaryConfig {
    /// Database server executable
    #[serde(default = "default_server")]
    pub server: String,

    /// Client shell executable used for parallel shells and commands
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Prefix joined with a tool name, e.g. "mongo" + "dump"
    #[serde(default = "default_tool_prefix")]
    pub tool_prefix: String,
}

impl Default for BinaryConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            shell: default_shell(),
            tool_prefix: default_tool_prefix(),
        }
    }
}

impl BinaryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.server.is_empty() || self.shell.is_empty() {
            return Err(Error::InvalidConfig(
                "binaries.server and binaries.shell cannot be empty".into(),
            ));
        }
        Ok(())
    }

    /// Executable name for an auxiliary tool
    pub fn tool(
        &self,
        name: &str,
    ) -> String {
        format!("{}{}", self.tool_prefix, name)
    }
}

fn default_server() -> String {
    "mongod".into()
}
fn default_shell() -> String {
    "mongo".into()
}
fn default_tool_prefix() -> String {
    "mongo".into()
}
