use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;
use tracing::info;

use super::completion_banner;
use super::ServerFixture;
use crate::constants::FLAG_DBPATH;
use crate::constants::FLAG_HOST;
use crate::constants::TOOL_DIR_PREFIX;
use crate::constants::TOOL_EXTERNAL_FILE;
use crate::constants::TOOL_EXTERNAL_SUFFIX;
use crate::utils::file_io::reset_directory;
use crate::ArgList;
use crate::Connection;
use crate::NodeOverrides;
use crate::ProcessOutput;
use crate::Result;
use crate::TestEnvironment;

/// One server plus the auxiliary command-line tools that talk to it
/// (dump, restore, import, export, ...).
#[derive(Debug)]
pub struct ToolFixture {
    server: ServerFixture,
    external_dir: PathBuf,
}

impl ToolFixture {
    /// Allocates a port and resets `tool_<name>` and `tool_<name>_external`
    /// under the run's data root.
    pub async fn new(
        env: &Arc<TestEnvironment>,
        name: &str,
        overrides: NodeOverrides,
    ) -> Result<Self> {
        let port = env.ports().allocate_one()?;
        let db_path = env.data_path(&format!("{TOOL_DIR_PREFIX}{name}"));
        let external_dir = env.data_path(&format!("{TOOL_DIR_PREFIX}{name}{TOOL_EXTERNAL_SUFFIX}"));

        reset_directory(&db_path).await?;
        reset_directory(&external_dir).await?;
        debug!(%name, port, ?db_path, ?external_dir, "tool fixture directories ready");

        let server = ServerFixture::new(env, name, port, db_path).with_overrides(overrides);
        Ok(Self { server, external_dir })
    }

    pub fn server(&self) -> &ServerFixture {
        &self.server
    }

    pub fn port(&self) -> u16 {
        self.server.port()
    }

    pub fn db_path(&self) -> &Path {
        self.server.data_dir()
    }

    /// Scratch area for export/import round trips
    pub fn external_dir(&self) -> &Path {
        &self.external_dir
    }

    pub fn external_file(&self) -> PathBuf {
        self.external_dir.join(TOOL_EXTERNAL_FILE)
    }

    /// Starts the server on the fixture's db path, keeping its contents.
    pub async fn start_db(&mut self) -> Result<Arc<dyn Connection>> {
        self.server.start(true).await
    }

    /// Stops the server if running.
    pub async fn stop(&mut self) -> Result<()> {
        if self.server.terminate().await?.is_some() {
            completion_banner(self.server.name());
        }
        Ok(())
    }

    /// Argv for `<tool_prefix><tool> <args> [client ssl flags] [--host h:p]`.
    ///
    /// `--host` is skipped when `args` point the tool at a data directory.
    pub fn tool_argv(
        &self,
        tool: &str,
        args: &ArgList,
    ) -> Vec<String> {
        let env = self.server.env();
        let options = env.options();

        let mut flags = args.clone();
        let transport = match self.server.config() {
            Some(config) => config.security().cloned(),
            None => options.security.transport(),
        };
        if let Some(transport) = transport {
            for flag in transport.client_flags().iter() {
                if !flags.contains(&flag.name) {
                    flags.push(flag.clone());
                }
            }
        }
        if !args.contains(FLAG_DBPATH) && !args.contains(FLAG_HOST) {
            flags.option(FLAG_HOST, self.server.address());
        }

        let mut argv = vec![options.binaries.tool(tool)];
        argv.extend(flags.to_argv());
        argv
    }

    /// Runs `tool` to completion against this fixture's server.
    pub async fn run_tool(
        &self,
        tool: &str,
        args: &ArgList,
    ) -> Result<ProcessOutput> {
        let argv = self.tool_argv(tool, args);
        let output = self.server.env().launcher().output(&argv).await?;
        info!(%tool, code = output.code, "tool finished");
        Ok(output)
    }
}
