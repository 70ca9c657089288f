//! Test-run configuration for fixture orchestration.
//!
//! Replaces implicit, globally readable test options with an explicit
//! [`TestOptions`] value loaded once per run and carried by a
//! [`TestEnvironment`] into every fixture:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH`)
//! - Environment variable overrides (`HARNESS__` prefix)
//! - Section-wise validation
mod binaries;
mod environment;
mod network;
mod ports;
mod security;
mod storage;
pub use binaries::*;
pub use environment::*;
pub use network::*;
pub use ports::*;
pub use security::*;
pub use storage::*;
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Options shared by every fixture created in one test run
///
/// Hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TestOptions {
    /// Data directories, journaling and lock files
    #[serde(default)]
    pub storage: StorageConfig,
    /// Transport security and authentication
    #[serde(default)]
    pub security: SecurityConfig,
    /// Port allocation strategy
    #[serde(default)]
    pub ports: PortConfig,
    /// Executables launched by fixtures
    #[serde(default)]
    pub binaries: BinaryConfig,
    /// Binding and readiness probing
    #[serde(default)]
    pub network: NetworkConfig,
}

impl TestOptions {
    /// Loads options from hierarchical sources without validation.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("HARNESS__SECURITY__USE_SSL", "true");
    /// let options = TestOptions::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("HARNESS")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let options: Self = builder.build()?.try_deserialize()?;
        Ok(options)
    }

    /// Applies additional overrides from file without validation.
    ///
    /// Environment variables are re-applied on top so they keep the highest
    /// priority.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let options: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("HARNESS")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(options)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.storage.validate()?;
        self.security.validate()?;
        self.ports.validate()?;
        self.binaries.validate()?;
        self.network.validate()?;
        Ok(self)
    }

    /// Whether a fresh server must be authenticated against before use
    pub fn requires_auth(&self) -> bool {
        self.security.key_file.is_some() || self.security.auth || self.security.use_x509
    }
}
