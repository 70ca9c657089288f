use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::constants::FLAG_SSL;
use crate::constants::FLAG_SSL_ALLOW_INVALID_HOSTNAMES;
use crate::constants::FLAG_SSL_CA_FILE;
use crate::constants::FLAG_SSL_PEM_KEY_FILE;
use crate::constants::SSL_MODE_REQUIRE;
use crate::constants::X509_MECHANISM;
use crate::ArgList;
use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SecurityConfig {
    /// Requires TLS on every server and client of the run
    #[serde(default)]
    pub use_ssl: bool,

    /// Uses x509 certificates for intra-cluster authentication
    #[serde(default)]
    pub use_x509: bool,

    /// Enables user authentication on servers
    #[serde(default)]
    pub auth: bool,

    /// Shared key file for intra-cluster authentication
    #[serde(default)]
    pub key_file: Option<PathBuf>,

    #[serde(default)]
    pub ssl: SslConfig,

    /// User the auth handshake logs in as
    /// Default: "__system"
    #[serde(default = "default_auth_user")]
    pub auth_user: String,

    /// Password for `auth_user`; the key file contents are used when unset
    #[serde(default)]
    pub auth_password: Option<String>,

    /// Database the credentials live in
    /// Default: "admin"
    #[serde(default = "default_auth_database")]
    pub auth_database: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            use_ssl: false,
            use_x509: false,
            auth: false,
            key_file: None,
            ssl: SslConfig::default(),
            auth_user: default_auth_user(),
            auth_password: None,
            auth_database: default_auth_database(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SslConfig {
    /// Server certificate and key in PEM format
    /// Default: "jstests/libs/server.pem"
    #[serde(default = "default_pem_key_file")]
    pub pem_key_file: PathBuf,

    /// Certificate authority in PEM format
    /// Default: "jstests/libs/ca.pem"
    #[serde(default = "default_ca_file")]
    pub ca_file: PathBuf,
}

impl Default for SslConfig {
    fn default() -> Self {
        Self {
            pem_key_file: default_pem_key_file(),
            ca_file: default_ca_file(),
        }
    }
}

impl SecurityConfig {
    pub fn validate(&self) -> Result<()> {
        if self.use_x509 && !self.use_ssl {
            return Err(Error::InvalidConfig(
                "security.use_x509 requires security.use_ssl".into(),
            ));
        }
        if self.use_ssl
            && (self.ssl.pem_key_file.as_os_str().is_empty()
                || self.ssl.ca_file.as_os_str().is_empty())
        {
            return Err(Error::InvalidConfig(
                "security.ssl.pem_key_file and security.ssl.ca_file are required with use_ssl"
                    .into(),
            ));
        }
        if let Some(key_file) = &self.key_file {
            if key_file.as_os_str().is_empty() {
                return Err(Error::InvalidConfig("security.key_file cannot be empty".into()));
            }
        }
        if self.auth_user.is_empty() {
            return Err(Error::InvalidConfig("security.auth_user cannot be empty".into()));
        }
        Ok(())
    }

    /// Transport security every server of the run is started with, if any
    pub fn transport(&self) -> Option<TransportSecurity> {
        self.use_ssl.then(|| TransportSecurity {
            mode: SSL_MODE_REQUIRE.to_string(),
            pem_key_file: self.ssl.pem_key_file.clone(),
            ca_file: self.ssl.ca_file.clone(),
        })
    }

    /// Credentials for the post-start auth handshake.
    ///
    /// Without an explicit password the key file contents are used, which
    /// is what the internal system user authenticates with.
    pub async fn credentials(&self) -> Result<Credentials> {
        if self.use_x509 {
            return Ok(Credentials {
                user: self.auth_user.clone(),
                password: None,
                database: "$external".to_string(),
                mechanism: Some(X509_MECHANISM.to_string()),
            });
        }

        let password = match (&self.auth_password, &self.key_file) {
            (Some(password), _) => Some(password.clone()),
            (None, Some(key_file)) => {
                debug!(?key_file, "reading key file for auth handshake");
                let contents = tokio::fs::read_to_string(key_file).await.map_err(|source| {
                    Error::PathError {
                        path: key_file.clone(),
                        source,
                    }
                })?;
                Some(contents.split_whitespace().collect::<String>())
            }
            (None, None) => None,
        };

        Ok(Credentials {
            user: self.auth_user.clone(),
            password,
            database: self.auth_database.clone(),
            mechanism: None,
        })
    }
}

/// TLS settings a server was started with; clients must mirror them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSecurity {
    pub mode: String,
    pub pem_key_file: PathBuf,
    pub ca_file: PathBuf,
}

impl TransportSecurity {
    /// Flags a client needs to reach a server started with these settings
    pub fn client_flags(&self) -> ArgList {
        let mut flags = ArgList::new();
        flags.flag(FLAG_SSL);
        flags.option(FLAG_SSL_PEM_KEY_FILE, self.pem_key_file.display().to_string());
        flags.option(FLAG_SSL_CA_FILE, self.ca_file.display().to_string());
        flags.flag(FLAG_SSL_ALLOW_INVALID_HOSTNAMES);
        flags
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub mechanism: Option<String>,
}

fn default_auth_user() -> String {
    "__system".into()
}
fn default_auth_database() -> String {
    "admin".into()
}
fn default_pem_key_file() -> PathBuf {
    PathBuf::from("jstests/libs/server.pem")
}
fn default_ca_file() -> PathBuf {
    PathBuf::from("jstests/libs/ca.pem")
}
