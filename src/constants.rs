// -
// Networking

pub const LOOPBACK: &str = "127.0.0.1";

/// First port handed out by the sequential strategy
pub const DEFAULT_BASE_PORT: u16 = 31000;

/// Peer-cluster size when the caller does not choose one
pub const DEFAULT_CLUSTER_SIZE: usize = 3;

// -
// Process flags (names without the leading `--`)

pub(crate) const FLAG_PORT: &str = "port";
pub(crate) const FLAG_DBPATH: &str = "dbpath";
pub(crate) const FLAG_BIND_IP: &str = "bind_ip";
pub(crate) const FLAG_HOST: &str = "host";
pub(crate) const FLAG_NO_JOURNAL: &str = "nojournal";
pub(crate) const FLAG_KEY_FILE: &str = "keyFile";
pub(crate) const FLAG_SSL_MODE: &str = "sslMode";
pub(crate) const FLAG_SSL_PEM_KEY_FILE: &str = "sslPEMKeyFile";
pub(crate) const FLAG_SSL_CA_FILE: &str = "sslCAFile";
pub(crate) const FLAG_SSL_WEAK_VALIDATION: &str = "sslWeakCertificateValidation";
pub(crate) const FLAG_SSL: &str = "ssl";
pub(crate) const FLAG_SSL_ALLOW_INVALID_HOSTNAMES: &str = "sslAllowInvalidHostnames";
pub(crate) const FLAG_CLUSTER_AUTH_MODE: &str = "clusterAuthMode";
pub(crate) const FLAG_MASTER: &str = "master";
pub(crate) const FLAG_SLAVE: &str = "slave";
pub(crate) const FLAG_SOURCE: &str = "source";
pub(crate) const FLAG_OPLOG_SIZE: &str = "oplogSize";
pub(crate) const FLAG_NODB: &str = "nodb";
pub(crate) const FLAG_EVAL: &str = "eval";
pub(crate) const FLAG_QUIET: &str = "quiet";
pub(crate) const FLAG_USERNAME: &str = "username";
pub(crate) const FLAG_PASSWORD: &str = "password";
pub(crate) const FLAG_AUTH_DB: &str = "authenticationDatabase";
pub(crate) const FLAG_AUTH_MECHANISM: &str = "authenticationMechanism";

pub(crate) const SSL_MODE_REQUIRE: &str = "requireSSL";
pub(crate) const SSL_MODE_DISABLED: &str = "disabled";
pub(crate) const CLUSTER_AUTH_X509: &str = "x509";
pub(crate) const X509_MECHANISM: &str = "MONGODB-X509";

/// Flags the fixture derives itself; callers supplying them is a usage error.
pub(crate) const RESERVED_FLAGS: &[&str] = &[
    FLAG_MASTER,
    FLAG_SLAVE,
    FLAG_SOURCE,
    FLAG_PORT,
    FLAG_DBPATH,
    FLAG_BIND_IP,
];

/// Keys that steer fixture composition and never reach the process argv.
pub(crate) const LOGICAL_ONLY_KEYS: &[&str] = &[
    "runId",
    "pathOpts",
    "remember",
    "noRemember",
    "appendOptions",
    "restart",
    "noCleanData",
    "cleanData",
    "startClean",
    "forceLock",
    "useLogFiles",
    "logFile",
    "useHostName",
    "useHostname",
    "noReplSet",
    "forgetPort",
    "arbiter",
    "noJournalPrealloc",
    "noJournal",
    "binVersion",
    "waitForConnect",
    "bridgeOptions",
];

// -
// Fixture naming

pub(crate) const TOOL_DIR_PREFIX: &str = "tool_";
pub(crate) const TOOL_EXTERNAL_SUFFIX: &str = "_external";
pub(crate) const TOOL_EXTERNAL_FILE: &str = "a";

/// Command whose reply carries a namespace digest
pub(crate) const DIGEST_COMMAND: &str = "dbhash";
pub(crate) const DIGEST_FIELD: &str = "md5";

/// Variable name the shared test configuration is bound to inside shells
pub const TEST_DATA_BINDING: &str = "TestData";

/// Extended-JSON key marking a value as callable code
pub(crate) const CODE_KEY: &str = "$code";
