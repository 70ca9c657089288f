//! Fixture Error Hierarchy
//!
//! Errors are grouped by who is at fault: the caller misusing a fixture, the
//! data under test diverging across peers, or the environment (processes,
//! connections, filesystem, configuration).

use std::path::PathBuf;
use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller misused a fixture; never retried
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// Peers hold different data; a test failure, not an infrastructure fault
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    /// Spawning, signalling or reaping an OS process failed
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Talking to a running server failed
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Filesystem failures without extra context
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Filesystem failures on a known path
    #[error("I/O error at path {path}: {source}")]
    PathError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Layered configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration loaded but failed validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Unrecoverable failures, e.g. the port pool ran dry
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("fixture {name} is already running")]
    AlreadyRunning { name: String },

    #[error("flag --{flag} is derived by the fixture and cannot be supplied by the caller")]
    ReservedFlag { flag: String },

    #[error("bad script body for parallel shell: expected source text or callable, got {kind}")]
    InvalidScriptBody { kind: &'static str },

    #[error("fixture {name} is not running")]
    NotRunning { name: String },

    #[error("member index {index} out of range for cluster of size {size}")]
    MemberOutOfRange { index: usize, size: usize },

    #[error("cannot launch a process from an empty argument list")]
    EmptyArgv,
}

#[derive(Debug, thiserror::Error)]
pub enum ConsistencyError {
    #[error(
        "checkHash on {namespace} {message}: member {index} reported {actual}, member 0 reported {expected}\n{digests:?}"
    )]
    DigestMismatch {
        namespace: String,
        index: usize,
        expected: String,
        actual: String,
        digests: Vec<String>,
        message: String,
    },

    #[error("member {index} returned no digest for {namespace}")]
    MissingDigest { index: usize, namespace: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("spawned {program} but the OS reported no pid")]
    NoPid { program: String },

    #[error("failed to deliver {signal} to pid {pid}: {reason}")]
    Signal {
        pid: u32,
        signal: String,
        reason: String,
    },

    #[error("failed waiting for pid {pid}: {source}")]
    Wait { pid: u32, source: std::io::Error },

    #[error("pid {pid} is not owned by this launcher")]
    UnknownHandle { pid: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("server at {address} not ready after {timeout:?}")]
    NotReady { address: String, timeout: Duration },

    #[error("command {command} against {address} exited with {code}: {stderr}")]
    CommandFailed {
        address: String,
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("unparseable reply from {address}: {reason}")]
    InvalidReply { address: String, reason: String },

    #[error("authentication as {user} against {address} failed")]
    AuthFailed { address: String, user: String },
}
