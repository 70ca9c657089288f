//! Capabilities fixtures consume from the outside world: an OS process
//! launcher and a client connection to a running server.
//!
//! Fixtures only see the traits; the tokio and shell-backed implementations
//! are wired in by [`crate::TestEnvironment::new`].
mod connection;
mod launcher;
mod shell_connector;
pub use connection::*;
pub use launcher::*;
pub use shell_connector::*;
