mod config;
pub mod constants;
mod errors;
mod fixture;
mod node_spec;
mod port;
mod process;
mod shell;
pub mod utils;

pub use config::*;
pub use errors::*;
pub use fixture::*;
pub use node_spec::*;
pub use nix::sys::signal::Signal;
pub use port::*;
pub use process::*;
pub use shell::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
