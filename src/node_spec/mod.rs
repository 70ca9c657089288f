//! Translates a logical node (role, port, data directory, caller overrides)
//! into the concrete process configuration handed to the launcher.
mod args;
mod builder;
mod node_config;
pub use args::*;
pub use builder::*;
pub use node_config::*;
#[cfg(test)]
mod builder_test;
