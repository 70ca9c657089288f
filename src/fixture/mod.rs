//! Fixtures: managed groups of server processes for one test topology.
//!
//! [`ServerFixture`] owns a single process; the others compose it:
//! - [`ToolFixture`]: one server plus auxiliary command-line tools
//! - [`ReplicationPairFixture`]: primary/secondary pair
//! - [`ClusterFixture`]: fixed-size peer set with digest comparison
mod cluster;
mod replication;
mod server;
mod tool;
pub use cluster::*;
pub use replication::*;
pub use server::*;
pub use tool::*;

use tracing::info;

pub(crate) fn completion_banner(name: &str) {
    info!("*** {} completed successfully ***", name);
}
