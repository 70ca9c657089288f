mod cluster_lifecycle;
mod parallel_shell;
mod replication_pair;
mod server_lifecycle;
mod tool_run;
