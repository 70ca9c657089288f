use d_harness::ParallelShellLauncher;
use d_harness::ShellContext;
use d_harness::ShellTarget;
use serde_json::json;
use serial_test::serial;
use tempfile::tempdir;

use crate::common::fake_options;
use crate::common::harness;

#[tokio::test]
#[serial]
async fn test_join_yields_shell_exit_code() {
    let dir = tempdir().unwrap();
    let env = harness(fake_options(dir.path(), "#!/bin/sh\nexit 7\n"));
    let shells = ParallelShellLauncher::new(&env);

    let handle = shells
        .launch_value(
            json!({ "$code": "function() { quit(7); }" }),
            &ShellContext::default(),
            ShellTarget {
                port: None,
                no_connect: true,
            },
        )
        .await
        .unwrap();

    assert_eq!(handle.join().await.unwrap(), 7);
}
