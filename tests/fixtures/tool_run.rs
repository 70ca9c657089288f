use d_harness::ArgList;
use d_harness::NodeOverrides;
use d_harness::ToolFixture;
use serial_test::serial;
use tempfile::tempdir;

use crate::common::fake_options;
use crate::common::harness;

#[tokio::test]
#[serial]
async fn test_run_tool_captures_output() {
    let dir = tempdir().unwrap();
    let env = harness(fake_options(dir.path(), "#!/bin/sh\n"));
    let mut tool = ToolFixture::new(&env, "echo", NodeOverrides::default()).await.unwrap();
    tool.start_db().await.unwrap();

    let output = tool
        .run_tool("echo", &ArgList::new().with_option("db", "test"))
        .await
        .unwrap();

    assert!(output.success());
    assert_eq!(
        output.stdout.trim(),
        format!("--db test --host 127.0.0.1:{}", tool.port())
    );
    tool.stop().await.unwrap();
}
