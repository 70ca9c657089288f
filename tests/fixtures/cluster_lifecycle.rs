use d_harness::ClusterFixture;
use serial_test::serial;
use tempfile::tempdir;

use crate::common::fake_options;
use crate::common::harness;

#[tokio::test]
#[serial]
async fn test_cluster_outage_and_recovery() {
    let dir = tempdir().unwrap();
    let env = harness(fake_options(dir.path(), "#!/bin/sh\n"));
    let mut cluster = ClusterFixture::with_default_size(&env, "peers").await.unwrap();
    let port = cluster.members()[1].port();

    assert_eq!(cluster.kill_member(1).await.unwrap(), Some(143));
    assert!(cluster.members()[0].is_running());
    assert!(!cluster.members()[1].is_running());
    assert!(cluster.members()[2].is_running());

    cluster.restart_member(1).await.unwrap();
    assert_eq!(cluster.members()[1].port(), port);
    cluster.check_consistency("test.foo", "after recovery").await.unwrap();

    cluster.stop().await.unwrap();
    assert!(cluster.members().iter().all(|m| !m.is_running()));
}
