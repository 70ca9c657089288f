use d_harness::Member;
use d_harness::PairStartOptions;
use d_harness::ReplicationPairFixture;
use serial_test::serial;
use tempfile::tempdir;

use crate::common::fake_options;
use crate::common::harness;

#[tokio::test]
#[serial]
async fn test_pair_restart_keeps_secondary_pointed_at_primary() {
    let dir = tempdir().unwrap();
    let env = harness(fake_options(dir.path(), "#!/bin/sh\n"));
    let mut pair = ReplicationPairFixture::new(&env, "pair").unwrap();

    pair.start(Member::Primary, PairStartOptions::default()).await.unwrap();
    pair.start(Member::Secondary, PairStartOptions::default()).await.unwrap();
    pair.stop(Some(Member::Secondary), None).await.unwrap();
    pair.start(Member::Secondary, PairStartOptions::restart()).await.unwrap();

    let config = pair.member(Member::Secondary).config().unwrap();
    assert_eq!(config.upstream_port(), Some(pair.port(Member::Primary)));

    pair.stop(None, None).await.unwrap();
    assert!(!pair.is_running(Member::Primary));
    assert!(!pair.is_running(Member::Secondary));
}
