use d_harness::LifecycleState;
use d_harness::ServerFixture;
use d_harness::Signal;
use serial_test::serial;
use tempfile::tempdir;

use crate::common::fake_options;
use crate::common::harness;

#[tokio::test]
#[serial]
async fn test_server_start_stop_real_process() {
    let dir = tempdir().unwrap();
    let env = harness(fake_options(dir.path(), "#!/bin/sh\n"));
    let mut server = ServerFixture::standalone(&env, "lifecycle").unwrap();

    server.start(false).await.unwrap();
    assert!(server.is_running());

    let code = server.stop(Signal::SIGTERM).await.unwrap();
    assert_eq!(code, Some(143));
    assert_eq!(server.state(), LifecycleState::Stopped);

    assert_eq!(server.stop(Signal::SIGTERM).await.unwrap(), None);
}

#[tokio::test]
#[serial]
async fn test_stale_lock_cleared_before_spawn() {
    let dir = tempdir().unwrap();
    let env = harness(fake_options(dir.path(), "#!/bin/sh\n"));
    let mut server = ServerFixture::standalone(&env, "crashed").unwrap();
    std::fs::create_dir_all(server.data_dir()).unwrap();
    std::fs::write(server.lock_file(), b"12345\n").unwrap();
    std::fs::write(server.data_dir().join("journal"), b"keep").unwrap();

    server.start(true).await.unwrap();

    assert!(!server.lock_file().exists());
    assert!(server.data_dir().join("journal").exists());
    server.stop(Signal::SIGKILL).await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_fresh_start_wipes_previous_run() {
    let dir = tempdir().unwrap();
    let env = harness(fake_options(dir.path(), "#!/bin/sh\n"));
    let mut server = ServerFixture::standalone(&env, "fresh").unwrap();
    std::fs::create_dir_all(server.data_dir()).unwrap();
    std::fs::write(server.data_dir().join("old.ns"), b"x").unwrap();

    server.start(false).await.unwrap();

    assert_eq!(std::fs::read_dir(server.data_dir()).unwrap().count(), 0);
    server.terminate().await.unwrap();
}
