use std::path::PathBuf;

use super::*;
use crate::Error;
use crate::TestOptions;
use crate::UsageError;

fn argv(config: &NodeConfig) -> Vec<String> {
    config.to_argv("mongod")
}

fn count(
    argv: &[String],
    flag: &str,
) -> usize {
    argv.iter().filter(|a| a.as_str() == flag).count()
}

#[test]
fn test_standalone_binds_loopback_by_default() {
    let options = TestOptions::default();
    let config = NodeSpecBuilder::new(&options, 31000, "/data/db/a").build().unwrap();

    assert_eq!(
        argv(&config),
        vec![
            "mongod",
            "--port",
            "31000",
            "--dbpath",
            "/data/db/a",
            "--bind_ip",
            "127.0.0.1"
        ]
    );
    assert_eq!(config.role(), &NodeRole::Standalone);
    assert!(config.security().is_none());
}

#[test]
fn test_bind_all_interfaces_drops_bind_ip() {
    let options = TestOptions::default();
    let config = NodeSpecBuilder::new(&options, 31000, "/data/db/a")
        .overrides(NodeOverrides {
            bind_all_interfaces: true,
            ..Default::default()
        })
        .build()
        .unwrap();

    assert_eq!(count(&argv(&config), "--bind_ip"), 0);
    assert!(config.bind_all_interfaces());
}

#[test]
fn test_primary_gets_master_flag_and_default_oplog() {
    let options = TestOptions::default();
    let config = NodeSpecBuilder::new(&options, 31000, "/data/db/p")
        .role(NodeRole::Primary)
        .build()
        .unwrap();

    let argv = argv(&config);
    assert_eq!(count(&argv, "--master"), 1);
    assert_eq!(count(&argv, "--slave"), 0);
    assert_eq!(config.flags().value_of("oplogSize"), Some("40"));
}

#[test]
fn test_secondary_points_at_primary_port() {
    let options = TestOptions::default();
    let config = NodeSpecBuilder::new(&options, 31001, "/data/db/s")
        .role(NodeRole::secondary_of("127.0.0.1", 31000))
        .build()
        .unwrap();

    let argv = argv(&config);
    assert_eq!(count(&argv, "--master"), 0);
    assert_eq!(count(&argv, "--slave"), 1);
    assert_eq!(config.flags().value_of("source"), Some("127.0.0.1:31000"));
    assert_eq!(config.upstream_port(), Some(31000));
}

#[test]
fn test_standalone_has_no_oplog_size() {
    let options = TestOptions::default();
    let config = NodeSpecBuilder::new(&options, 31000, "/d").build().unwrap();

    assert!(!config.flags().contains("oplogSize"));
}

#[test]
fn test_caller_oplog_size_wins() {
    let options = TestOptions::default();
    let config = NodeSpecBuilder::new(&options, 31000, "/d")
        .role(NodeRole::Primary)
        .overrides(NodeOverrides::with_flags(
            ArgList::new().with_option("oplogSize", "10"),
        ))
        .build()
        .unwrap();

    assert_eq!(count(&argv(&config), "--oplogSize"), 1);
    assert_eq!(config.flags().value_of("oplogSize"), Some("10"));
}

#[test]
fn test_role_flags_are_not_overridable() {
    let options = TestOptions::default();
    for reserved in ["master", "slave", "source", "port", "dbpath", "bind_ip"] {
        let result = NodeSpecBuilder::new(&options, 31000, "/d")
            .overrides(NodeOverrides::with_flags(ArgList::new().with_flag(reserved)))
            .build();

        match result {
            Err(Error::Usage(UsageError::ReservedFlag { flag })) => assert_eq!(flag, reserved),
            other => panic!("expected reserved flag error for {reserved}, got {other:?}"),
        }
    }
}

#[test]
fn test_logical_only_keys_are_filtered() {
    let options = TestOptions::default();
    let config = NodeSpecBuilder::new(&options, 31000, "/d")
        .overrides(NodeOverrides::with_flags(
            ArgList::new()
                .with_flag("noReplSet")
                .with_option("binVersion", "latest")
                .with_option("setParameter", "enableTestCommands=1"),
        ))
        .build()
        .unwrap();

    let argv = argv(&config);
    assert_eq!(count(&argv, "--noReplSet"), 0);
    assert_eq!(count(&argv, "--binVersion"), 0);
    assert_eq!(count(&argv, "--setParameter"), 1);
}

#[test]
fn test_global_options_are_injected() {
    let mut options = TestOptions::default();
    options.storage.no_journal = true;
    options.security.key_file = Some(PathBuf::from("/etc/key"));
    options.security.use_ssl = true;
    options.security.use_x509 = true;

    let config = NodeSpecBuilder::new(&options, 31000, "/d").build().unwrap();
    let flags = config.flags();

    assert!(flags.contains("nojournal"));
    assert_eq!(flags.value_of("keyFile"), Some("/etc/key"));
    assert_eq!(flags.value_of("sslMode"), Some("requireSSL"));
    assert_eq!(flags.value_of("sslPEMKeyFile"), Some("jstests/libs/server.pem"));
    assert_eq!(flags.value_of("sslCAFile"), Some("jstests/libs/ca.pem"));
    assert!(flags.contains("sslWeakCertificateValidation"));
    assert_eq!(flags.value_of("clusterAuthMode"), Some("x509"));

    let security = config.security().unwrap();
    assert_eq!(security.mode, "requireSSL");
}

#[test]
fn test_caller_disabling_ssl_suppresses_certificate_flags() {
    let mut options = TestOptions::default();
    options.security.use_ssl = true;

    let overrides = ArgList::new().with_option("sslMode", "disabled");
    let config = NodeSpecBuilder::new(&options, 31000, "/d")
        .overrides(NodeOverrides::with_flags(overrides))
        .build()
        .unwrap();

    let argv = argv(&config);
    assert_eq!(count(&argv, "--sslMode"), 1);
    assert_eq!(config.flags().value_of("sslMode"), Some("disabled"));
    for flag in ["--sslPEMKeyFile", "--sslCAFile", "--sslWeakCertificateValidation"] {
        assert_eq!(count(&argv, flag), 0, "{flag} should be absent from {argv:?}");
    }
    assert!(config.security().is_none());
}

#[test]
fn test_injected_flags_are_never_duplicated() {
    let mut options = TestOptions::default();
    options.storage.no_journal = true;
    options.security.key_file = Some(PathBuf::from("/etc/key"));
    options.security.use_ssl = true;
    options.security.use_x509 = true;

    let overrides = ArgList::new()
        .with_flag("nojournal")
        .with_option("keyFile", "/other/key")
        .with_option("sslMode", "preferSSL")
        .with_option("sslPEMKeyFile", "/certs/mine.pem")
        .with_flag("sslWeakCertificateValidation")
        .with_option("clusterAuthMode", "keyFile");

    let config = NodeSpecBuilder::new(&options, 31000, "/d")
        .overrides(NodeOverrides::with_flags(overrides))
        .build()
        .unwrap();

    let argv = argv(&config);
    for flag in [
        "--nojournal",
        "--keyFile",
        "--sslMode",
        "--sslPEMKeyFile",
        "--sslCAFile",
        "--sslWeakCertificateValidation",
        "--clusterAuthMode",
    ] {
        assert_eq!(count(&argv, flag), 1, "{flag} should appear once in {argv:?}");
    }
    assert_eq!(config.flags().value_of("keyFile"), Some("/other/key"));
    assert_eq!(config.flags().value_of("clusterAuthMode"), Some("keyFile"));

    let security = config.security().unwrap();
    assert_eq!(security.mode, "preferSSL");
    assert_eq!(security.pem_key_file, PathBuf::from("/certs/mine.pem"));
    assert_eq!(security.ca_file, PathBuf::from("jstests/libs/ca.pem"));
}
