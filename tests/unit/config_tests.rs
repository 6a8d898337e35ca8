//! Unit tests for configuration parsing and validation.

use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use task_relay::config::RelayConfig;
use task_relay::AppError;

#[test]
fn empty_toml_yields_the_defaults() {
    let config = RelayConfig::from_toml_str("").expect("parse");
    assert_eq!(config, RelayConfig::default());
    assert_eq!(
        config.bind_addr,
        "127.0.0.1:8080".parse::<SocketAddr>().expect("addr")
    );
    assert_eq!(config.queue_capacity, 100);
    assert_eq!(config.registry_capacity, 10);
    assert_eq!(config.ping_interval(), Duration::from_secs(10));
    assert_eq!(config.drain_interval(), Duration::from_secs(3));
}

#[test]
fn explicit_fields_override_the_defaults() {
    let raw = r#"
bind_addr = "0.0.0.0:9090"
queue_capacity = 16
registry_capacity = 2
ping_interval_seconds = 1
drain_seconds = 0
"#;
    let config = RelayConfig::from_toml_str(raw).expect("parse");
    assert_eq!(
        config.bind_addr,
        "0.0.0.0:9090".parse::<SocketAddr>().expect("addr")
    );
    assert_eq!(config.queue_capacity, 16);
    assert_eq!(config.registry_capacity, 2);
    assert_eq!(config.drain_interval(), Duration::ZERO);
}

#[test]
fn zero_capacities_fail_validation() {
    for raw in ["queue_capacity = 0", "registry_capacity = 0", "ping_interval_seconds = 0"] {
        let err = RelayConfig::from_toml_str(raw).expect_err("must fail validation");
        assert!(matches!(err, AppError::Config(_)), "raw {raw:?}");
    }
}

#[test]
fn invalid_toml_is_a_config_error() {
    let err = RelayConfig::from_toml_str("queue_capacity = \"lots\"").expect_err("must fail");
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn load_from_path_reads_a_file() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "queue_capacity = 7").expect("write");

    let config = RelayConfig::load_from_path(file.path()).expect("load");
    assert_eq!(config.queue_capacity, 7);
}

#[test]
fn load_from_missing_path_is_a_config_error() {
    let err = RelayConfig::load_from_path("/definitely/not/here.toml").expect_err("must fail");
    assert!(matches!(err, AppError::Config(_)));
}
