//! Tests for flag and environment resolution

use super::*;
use clap::Parser;
use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn test_defaults_when_nothing_set() {
    let config = Config::resolve(&Cli::default(), &env_from(&[])).unwrap();

    assert_eq!(config.port, 8081);
    assert_eq!(config.ready_delay, Duration::from_secs(10));
    assert_eq!(config.drain_timeout, Duration::from_secs(10));
    assert_eq!(config.shutdown_mode, ShutdownMode::Graceful);
    assert_eq!(config.db, DbConfig::default());
    assert!(!config.db.is_complete());
}

#[test]
fn test_env_sets_port_and_db() {
    let env = env_from(&[
        ("PORT", "9090"),
        ("DB_HOST", "mysql.default.svc"),
        ("DB_USER", "app"),
        ("DB_PASSWORD", "secret"),
        ("DB_NAME", "go-api"),
    ]);

    let config = Config::resolve(&Cli::default(), &env).unwrap();

    assert_eq!(config.port, 9090);
    assert_eq!(config.db.host, "mysql.default.svc");
    assert_eq!(config.db.user, "app");
    assert_eq!(config.db.password, "secret");
    assert_eq!(config.db.name, "go-api");
    assert!(config.db.is_complete());
}

#[test]
fn test_flag_overrides_env() {
    let env = env_from(&[("PORT", "9090"), ("DB_HOST", "from-env")]);
    let cli = Cli::parse_from(["probekit", "--port", "7070", "--db-host", "from-flag"]);

    let config = Config::resolve(&cli, &env).unwrap();

    assert_eq!(config.port, 7070);
    assert_eq!(config.db.host, "from-flag");
}

#[test]
fn test_empty_flag_falls_back_to_env() {
    let env = env_from(&[("DB_USER", "from-env")]);
    let cli = Cli::parse_from(["probekit", "--db-user", ""]);

    let config = Config::resolve(&cli, &env).unwrap();

    assert_eq!(config.db.user, "from-env");
}

#[test]
fn test_empty_env_port_uses_default() {
    let config = Config::resolve(&Cli::default(), &env_from(&[("PORT", "")])).unwrap();
    assert_eq!(config.port, DEFAULT_PORT);
}

/// The name flag must set the database name and leave the password alone
#[test]
fn test_db_name_flag_sets_name_not_password() {
    let env = env_from(&[("DB_PASSWORD", "secret"), ("DB_NAME", "env-name")]);
    let cli = Cli::parse_from(["probekit", "--db-name", "flag-name"]);

    let config = Config::resolve(&cli, &env).unwrap();

    assert_eq!(config.db.name, "flag-name");
    assert_eq!(config.db.password, "secret");
}

#[test]
fn test_invalid_port_is_an_error() {
    let err = Config::resolve(&Cli::default(), &env_from(&[("PORT", "eighty")])).unwrap_err();
    assert_eq!(
        err,
        ConfigError::InvalidPort {
            value: "eighty".to_string(),
            source_name: "PORT".to_string(),
        }
    );

    let cli = Cli::parse_from(["probekit", "--port", "70000"]);
    let err = Config::resolve(&cli, &env_from(&[])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidPort { .. }));
    assert!(err.to_string().contains("--port"));
}

#[test]
fn test_ready_delay_and_drain_timeout() {
    let env = env_from(&[("READY_DELAY", "3"), ("DRAIN_TIMEOUT", "30")]);
    let config = Config::resolve(&Cli::default(), &env).unwrap();

    assert_eq!(config.ready_delay, Duration::from_secs(3));
    assert_eq!(config.drain_timeout, Duration::from_secs(30));

    let err = Config::resolve(&Cli::default(), &env_from(&[("READY_DELAY", "-1")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSeconds { .. }));
}

#[test]
fn test_shutdown_mode() {
    let cli = Cli::parse_from(["probekit", "--shutdown-mode", "immediate"]);
    let config = Config::resolve(&cli, &env_from(&[])).unwrap();
    assert_eq!(config.shutdown_mode, ShutdownMode::Immediate);

    let env = env_from(&[("SHUTDOWN_MODE", "sometimes")]);
    let err = Config::resolve(&Cli::default(), &env).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidShutdownMode { .. }));
}

#[test]
fn test_server_timeouts_defaults() {
    let timeouts = ServerTimeouts::default();
    assert_eq!(timeouts.read, Duration::from_secs(5));
    assert_eq!(timeouts.write, Duration::from_secs(10));
    assert_eq!(timeouts.idle, Duration::from_secs(15));
    assert_eq!(timeouts.max_header_bytes, 1024 * 1024);
}
