//! Service configuration
//!
//! Every setting can come from a command line flag or an environment
//! variable. A non-empty flag wins; an empty value on either side is treated
//! as unset and falls through to the default.

use crate::server::shutdown::ShutdownMode;
use clap::Parser;
use std::time::Duration;
use thiserror::Error;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8081;

/// Default warm-up before the readiness probe reports ready
pub const DEFAULT_READY_DELAY: Duration = Duration::from_secs(10);

/// Default time allowed for in-flight connections to finish on shutdown
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid port {value:?} from {source_name}")]
    InvalidPort { value: String, source_name: String },

    #[error("invalid number of seconds {value:?} from {source_name}")]
    InvalidSeconds { value: String, source_name: String },

    #[error("invalid shutdown mode {value:?} from {source_name}, expected graceful or immediate")]
    InvalidShutdownMode { value: String, source_name: String },
}

/// Command line flags
///
/// All values are kept as raw strings so that an empty flag can fall back to
/// the environment instead of overriding it.
#[derive(Debug, Default, Clone, Parser)]
#[command(
    name = "probekit",
    about = "HTTP test service for Kubernetes probes and metrics"
)]
pub struct Cli {
    /// Service port
    #[arg(long)]
    pub port: Option<String>,

    /// Database host
    #[arg(long = "db-host")]
    pub db_host: Option<String>,

    /// Database user
    #[arg(long = "db-user")]
    pub db_user: Option<String>,

    /// Database password
    #[arg(long = "db-password")]
    pub db_password: Option<String>,

    /// Database name
    #[arg(long = "db-name")]
    pub db_name: Option<String>,

    /// Seconds to wait before reporting ready
    #[arg(long = "ready-delay")]
    pub ready_delay: Option<String>,

    /// What to do on SIGTERM/SIGINT: graceful or immediate
    #[arg(long = "shutdown-mode")]
    pub shutdown_mode: Option<String>,

    /// Seconds to wait for in-flight connections during graceful shutdown
    #[arg(long = "drain-timeout")]
    pub drain_timeout: Option<String>,
}

/// Connection details for the album store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
}

impl DbConfig {
    /// All four settings are present
    pub fn is_complete(&self) -> bool {
        !self.host.is_empty()
            && !self.user.is_empty()
            && !self.password.is_empty()
            && !self.name.is_empty()
    }
}

/// Per-connection limits enforced by the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerTimeouts {
    pub read: Duration,
    pub write: Duration,
    pub idle: Duration,
    pub max_header_bytes: usize,
}

impl Default for ServerTimeouts {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(5),
            write: Duration::from_secs(10),
            idle: Duration::from_secs(15),
            max_header_bytes: 1 << 20,
        }
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub db: DbConfig,
    pub ready_delay: Duration,
    pub shutdown_mode: ShutdownMode,
    pub drain_timeout: Duration,
    pub timeouts: ServerTimeouts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            db: DbConfig::default(),
            ready_delay: DEFAULT_READY_DELAY,
            shutdown_mode: ShutdownMode::default(),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            timeouts: ServerTimeouts::default(),
        }
    }
}

/// A raw setting and where it came from, for error messages
struct Setting {
    value: String,
    source_name: String,
}

/// Pick the flag if non-empty, else the environment variable if non-empty
fn pick(
    flag: Option<&str>,
    flag_name: &str,
    env: &dyn Fn(&str) -> Option<String>,
    env_name: &str,
) -> Option<Setting> {
    if let Some(v) = flag.filter(|v| !v.is_empty()) {
        return Some(Setting {
            value: v.to_string(),
            source_name: format!("--{}", flag_name),
        });
    }
    env(env_name).filter(|v| !v.is_empty()).map(|value| Setting {
        value,
        source_name: env_name.to_string(),
    })
}

fn parse_seconds(setting: Setting) -> Result<Duration, ConfigError> {
    setting
        .value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::InvalidSeconds {
            value: setting.value,
            source_name: setting.source_name,
        })
}

impl Config {
    /// Resolve configuration from flags and an environment lookup
    ///
    /// The lookup is injected so tests don't touch the process environment.
    pub fn resolve(cli: &Cli, env: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(setting) = pick(cli.port.as_deref(), "port", env, "PORT") {
            config.port = setting
                .value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort {
                    value: setting.value.clone(),
                    source_name: setting.source_name.clone(),
                })?;
        }

        let text = |flag: &Option<String>, flag_name: &str, env_name: &str| {
            pick(flag.as_deref(), flag_name, env, env_name)
                .map(|s| s.value)
                .unwrap_or_default()
        };
        config.db = DbConfig {
            host: text(&cli.db_host, "db-host", "DB_HOST"),
            user: text(&cli.db_user, "db-user", "DB_USER"),
            password: text(&cli.db_password, "db-password", "DB_PASSWORD"),
            name: text(&cli.db_name, "db-name", "DB_NAME"),
        };

        if let Some(setting) =
            pick(cli.ready_delay.as_deref(), "ready-delay", env, "READY_DELAY")
        {
            config.ready_delay = parse_seconds(setting)?;
        }

        if let Some(setting) = pick(
            cli.shutdown_mode.as_deref(),
            "shutdown-mode",
            env,
            "SHUTDOWN_MODE",
        ) {
            config.shutdown_mode = setting.value.parse().map_err(|_| {
                ConfigError::InvalidShutdownMode {
                    value: setting.value.clone(),
                    source_name: setting.source_name.clone(),
                }
            })?;
        }

        if let Some(setting) = pick(
            cli.drain_timeout.as_deref(),
            "drain-timeout",
            env,
            "DRAIN_TIMEOUT",
        ) {
            config.drain_timeout = parse_seconds(setting)?;
        }

        Ok(config)
    }

    /// Resolve from the real command line and process environment
    pub fn load() -> Result<Self, ConfigError> {
        let cli = Cli::parse();
        Self::resolve(&cli, &|name| std::env::var(name).ok())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
