//! Configuration management for signal-relay

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Relay configuration
    #[serde(default)]
    pub relay: RelayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// HTTP bind address
    pub host: String,

    /// HTTP port for signaling and the client
    pub port: u16,

    /// Directory with the static web client
    #[serde(default = "default_static_root")]
    pub static_root: PathBuf,

    /// Serve the static web client as the fallback route
    #[serde(default = "default_serve_static")]
    pub serve_static: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_root: default_static_root(),
            serve_static: default_serve_static(),
        }
    }
}

/// Per-connection relay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Messages queued per peer before it is disconnected as too slow
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,

    /// WebSocket ping interval in seconds (0 disables)
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    /// Close a connection that sends nothing for this long (0 disables)
    #[serde(default)]
    pub idle_timeout_secs: u64,

    /// Largest accepted inbound message
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: default_outbox_capacity(),
            ping_interval_secs: default_ping_interval_secs(),
            idle_timeout_secs: 0,
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            relay: RelayConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.http.host.trim().is_empty() {
            return Err("HTTP host must not be empty".into());
        }

        if self.relay.outbox_capacity == 0 {
            return Err("Relay outbox_capacity must be non-zero".into());
        }

        if self.relay.max_message_bytes == 0 {
            return Err("Relay max_message_bytes must be non-zero".into());
        }

        if self.relay.idle_timeout_secs != 0
            && self.relay.ping_interval_secs != 0
            && self.relay.idle_timeout_secs <= self.relay.ping_interval_secs
        {
            return Err("Relay idle_timeout_secs must exceed ping_interval_secs".into());
        }

        if self.logging.level.parse::<log::LevelFilter>().is_err() {
            return Err(format!("Unknown log level: {}", self.logging.level).into());
        }

        Ok(())
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}

fn default_static_root() -> PathBuf {
    PathBuf::from("client/public")
}

fn default_serve_static() -> bool {
    true
}

fn default_outbox_capacity() -> usize { 64 }
fn default_ping_interval_secs() -> u64 { 30 }
fn default_max_message_bytes() -> usize { 64 * 1024 }

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_outbox() {
        let mut cfg = Config::default();
        cfg.relay.outbox_capacity = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_idle_timeout_must_exceed_ping() {
        let mut cfg = Config::default();
        cfg.relay.ping_interval_secs = 30;
        cfg.relay.idle_timeout_secs = 10;
        assert!(cfg.validate().is_err());
        cfg.relay.idle_timeout_secs = 90;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unknown_log_level() {
        let mut cfg = Config::default();
        cfg.logging.level = "loud".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [http]
            host = "127.0.0.1"
            port = 9000

            [relay]
            outbox_capacity = 8
            "#,
        )
        .unwrap();
        assert_eq!(cfg.http.port, 9000);
        assert_eq!(cfg.http.static_root.to_str(), Some("client/public"));
        assert_eq!(cfg.relay.outbox_capacity, 8);
        assert_eq!(cfg.relay.ping_interval_secs, 30);
        assert_eq!(cfg.relay.idle_timeout_secs, 0);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn toml_without_http_section_uses_default_http() {
        let cfg: Config = toml::from_str(
            r#"
            [relay]
            outbox_capacity = 4
            idle_timeout_secs = 120
            "#,
        )
        .unwrap();
        assert_eq!(cfg.http.host, "0.0.0.0");
        assert_eq!(cfg.http.port, 8080);
        assert!(cfg.http.serve_static);
        assert_eq!(cfg.relay.outbox_capacity, 4);
        assert_eq!(cfg.relay.idle_timeout_secs, 120);
        assert!(cfg.validate().is_ok());
    }
}
