use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the RPC server, the broker core and logging.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    pub server: ServerSettings,
    pub broker: BrokerSettings,
    pub logging: LoggingSettings,
}

/// Configuration settings for the server.
///
/// Defines the host and port the broker's RPC endpoint binds to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration settings for the broker.
///
/// Controls outbound call timeouts and dead-letter retention.
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerSettings {
    /// Upper bound for a single callback into a subscriber. `0` disables it.
    pub delivery_timeout_ms: u64,
    /// Per-subscriber dead-letter capacity. `0` means unbounded.
    pub max_dead_letters: usize,
    /// Put a dead-letter batch back in the queue when flushing it fails.
    pub requeue_failed_flush: bool,
}

impl BrokerSettings {
    pub fn delivery_timeout(&self) -> Option<Duration> {
        (self.delivery_timeout_ms > 0).then(|| Duration::from_millis(self.delivery_timeout_ms))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Unset fields fall back to defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub delivery_timeout_ms: Option<u64>,
    pub max_dead_letters: Option<usize>,
    pub requeue_failed_flush: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

/// Provides default values for each section.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            delivery_timeout_ms: 5000,
            max_dead_letters: 10_000,
            requeue_failed_flush: true,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl PartialSettings {
    /// Fill every missing value from `Settings::default()`.
    pub fn merge_with_defaults(self) -> Settings {
        let default = Settings::default();
        let server = self.server;
        let broker = self.broker;
        let logging = self.logging;

        Settings {
            server: ServerSettings {
                host: server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(default.server.host),
                port: server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(default.server.port),
            },
            broker: BrokerSettings {
                delivery_timeout_ms: broker
                    .as_ref()
                    .and_then(|b| b.delivery_timeout_ms)
                    .unwrap_or(default.broker.delivery_timeout_ms),
                max_dead_letters: broker
                    .as_ref()
                    .and_then(|b| b.max_dead_letters)
                    .unwrap_or(default.broker.max_dead_letters),
                requeue_failed_flush: broker
                    .as_ref()
                    .and_then(|b| b.requeue_failed_flush)
                    .unwrap_or(default.broker.requeue_failed_flush),
            },
            logging: LoggingSettings {
                level: logging
                    .and_then(|l| l.level)
                    .unwrap_or(default.logging.level),
            },
        }
    }
}
