//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the front
//! controller. All types derive Serde traits for deserialization from config
//! files, and every section has defaults so an empty file is a valid config.

use serde::{Deserialize, Serialize};

/// Root configuration for the application.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Path resolution defaults.
    pub routing: RoutingConfig,

    /// Session cookie settings.
    pub session: SessionConfig,

    /// Persistence settings.
    pub database: DatabaseConfig,

    /// Values exposed to every view.
    pub site: SiteConfig,

    /// Request and credential limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Defaults applied when a raw path does not name a handler or operation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Handler used when segment 0 is absent or unknown.
    pub default_handler: String,

    /// Operation used when segment 1 is absent or unknown.
    pub default_operation: String,

    /// Query parameter carrying the raw path (`/?url=posts/show/5`).
    pub path_param: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_handler: "pages".to_string(),
            default_operation: "index".to_string(),
            path_param: "url".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Seconds without a request before a session expires.
    pub idle_timeout_secs: u64,
    /// Seconds between sweeps of expired sessions.
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "front_session".to_string(),
            idle_timeout_secs: 1440,
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "front-router.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Shown in the layout title and navbar.
    pub site_name: String,

    /// Prefix for every generated link and redirect. No trailing slash.
    pub url_root: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "DogeMVC".to_string(),
            url_root: String::new(),
        }
    }
}

/// Security limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// Minimum accepted password length, in characters.
    pub min_password_len: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024,
            min_password_len: 6,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
