//! Layered runtime configuration
//!
//! Hard-coded defaults, an optional TOML file, and `COLLOQUY_*` environment
//! overrides (double underscore separates nesting, e.g.
//! `COLLOQUY_SERVER__ADDR=0.0.0.0:8080`).

use crate::error::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub addr: String,
    /// Per-request frame channel capacity
    pub channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
            channel_capacity: 64,
        }
    }
}

/// Streaming settings for one chat turn
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Wall-clock bound on one streaming request, in seconds
    pub timeout_secs: u64,
    /// Inbound message cap, in characters
    pub message_max_chars: usize,
    /// Tool result cap before the truncation marker is applied, in characters
    pub tool_result_max_chars: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30 * 60,
            message_max_chars: 500,
            tool_result_max_chars: 1000,
        }
    }
}

impl StreamConfig {
    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Admission limits for the sliding-window rate limiter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Master switch; `false` admits every request
    pub enabled: bool,
    pub global_hourly: usize,
    pub global_daily: usize,
    pub per_client_hourly: usize,
    pub per_client_daily: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            global_hourly: 100,
            global_daily: 1000,
            per_client_hourly: 10,
            per_client_daily: 50,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColloquyConfig {
    pub server: ServerConfig,
    pub stream: StreamConfig,
    pub rate_limit: RateLimitConfig,
}

impl ColloquyConfig {
    /// Load configuration from defaults, an optional file, and the
    /// environment, in increasing precedence.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        builder = builder.add_source(Environment::with_prefix("COLLOQUY").separator("__"));
        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
