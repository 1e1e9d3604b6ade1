//! Sliding-window admission control for chat requests
//!
//! Four scopes guard every inbound chat turn: global-hourly, global-daily,
//! per-client-hourly and per-client-daily. A denied request is never
//! recorded, so rejected retries cannot exhaust the budget on their own.
//! Counters live in process memory only; they do not survive a restart and
//! are not coordinated across instances.

use crate::config::RateLimitConfig;
use chrono::Utc;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

/// One hour, in seconds
pub const HOURLY_WINDOW_SECS: i64 = 3600;
/// One day, in seconds
pub const DAILY_WINDOW_SECS: i64 = 86_400;

/// Counts events that occurred within a trailing time window.
///
/// Timestamps are epoch seconds supplied by the caller, which keeps the
/// counter deterministic under test. Expired entries are purged lazily on
/// read; a counter that is never read grows without bound, but every live
/// scope here is read on each admission check.
#[derive(Debug, Default)]
pub struct SlidingWindowCounter {
    timestamps: Mutex<VecDeque<i64>>,
}

impl SlidingWindowCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event at `timestamp` (epoch seconds).
    pub fn record(&self, timestamp: i64) {
        self.timestamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(timestamp);
    }

    /// Number of events with `timestamp >= now - window_secs`, purging older
    /// entries as a side effect.
    pub fn count(&self, now: i64, window_secs: i64) -> usize {
        let mut timestamps = self
            .timestamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let cutoff = now - window_secs;
        timestamps.retain(|&ts| ts >= cutoff);
        timestamps.len()
    }
}

/// Point-in-time admission statistics
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitStats {
    pub enabled: bool,
    /// Current global hourly usage as `used/limit`
    pub global_hourly: String,
    /// Current global daily usage as `used/limit`
    pub global_daily: String,
    /// Distinct client keys seen since startup
    pub unique_clients: usize,
}

/// Admission controller composing the four sliding-window scopes.
///
/// Scopes are checked in order (global-hourly, global-daily, per-client-
/// hourly, per-client-daily) and the first violation denies without
/// recording anywhere, so a client-level violation never contaminates the
/// global counters. Per-client counters are created lazily and never
/// evicted; with heavy client churn the maps grow unboundedly, a known
/// limitation of this in-memory design.
pub struct RateLimiter {
    config: RateLimitConfig,
    /// Serializes admission decisions: the checks across all four scopes
    /// and the subsequent records form one critical section, so two racing
    /// requests cannot jointly exceed a limit.
    gate: Mutex<()>,
    global_hourly: SlidingWindowCounter,
    global_daily: SlidingWindowCounter,
    per_client_hourly: Mutex<HashMap<String, Arc<SlidingWindowCounter>>>,
    per_client_daily: Mutex<HashMap<String, Arc<SlidingWindowCounter>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        info!(
            "RateLimiter: enabled={}, global={}/{}, per-client={}/{} (sliding window)",
            config.enabled,
            config.global_hourly,
            config.global_daily,
            config.per_client_hourly,
            config.per_client_daily
        );
        Self {
            config,
            gate: Mutex::new(()),
            global_hourly: SlidingWindowCounter::new(),
            global_daily: SlidingWindowCounter::new(),
            per_client_hourly: Mutex::new(HashMap::new()),
            per_client_daily: Mutex::new(HashMap::new()),
        }
    }

    /// Decide admission for `client_key` at the current wall-clock time.
    pub fn allow(&self, client_key: &str) -> bool {
        self.allow_at(client_key, Utc::now().timestamp())
    }

    /// Decide admission at an explicit time (epoch seconds).
    pub fn allow_at(&self, client_key: &str, now: i64) -> bool {
        if !self.config.enabled {
            return true;
        }

        let _admission = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        if self.global_hourly.count(now, HOURLY_WINDOW_SECS) >= self.config.global_hourly {
            warn!("global hourly rate limit exceeded");
            return false;
        }
        if self.global_daily.count(now, DAILY_WINDOW_SECS) >= self.config.global_daily {
            warn!("global daily rate limit exceeded");
            return false;
        }

        let client_hourly = Self::client_counter(&self.per_client_hourly, client_key);
        let client_daily = Self::client_counter(&self.per_client_daily, client_key);

        if client_hourly.count(now, HOURLY_WINDOW_SECS) >= self.config.per_client_hourly {
            warn!(client = %client_key, "client hourly rate limit exceeded");
            return false;
        }
        if client_daily.count(now, DAILY_WINDOW_SECS) >= self.config.per_client_daily {
            warn!(client = %client_key, "client daily rate limit exceeded");
            return false;
        }

        // All scopes passed; only now does the request count against them.
        self.global_hourly.record(now);
        self.global_daily.record(now);
        client_hourly.record(now);
        client_daily.record(now);
        true
    }

    fn client_counter(
        map: &Mutex<HashMap<String, Arc<SlidingWindowCounter>>>,
        client_key: &str,
    ) -> Arc<SlidingWindowCounter> {
        map.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(client_key.to_string())
            .or_default()
            .clone()
    }

    /// Snapshot current usage for the stats endpoint.
    pub fn stats(&self) -> RateLimitStats {
        let now = Utc::now().timestamp();
        let unique_clients = self
            .per_client_hourly
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        RateLimitStats {
            enabled: self.config.enabled,
            global_hourly: format!(
                "{}/{}",
                self.global_hourly.count(now, HOURLY_WINDOW_SECS),
                self.config.global_hourly
            ),
            global_daily: format!(
                "{}/{}",
                self.global_daily.count(now, DAILY_WINDOW_SECS),
                self.config.global_daily
            ),
            unique_clients,
        }
    }

    /// Current global hourly count; used by tests to verify non-contamination.
    pub fn global_hourly_count(&self, now: i64) -> usize {
        self.global_hourly.count(now, HOURLY_WINDOW_SECS)
    }
}
