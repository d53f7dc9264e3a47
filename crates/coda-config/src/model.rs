// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Coda delivery layer.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Coda configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CodaConfig {
    /// Durable message store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Ingress webhook endpoint settings.
    #[serde(default)]
    pub ingress: IngressConfig,

    /// Orchestrator and dispatcher settings.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Synchronization and polling fallback settings.
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Durable message store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Whether to enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "coda.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Ingress webhook endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IngressConfig {
    /// Base URL of the downstream processor, without the webhook path.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Shared secret for HMAC-SHA256 envelope signing. `None` disables egress.
    #[serde(default)]
    pub signing_secret: Option<String>,

    /// Optional bearer token for recipient-side authorization.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            signing_secret: None,
            auth_token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8787".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Orchestrator and background dispatcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Egress attempt budget per message.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base of the exponential backoff between attempts, in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Delay before the post-insert verification read, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_settle_delay_ms() -> u64 {
    100
}

/// Synchronization client, polling fallback, and failover configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Number of most-recent messages read during initial backfill.
    #[serde(default = "default_backfill_limit")]
    pub backfill_limit: i64,

    /// Polling fallback tick interval, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Push-channel health check interval, in milliseconds.
    #[serde(default = "default_health_interval_ms")]
    pub health_interval_ms: u64,

    /// Capacity of the per-consumer seen-set LRU.
    #[serde(default = "default_seen_capacity")]
    pub seen_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            backfill_limit: default_backfill_limit(),
            poll_interval_ms: default_poll_interval_ms(),
            health_interval_ms: default_health_interval_ms(),
            seen_capacity: default_seen_capacity(),
        }
    }
}

fn default_backfill_limit() -> i64 {
    50
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_health_interval_ms() -> u64 {
    5000
}

fn default_seen_capacity() -> usize {
    1024
}
