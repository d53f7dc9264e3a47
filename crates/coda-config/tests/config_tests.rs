// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for configuration loading and validation.

use coda_config::{load_config_from_str, CodaConfig};

#[test]
fn defaults_match_documented_constants() {
    let config = CodaConfig::default();

    assert_eq!(config.store.database_path, "coda.db");
    assert!(config.store.wal_mode);

    assert_eq!(config.ingress.base_url, "http://127.0.0.1:8787");
    assert!(config.ingress.signing_secret.is_none());
    assert!(config.ingress.auth_token.is_none());
    assert_eq!(config.ingress.request_timeout_secs, 30);

    assert_eq!(config.delivery.max_attempts, 3);
    assert_eq!(config.delivery.backoff_base_ms, 1000);
    assert_eq!(config.delivery.settle_delay_ms, 100);

    assert_eq!(config.sync.backfill_limit, 50);
    assert_eq!(config.sync.poll_interval_ms, 2000);
    assert_eq!(config.sync.health_interval_ms, 5000);
    assert_eq!(config.sync.seen_capacity, 1024);
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").unwrap();
    assert_eq!(config.delivery.max_attempts, 3);
    assert_eq!(config.sync.poll_interval_ms, 2000);
}

#[test]
fn toml_overrides_selected_fields_only() {
    let config = load_config_from_str(
        r#"
        [store]
        database_path = "/var/lib/coda/messages.db"

        [ingress]
        base_url = "https://processor.example.com"
        signing_secret = "topsecret"
        auth_token = "bearer-token"

        [delivery]
        max_attempts = 5
        "#,
    )
    .unwrap();

    assert_eq!(config.store.database_path, "/var/lib/coda/messages.db");
    assert!(config.store.wal_mode, "untouched field keeps its default");
    assert_eq!(config.ingress.base_url, "https://processor.example.com");
    assert_eq!(config.ingress.signing_secret.as_deref(), Some("topsecret"));
    assert_eq!(config.ingress.auth_token.as_deref(), Some("bearer-token"));
    assert_eq!(config.delivery.max_attempts, 5);
    assert_eq!(config.delivery.backoff_base_ms, 1000);
}

#[test]
fn unknown_section_is_rejected() {
    let result = load_config_from_str(
        r#"
        [webhooks]
        url = "https://example.com"
        "#,
    );
    assert!(result.is_err(), "unknown sections must be rejected");
}

#[test]
fn unknown_field_within_section_is_rejected() {
    let result = load_config_from_str(
        r#"
        [delivery]
        max_atempts = 3
        "#,
    );
    assert!(result.is_err(), "typo'd keys must be rejected");
}

#[test]
fn sync_section_overrides() {
    let config = load_config_from_str(
        r#"
        [sync]
        backfill_limit = 10
        poll_interval_ms = 500
        health_interval_ms = 1000
        seen_capacity = 64
        "#,
    )
    .unwrap();
    assert_eq!(config.sync.backfill_limit, 10);
    assert_eq!(config.sync.poll_interval_ms, 500);
    assert_eq!(config.sync.health_interval_ms, 1000);
    assert_eq!(config.sync.seen_capacity, 64);
}
