// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./coda.toml` > `~/.config/coda/coda.toml` >
//! `/etc/coda/coda.toml` with environment variable overrides via the
//! `CODA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CodaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/coda/coda.toml` (system-wide)
/// 3. `~/.config/coda/coda.toml` (user XDG config)
/// 4. `./coda.toml` (local directory)
/// 5. `CODA_*` environment variables
pub fn load_config() -> Result<CodaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CodaConfig::default()))
        .merge(Toml::file("/etc/coda/coda.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("coda/coda.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("coda.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<CodaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CodaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CodaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CodaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `CODA_INGRESS_BASE_URL` must map to
/// `ingress.base_url`, not `ingress.base.url`.
fn env_provider() -> Env {
    Env::prefixed("CODA_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("store_", "store.", 1)
            .replacen("ingress_", "ingress.", 1)
            .replacen("delivery_", "delivery.", 1)
            .replacen("sync_", "sync.", 1);
        mapped.into()
    })
}
