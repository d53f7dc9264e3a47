// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Coda delivery layer.

use thiserror::Error;

/// The primary error type used across all Coda crates.
#[derive(Debug, Error)]
pub enum CodaError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Store backend errors (connection, query failure, serialization).
    #[error("store error: {source}")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Egress delivery errors (HTTP failure, non-2xx ingress response).
    #[error("egress error: {message}")]
    Egress {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An insert reported success but the row was confirmed absent on read-back.
    ///
    /// Distinct from [`CodaError::Store`] so callers can tell "never written"
    /// from "written but unconfirmed".
    #[error("write verification failed: {0}")]
    WriteVerification(String),

    /// A referenced entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
