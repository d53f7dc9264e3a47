// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. The [`Database`] struct IS the single writer: query modules
//! accept `&Database` and go through `connection().call()`. Do NOT create
//! additional connection instances for writes.

use coda_core::CodaError;
use tracing::debug;

/// Handle to the single-writer SQLite connection.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, run migrations, and apply
    /// connection PRAGMAs.
    ///
    /// Migrations run on a short-lived blocking connection before the
    /// long-lived writer connection is established.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, CodaError> {
        let migration_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), CodaError> {
            let mut conn =
                rusqlite::Connection::open(&migration_path).map_err(|e| CodaError::Store {
                    source: Box::new(e),
                })?;
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")
                    .map_err(|e| CodaError::Store {
                        source: Box::new(e),
                    })?;
            }
            crate::migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| CodaError::Internal(format!("migration task panicked: {e}")))??;

        // `Connection::open` yields a plain rusqlite error, unlike `call()`.
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| CodaError::Store {
                source: Box::new(e),
            })?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying single-writer connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and flush pending writes.
    pub async fn close(&self) -> Result<(), CodaError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Adapt a tokio-rusqlite error into the workspace error type.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> CodaError {
    CodaError::Store {
        source: Box::new(e),
    }
}
