// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Coda delivery layer.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, typed message
//! queries, and a per-thread change feed published after each committed
//! write. [`SqliteStore`] implements the `StoreGateway` contract.

pub mod database;
pub mod feed;
pub mod gateway;
pub mod migrations;
pub mod queries;

pub use database::Database;
pub use gateway::SqliteStore;
