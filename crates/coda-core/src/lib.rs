// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Coda message delivery layer.
//!
//! This crate provides the domain types, the shared error type, the
//! time-sortable identifier generator, and the [`StoreGateway`] contract
//! that the rest of the workspace is built against. The store behind the
//! gateway is the single source of truth; this layer only ever appends
//! and updates rows, never deletes them.

pub mod error;
pub mod gateway;
pub mod ident;
pub mod types;

pub use error::CodaError;
pub use gateway::{FeedError, NewStoredMessage, StoreGateway, ThreadFeed};
pub use types::{
    ChangeEvent, HealthStatus, Message, MessageRole, MessageStatus, MessageType, NewMessage,
    SendReceipt,
};
