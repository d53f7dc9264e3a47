// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The store contract: keyed read/write plus a subscribe-by-thread change feed.
//!
//! The durable store behind this trait is an external collaborator. All
//! components treat it as append/update-only: rows are never physically
//! deleted by this layer.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::error::CodaError;
use crate::types::{
    ChangeEvent, HealthStatus, Message, MessageRole, MessageStatus, MessageType,
};

/// Fields supplied by the caller when inserting a new message row.
///
/// The store assigns `id`, `created_at`, and `updated_at`.
#[derive(Debug, Clone)]
pub struct NewStoredMessage {
    pub thread_id: String,
    pub client_msg_id: String,
    pub role: MessageRole,
    pub message_type: MessageType,
    pub agent_id: Option<String>,
    pub content: String,
    pub content_json: Option<serde_json::Value>,
    pub status: MessageStatus,
    pub turn_no: Option<i64>,
    pub parent_id: Option<i64>,
}

/// Errors surfaced by [`ThreadFeed::recv`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    /// The consumer fell behind and `n` events were dropped.
    #[error("change feed lagged, {0} events dropped")]
    Lagged(u64),
    /// The feed's producer side is gone.
    #[error("change feed closed")]
    Closed,
}

/// A live change-feed subscription scoped to one thread.
///
/// Event ordering is not guaranteed to match write order; consumers must
/// tolerate observing a row's first event as an update.
pub struct ThreadFeed {
    rx: broadcast::Receiver<ChangeEvent>,
}

impl ThreadFeed {
    pub fn new(rx: broadcast::Receiver<ChangeEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the next row event on this thread.
    pub async fn recv(&mut self) -> Result<ChangeEvent, FeedError> {
        match self.rx.recv().await {
            Ok(event) => Ok(event),
            Err(broadcast::error::RecvError::Lagged(n)) => Err(FeedError::Lagged(n)),
            Err(broadcast::error::RecvError::Closed) => Err(FeedError::Closed),
        }
    }
}

/// Thin contract over the external durable store.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Insert a new message row, returning the stored row with its
    /// store-assigned id and timestamps.
    async fn insert_message(&self, msg: &NewStoredMessage) -> Result<Message, CodaError>;

    /// Read one message by its idempotency token within a thread.
    async fn message_by_client_id(
        &self,
        thread_id: &str,
        client_msg_id: &str,
    ) -> Result<Option<Message>, CodaError>;

    /// Messages of a thread in creation order. With a limit, the most
    /// recent `limit` messages, still returned in creation order.
    async fn thread_messages(
        &self,
        thread_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, CodaError>;

    /// Messages of a thread whose `updated_at` is strictly newer than the
    /// checkpoint, oldest first. An empty checkpoint returns everything.
    async fn messages_updated_since(
        &self,
        thread_id: &str,
        checkpoint: &str,
    ) -> Result<Vec<Message>, CodaError>;

    /// Update a message's lifecycle state by idempotency token.
    ///
    /// Passing `None` for `error_message` clears any stored reason.
    async fn set_status(
        &self,
        thread_id: &str,
        client_msg_id: &str,
        status: MessageStatus,
        error_message: Option<&str>,
    ) -> Result<(), CodaError>;

    /// Open a change-feed subscription scoped to one thread.
    async fn subscribe(&self, thread_id: &str) -> Result<ThreadFeed, CodaError>;

    /// Probe the store connection.
    async fn health_check(&self) -> Result<HealthStatus, CodaError>;
}
