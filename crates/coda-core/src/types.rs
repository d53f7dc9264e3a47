// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Coda workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Who authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    Agent,
    System,
    Internal,
}

/// What kind of conversational artifact a message is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    UserRequest,
    Plan,
    Work,
    Review,
    Final,
    Error,
    StatusUpdate,
}

/// Message lifecycle state.
///
/// Transitions are monotonic except for manual retry, which is the only
/// operation allowed to move a message backward (`Error` -> `Queued`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Persisted, dispatch not yet confirmed.
    Queued,
    /// Accepted by the downstream processor.
    Processing,
    /// Written by the downstream processor through the store contract;
    /// this layer never sets it.
    Completed,
    /// Dispatch attempts exhausted; recoverable via manual retry.
    Error,
    /// Logical deletion. The row is never physically removed; observers
    /// receive it as a delete event.
    Deleted,
}

/// The unit of conversation state.
///
/// `client_msg_id` is the only field safe to use for deduplication across
/// transport paths: the store-assigned `id` is unknown to the caller until
/// the write returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Store-assigned primary key.
    pub id: i64,
    /// Conversation scope; the partition key for subscriptions and polling.
    pub thread_id: String,
    /// Client-generated idempotency token, immutable after creation.
    pub client_msg_id: String,
    pub role: MessageRole,
    pub message_type: MessageType,
    /// Which downstream processing agent produced/owns the message.
    pub agent_id: Option<String>,
    /// Primary textual payload.
    pub content: String,
    /// Structured side-channel payload carrying caller context.
    pub content_json: Option<serde_json::Value>,
    pub status: MessageStatus,
    pub turn_no: Option<i64>,
    pub parent_id: Option<i64>,
    /// Post-hoc diagnostics, set by the downstream processor or the dispatcher.
    pub processing_time_ms: Option<i64>,
    pub error_message: Option<String>,
    pub model_used: Option<String>,
    /// ISO-8601 millisecond timestamps assigned by the store's clock.
    pub created_at: String,
    /// Basis for the polling fallback's "what changed" checkpoint.
    pub updated_at: String,
}

/// A row-level event from the store's change feed.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    Insert(Message),
    Update(Message),
    Delete(Message),
}

impl ChangeEvent {
    /// The row payload carried by the event.
    pub fn message(&self) -> &Message {
        match self {
            ChangeEvent::Insert(m) | ChangeEvent::Update(m) | ChangeEvent::Delete(m) => m,
        }
    }
}

/// Caller input to the persistence orchestrator.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub thread_id: String,
    /// Originating user id, recorded in `content_json`.
    pub author_id: String,
    pub content: String,
    /// Defaults to [`MessageRole::User`] when absent.
    pub role_hint: Option<MessageRole>,
    /// Defaults to [`MessageType::UserRequest`] when absent.
    pub message_type: Option<MessageType>,
    /// Free-form extras forwarded to the downstream processor.
    pub extra: Option<serde_json::Value>,
}

/// Returned by the orchestrator once the write is durably committed.
///
/// The caller holds this before any egress attempt is made; dispatch runs
/// detached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Store-assigned row id.
    pub message_id: i64,
    /// The idempotency token embedded in the row.
    pub client_msg_id: String,
}

/// Health reported by probes (egress endpoint, store connection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}
