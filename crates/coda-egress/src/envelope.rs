// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingress-protocol envelope construction and signing.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// Protocol version carried in every envelope.
pub const SPEC_VERSION: &str = "1.0";

/// Webhook path on the recipient, shared by POST delivery and the GET
/// health probe.
pub const INGRESS_PATH: &str = "/api/webhook/ingress";

/// Envelope payload: the message text plus free-form extras.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvelopePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// One signed outbound event.
///
/// The same shape carries both `message.created` deliveries and generic
/// events (`blackboard_update`, `task_update`, ...), distinguished by
/// `event_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngressEnvelope {
    pub spec_version: String,
    pub event_type: String,
    pub thread_id: String,
    /// 26-char sortable idempotency token addressing retries.
    pub client_msg_id: String,
    pub role_hint: String,
    pub message_type: String,
    pub payload: EnvelopePayload,
    pub priority: String,
    /// Epoch milliseconds at envelope construction.
    pub timestamp: i64,
}

impl IngressEnvelope {
    /// Envelope for a newly persisted user message.
    pub fn message(
        thread_id: &str,
        client_msg_id: &str,
        role_hint: &str,
        message_type: &str,
        payload: EnvelopePayload,
    ) -> Self {
        Self {
            spec_version: SPEC_VERSION.to_string(),
            event_type: "message.created".to_string(),
            thread_id: thread_id.to_string(),
            client_msg_id: client_msg_id.to_string(),
            role_hint: role_hint.to_string(),
            message_type: message_type.to_string(),
            payload,
            priority: "normal".to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Envelope for a generic event sharing the same wire shape.
    pub fn event(
        event_type: &str,
        thread_id: &str,
        client_msg_id: &str,
        payload: EnvelopePayload,
    ) -> Self {
        Self {
            spec_version: SPEC_VERSION.to_string(),
            event_type: event_type.to_string(),
            thread_id: thread_id.to_string(),
            client_msg_id: client_msg_id.to_string(),
            role_hint: "auto".to_string(),
            message_type: "status_update".to_string(),
            payload,
            priority: "normal".to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Hex HMAC-SHA256 of the serialized envelope body.
///
/// Transmitted in the `X-Signature` request header; the recipient
/// recomputes it over the raw body bytes.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}
