// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persist-before-dispatch orchestration.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use coda_config::DeliveryConfig;
use coda_core::{
    ident, CodaError, Message, MessageRole, MessageStatus, MessageType, NewMessage,
    NewStoredMessage, SendReceipt, StoreGateway,
};
use coda_egress::{IngressClient, MessageDispatch};

use crate::dispatcher;

/// Orchestrates message sends: durable write first, verified readable,
/// then detached egress.
///
/// The receipt returned by [`persist_and_send`](Self::persist_and_send)
/// means the row is committed; it says nothing about delivery, which is
/// recorded asynchronously in the row's status.
pub struct MessageWriter {
    store: Arc<dyn StoreGateway>,
    ingress: Arc<IngressClient>,
    config: DeliveryConfig,
    tasks: TaskTracker,
}

impl MessageWriter {
    pub fn new(
        store: Arc<dyn StoreGateway>,
        ingress: Arc<IngressClient>,
        config: DeliveryConfig,
    ) -> Self {
        Self {
            store,
            ingress,
            config,
            tasks: TaskTracker::new(),
        }
    }

    /// Persist a new message and schedule its delivery.
    ///
    /// Returns once the write is committed and confirmed readable. A
    /// confirmed-missing row after a successful insert is a hard error;
    /// a verification *read* failure is logged and tolerated, since the
    /// insert itself already reported success.
    pub async fn persist_and_send(&self, new: NewMessage) -> Result<SendReceipt, CodaError> {
        let client_msg_id = ident::client_msg_id();
        let role = new.role_hint.unwrap_or(MessageRole::User);
        let message_type = new.message_type.unwrap_or(MessageType::UserRequest);

        let content_json = serde_json::json!({
            "client_msg_id": client_msg_id,
            "author_id": new.author_id,
            "role_hint": role,
            "extra": new.extra,
        });

        let row = self
            .store
            .insert_message(&NewStoredMessage {
                thread_id: new.thread_id.clone(),
                client_msg_id: client_msg_id.clone(),
                role,
                message_type,
                agent_id: None,
                content: new.content.clone(),
                content_json: Some(content_json),
                status: MessageStatus::Queued,
                turn_no: None,
                parent_id: None,
            })
            .await?;

        if self.config.settle_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
        }

        match self
            .store
            .message_by_client_id(&new.thread_id, &client_msg_id)
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Err(CodaError::WriteVerification(format!(
                    "message {client_msg_id} not readable after insert"
                )));
            }
            Err(e) => {
                warn!(
                    thread_id = %new.thread_id,
                    client_msg_id = %client_msg_id,
                    error = %e,
                    "verification read failed, proceeding on committed insert"
                );
            }
        }

        self.spawn_dispatch(MessageDispatch {
            thread_id: new.thread_id,
            client_msg_id: client_msg_id.clone(),
            text: new.content,
            role_hint: role.to_string(),
            message_type: message_type.to_string(),
            extra: new.extra,
        });

        info!(
            thread_id = %row.thread_id,
            client_msg_id = %client_msg_id,
            message_id = row.id,
            "message persisted, dispatch scheduled"
        );
        Ok(SendReceipt {
            message_id: row.id,
            client_msg_id,
        })
    }

    /// Re-arm a message stuck in `error`: reset it to `queued` and
    /// dispatch again under the same idempotency token.
    pub async fn retry_message(
        &self,
        thread_id: &str,
        client_msg_id: &str,
    ) -> Result<(), CodaError> {
        let row = self
            .store
            .message_by_client_id(thread_id, client_msg_id)
            .await?
            .ok_or_else(|| CodaError::NotFound {
                kind: "message",
                id: client_msg_id.to_string(),
            })?;

        self.store
            .set_status(thread_id, client_msg_id, MessageStatus::Queued, None)
            .await?;

        self.spawn_dispatch(dispatch_from_row(&row));
        info!(thread_id, client_msg_id, "manual retry scheduled");
        Ok(())
    }

    fn spawn_dispatch(&self, dispatch: MessageDispatch) {
        let store = Arc::clone(&self.store);
        let ingress = Arc::clone(&self.ingress);
        let config = self.config.clone();
        self.tasks.spawn(async move {
            dispatcher::dispatch_with_retry(store, ingress, config, dispatch).await;
        });
    }

    /// Stop accepting new dispatches and wait for in-flight ones to drain.
    pub async fn shutdown(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }
}

/// Rebuild dispatch parameters from a stored row, recovering the caller
/// context embedded in `content_json` at persist time.
fn dispatch_from_row(row: &Message) -> MessageDispatch {
    let extra = row
        .content_json
        .as_ref()
        .and_then(|v| v.get("extra"))
        .filter(|v| !v.is_null())
        .cloned();
    MessageDispatch {
        thread_id: row.thread_id.clone(),
        client_msg_id: row.client_msg_id.clone(),
        text: row.content.clone(),
        role_hint: row.role.to_string(),
        message_type: row.message_type.to_string(),
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_recovers_extra_from_content_json() {
        let row = Message {
            id: 1,
            thread_id: "t1".into(),
            client_msg_id: "cm-1".into(),
            role: MessageRole::User,
            message_type: MessageType::UserRequest,
            agent_id: None,
            content: "hello".into(),
            content_json: Some(serde_json::json!({
                "client_msg_id": "cm-1",
                "author_id": "u1",
                "extra": {"lesson": "piano"},
            })),
            status: MessageStatus::Error,
            turn_no: None,
            parent_id: None,
            processing_time_ms: None,
            error_message: Some("boom".into()),
            model_used: None,
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: "2026-01-01T00:00:00.000Z".into(),
        };
        let dispatch = dispatch_from_row(&row);
        assert_eq!(dispatch.client_msg_id, "cm-1");
        assert_eq!(dispatch.role_hint, "user");
        assert_eq!(dispatch.extra, Some(serde_json::json!({"lesson": "piano"})));
    }

    #[test]
    fn dispatch_tolerates_missing_context() {
        let row = Message {
            id: 2,
            thread_id: "t1".into(),
            client_msg_id: "cm-2".into(),
            role: MessageRole::Agent,
            message_type: MessageType::StatusUpdate,
            agent_id: Some("scheduler".into()),
            content: "done".into(),
            content_json: None,
            status: MessageStatus::Error,
            turn_no: None,
            parent_id: None,
            processing_time_ms: None,
            error_message: None,
            model_used: None,
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: "2026-01-01T00:00:00.000Z".into(),
        };
        let dispatch = dispatch_from_row(&row);
        assert_eq!(dispatch.extra, None);
        assert_eq!(dispatch.message_type, "status_update");
    }
}
