// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the `StoreGateway` contract.

use async_trait::async_trait;
use tracing::debug;

use coda_config::StoreConfig;
use coda_core::{
    ChangeEvent, CodaError, HealthStatus, Message, MessageStatus, NewStoredMessage, StoreGateway,
    ThreadFeed,
};

use crate::database::Database;
use crate::feed::FeedHub;
use crate::queries;

/// SQLite-backed message store with a per-thread change feed.
///
/// Feed events are published only after the corresponding write has
/// committed, so a message is never observable on the feed before it is
/// durably readable.
pub struct SqliteStore {
    db: Database,
    feeds: FeedHub,
}

impl SqliteStore {
    /// Open the store at the configured path, running migrations.
    pub async fn open(config: &StoreConfig) -> Result<Self, CodaError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        Ok(Self {
            db,
            feeds: FeedHub::new(),
        })
    }

    /// Checkpoint and flush before shutdown.
    pub async fn close(&self) -> Result<(), CodaError> {
        self.db.close().await
    }
}

#[async_trait]
impl StoreGateway for SqliteStore {
    async fn insert_message(&self, msg: &NewStoredMessage) -> Result<Message, CodaError> {
        let row = queries::messages::insert_message(&self.db, msg).await?;
        self.feeds
            .publish(&row.thread_id, ChangeEvent::Insert(row.clone()));
        debug!(
            thread_id = %row.thread_id,
            client_msg_id = %row.client_msg_id,
            id = row.id,
            "message inserted"
        );
        Ok(row)
    }

    async fn message_by_client_id(
        &self,
        thread_id: &str,
        client_msg_id: &str,
    ) -> Result<Option<Message>, CodaError> {
        queries::messages::message_by_client_id(&self.db, thread_id, client_msg_id).await
    }

    async fn thread_messages(
        &self,
        thread_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, CodaError> {
        queries::messages::thread_messages(&self.db, thread_id, limit).await
    }

    async fn messages_updated_since(
        &self,
        thread_id: &str,
        checkpoint: &str,
    ) -> Result<Vec<Message>, CodaError> {
        queries::messages::messages_updated_since(&self.db, thread_id, checkpoint).await
    }

    async fn set_status(
        &self,
        thread_id: &str,
        client_msg_id: &str,
        status: MessageStatus,
        error_message: Option<&str>,
    ) -> Result<(), CodaError> {
        let updated =
            queries::messages::set_status(&self.db, thread_id, client_msg_id, status, error_message)
                .await?;
        match updated {
            Some(row) => {
                let event = if row.status == MessageStatus::Deleted {
                    ChangeEvent::Delete(row.clone())
                } else {
                    ChangeEvent::Update(row.clone())
                };
                self.feeds.publish(thread_id, event);
                debug!(
                    thread_id,
                    client_msg_id,
                    status = %row.status,
                    "message status updated"
                );
                Ok(())
            }
            None => Err(CodaError::NotFound {
                kind: "message",
                id: client_msg_id.to_string(),
            }),
        }
    }

    async fn subscribe(&self, thread_id: &str) -> Result<ThreadFeed, CodaError> {
        Ok(self.feeds.subscribe(thread_id))
    }

    async fn health_check(&self) -> Result<HealthStatus, CodaError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coda_core::{MessageRole, MessageType};
    use tempfile::tempdir;

    async fn open_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StoreConfig {
            database_path: dir.path().join("store.db").to_str().unwrap().to_string(),
            wal_mode: true,
        };
        let store = SqliteStore::open(&config).await.unwrap();
        (store, dir)
    }

    fn new_msg(thread: &str, cmid: &str) -> NewStoredMessage {
        NewStoredMessage {
            thread_id: thread.to_string(),
            client_msg_id: cmid.to_string(),
            role: MessageRole::User,
            message_type: MessageType::UserRequest,
            agent_id: None,
            content: "hello".to_string(),
            content_json: None,
            status: MessageStatus::Queued,
            turn_no: None,
            parent_id: None,
        }
    }

    #[tokio::test]
    async fn insert_is_published_to_subscribers_after_commit() {
        let (store, _dir) = open_store().await;
        let mut feed = store.subscribe("t1").await.unwrap();

        let row = store.insert_message(&new_msg("t1", "cm-1")).await.unwrap();

        let event = feed.recv().await.unwrap();
        match event {
            ChangeEvent::Insert(m) => {
                assert_eq!(m.id, row.id);
                // The event carries the committed row; it must be readable.
                let read = store.message_by_client_id("t1", "cm-1").await.unwrap();
                assert!(read.is_some());
            }
            other => panic!("expected insert event, got {other:?}"),
        }
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn status_update_publishes_update_event() {
        let (store, _dir) = open_store().await;
        store.insert_message(&new_msg("t1", "cm-2")).await.unwrap();

        let mut feed = store.subscribe("t1").await.unwrap();
        store
            .set_status("t1", "cm-2", MessageStatus::Error, Some("boom"))
            .await
            .unwrap();

        match feed.recv().await.unwrap() {
            ChangeEvent::Update(m) => {
                assert_eq!(m.status, MessageStatus::Error);
                assert_eq!(m.error_message.as_deref(), Some("boom"));
            }
            other => panic!("expected update event, got {other:?}"),
        }
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn deleted_status_publishes_delete_event() {
        let (store, _dir) = open_store().await;
        store.insert_message(&new_msg("t1", "cm-3")).await.unwrap();

        let mut feed = store.subscribe("t1").await.unwrap();
        store
            .set_status("t1", "cm-3", MessageStatus::Deleted, None)
            .await
            .unwrap();

        assert!(matches!(
            feed.recv().await.unwrap(),
            ChangeEvent::Delete(m) if m.client_msg_id == "cm-3"
        ));

        // Logical deletion only; the row is still there.
        let row = store.message_by_client_id("t1", "cm-3").await.unwrap();
        assert_eq!(row.unwrap().status, MessageStatus::Deleted);
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn set_status_on_unknown_token_is_not_found() {
        let (store, _dir) = open_store().await;
        let result = store
            .set_status("t1", "cm-missing", MessageStatus::Queued, None)
            .await;
        assert!(matches!(result, Err(CodaError::NotFound { .. })));
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn health_check_reports_healthy() {
        let (store, _dir) = open_store().await;
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        store.close().await.unwrap();
    }
}
