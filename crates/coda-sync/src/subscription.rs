// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push-path consumer: backfill then live change-feed consumption.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use coda_config::SyncConfig;
use coda_core::{ChangeEvent, CodaError, FeedError, MessageStatus, StoreGateway};

use crate::observer::ThreadObserver;
use crate::seen::SeenSet;

/// Health of the push channel, as observed by its consumer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelHealth {
    Live,
    /// Events were dropped; the consumer may have missed rows.
    Lagged,
    /// The feed producer is gone; no further events will arrive.
    Closed,
}

/// Live subscription to one thread's change feed.
///
/// Subscribes before backfilling, so rows written during the backfill
/// read are caught by the feed and suppressed by the shared [`SeenSet`]
/// rather than lost or duplicated.
pub struct ThreadSubscription {
    token: CancellationToken,
    health: watch::Receiver<ChannelHealth>,
}

impl ThreadSubscription {
    pub async fn start(
        store: Arc<dyn StoreGateway>,
        thread_id: &str,
        observer: Arc<dyn ThreadObserver>,
        seen: Arc<SeenSet>,
        config: &SyncConfig,
    ) -> Result<Self, CodaError> {
        let mut feed = store.subscribe(thread_id).await?;

        let backfill = store
            .thread_messages(thread_id, Some(config.backfill_limit))
            .await?;
        for msg in backfill {
            if msg.status == MessageStatus::Deleted {
                // Known but never surfaced; a later delete event is a no-op.
                seen.insert(msg.id);
                continue;
            }
            if seen.insert(msg.id) {
                observer.on_insert(msg);
            }
        }

        let (health_tx, health_rx) = watch::channel(ChannelHealth::Live);
        let token = CancellationToken::new();
        let task_token = token.clone();
        let thread = thread_id.to_string();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    event = feed.recv() => match event {
                        Ok(event) => deliver(event, &seen, observer.as_ref()),
                        Err(FeedError::Lagged(n)) => {
                            warn!(thread_id = %thread, dropped = n, "change feed lagged");
                            let _ = health_tx.send(ChannelHealth::Lagged);
                        }
                        Err(FeedError::Closed) => {
                            warn!(thread_id = %thread, "change feed closed");
                            let _ = health_tx.send(ChannelHealth::Closed);
                            break;
                        }
                    },
                }
            }
            debug!(thread_id = %thread, "subscription task stopped");
        });

        Ok(Self {
            token,
            health: health_rx,
        })
    }

    /// Last health state reported by the consumer task.
    pub fn health(&self) -> ChannelHealth {
        *self.health.borrow()
    }

    /// Stop consuming. Safe to call more than once.
    pub fn unsubscribe(&self) {
        self.token.cancel();
    }
}

impl Drop for ThreadSubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Route one feed event through the dedupe stage to the observer.
///
/// A row's first sighting is always surfaced as an insert, even when the
/// feed delivered it as an update; the feed does not guarantee that a
/// row's insert event is observed before its updates.
pub(crate) fn deliver(event: ChangeEvent, seen: &SeenSet, observer: &dyn ThreadObserver) {
    let msg = event.message();
    if msg.status == MessageStatus::Deleted {
        seen.insert(msg.id);
        observer.on_delete(event.message().clone());
        return;
    }
    match event {
        ChangeEvent::Insert(msg) => {
            if seen.insert(msg.id) {
                observer.on_insert(msg);
            }
        }
        ChangeEvent::Update(msg) => {
            if seen.insert(msg.id) {
                observer.on_insert(msg);
            } else {
                observer.on_update(msg);
            }
        }
        ChangeEvent::Delete(msg) => {
            seen.insert(msg.id);
            observer.on_delete(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use coda_core::{Message, MessageRole, MessageType};

    #[derive(Default)]
    struct Recorder {
        inserts: Mutex<Vec<i64>>,
        updates: Mutex<Vec<i64>>,
        deletes: Mutex<Vec<i64>>,
    }

    impl ThreadObserver for Recorder {
        fn on_insert(&self, message: Message) {
            self.inserts.lock().unwrap().push(message.id);
        }
        fn on_update(&self, message: Message) {
            self.updates.lock().unwrap().push(message.id);
        }
        fn on_delete(&self, message: Message) {
            self.deletes.lock().unwrap().push(message.id);
        }
    }

    fn msg(id: i64, status: MessageStatus) -> Message {
        Message {
            id,
            thread_id: "t1".into(),
            client_msg_id: format!("cm-{id}"),
            role: MessageRole::User,
            message_type: MessageType::UserRequest,
            agent_id: None,
            content: "hi".into(),
            content_json: None,
            status,
            turn_no: None,
            parent_id: None,
            processing_time_ms: None,
            error_message: None,
            model_used: None,
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn duplicate_insert_is_suppressed() {
        let seen = SeenSet::new(16);
        let obs = Recorder::default();
        deliver(ChangeEvent::Insert(msg(1, MessageStatus::Queued)), &seen, &obs);
        deliver(ChangeEvent::Insert(msg(1, MessageStatus::Queued)), &seen, &obs);
        assert_eq!(*obs.inserts.lock().unwrap(), vec![1]);
        assert!(obs.updates.lock().unwrap().is_empty());
    }

    #[test]
    fn first_sighting_as_update_becomes_insert() {
        let seen = SeenSet::new(16);
        let obs = Recorder::default();
        deliver(ChangeEvent::Update(msg(2, MessageStatus::Processing)), &seen, &obs);
        assert_eq!(*obs.inserts.lock().unwrap(), vec![2]);
        assert!(obs.updates.lock().unwrap().is_empty());

        deliver(ChangeEvent::Update(msg(2, MessageStatus::Error)), &seen, &obs);
        assert_eq!(*obs.updates.lock().unwrap(), vec![2]);
    }

    #[test]
    fn deleted_status_routes_to_on_delete() {
        let seen = SeenSet::new(16);
        let obs = Recorder::default();
        // A status update carrying the deleted state counts as a delete.
        deliver(ChangeEvent::Update(msg(3, MessageStatus::Deleted)), &seen, &obs);
        assert_eq!(*obs.deletes.lock().unwrap(), vec![3]);
        assert!(obs.inserts.lock().unwrap().is_empty());

        // The id is now known; a late insert event must not resurface it.
        deliver(ChangeEvent::Insert(msg(3, MessageStatus::Queued)), &seen, &obs);
        assert!(obs.inserts.lock().unwrap().is_empty());
    }
}
