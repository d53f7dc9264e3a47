// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Polling fallback: periodic `updated_at`-checkpoint reads of a thread.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use coda_config::SyncConfig;
use coda_core::{MessageStatus, StoreGateway};

use crate::observer::ThreadObserver;
use crate::seen::SeenSet;

/// Interval-driven reader delivering thread changes through the same
/// observer shape as the push path.
///
/// Starts from an empty checkpoint: the first tick re-reads the whole
/// thread, relying on the shared [`SeenSet`] to suppress rows the
/// consumer already holds. That full first pass is what bridges the gap
/// after a push-channel failure.
pub struct ThreadPoller {
    token: CancellationToken,
}

impl ThreadPoller {
    pub fn start(
        store: Arc<dyn StoreGateway>,
        thread_id: &str,
        observer: Arc<dyn ThreadObserver>,
        seen: Arc<SeenSet>,
        config: &SyncConfig,
    ) -> Self {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let thread = thread_id.to_string();
        let poll_interval = Duration::from_millis(config.poll_interval_ms);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            let mut checkpoint = String::new();
            let mut initial = true;
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let rows = match store.messages_updated_since(&thread, &checkpoint).await {
                    Ok(rows) => rows,
                    Err(e) => {
                        warn!(thread_id = %thread, error = %e, "poll read failed");
                        continue;
                    }
                };

                for msg in rows {
                    if msg.updated_at > checkpoint {
                        checkpoint = msg.updated_at.clone();
                    }
                    if msg.status == MessageStatus::Deleted {
                        // Only surface deletions of rows the consumer holds.
                        if !seen.insert(msg.id) {
                            observer.on_delete(msg);
                        }
                        continue;
                    }
                    if seen.insert(msg.id) {
                        observer.on_insert(msg);
                    } else if !initial {
                        observer.on_update(msg);
                    }
                    // During the initial full pass an already-seen row is
                    // just known state being re-read, not a change.
                }
                initial = false;
            }
            debug!(thread_id = %thread, "poller task stopped");
        });

        Self { token }
    }

    /// Stop polling. Safe to call more than once.
    pub fn unsubscribe(&self) {
        self.token.cancel();
    }
}

impl Drop for ThreadPoller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
