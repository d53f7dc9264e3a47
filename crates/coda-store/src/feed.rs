// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-thread change-feed fan-out.
//!
//! One broadcast channel per thread id; events are published only after
//! the corresponding row write has committed on the writer thread.

use coda_core::{ChangeEvent, ThreadFeed};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::trace;

/// Buffered events per thread before slow consumers start lagging.
const FEED_CAPACITY: usize = 256;

/// Registry of per-thread broadcast senders.
pub struct FeedHub {
    senders: DashMap<String, broadcast::Sender<ChangeEvent>>,
}

impl FeedHub {
    pub fn new() -> Self {
        Self {
            senders: DashMap::new(),
        }
    }

    /// Open a subscription for one thread, creating its channel on first use.
    pub fn subscribe(&self, thread_id: &str) -> ThreadFeed {
        let tx = self
            .senders
            .entry(thread_id.to_string())
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0);
        ThreadFeed::new(tx.subscribe())
    }

    /// Publish a row event to a thread's subscribers, if any.
    pub fn publish(&self, thread_id: &str, event: ChangeEvent) {
        if let Some(tx) = self.senders.get(thread_id) {
            // A send error just means nobody is listening right now.
            let delivered = tx.send(event).unwrap_or(0);
            trace!(thread_id, delivered, "change event published");
        }
    }
}

impl Default for FeedHub {
    fn default() -> Self {
        Self::new()
    }
}
