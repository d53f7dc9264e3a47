// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push-to-poll failover supervision.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use coda_config::SyncConfig;
use coda_core::StoreGateway;

use crate::observer::ThreadObserver;
use crate::poller::ThreadPoller;
use crate::seen::SeenSet;
use crate::subscription::{ChannelHealth, ThreadSubscription};

/// Supervises one thread's sync path: push subscription while healthy,
/// polling fallback once the channel lags or closes.
///
/// Both paths share one [`SeenSet`], so the poller's full first pass
/// re-delivers only what the subscription missed. Failover is one-way;
/// the poller is the terminal path for the controller's lifetime.
pub struct FailoverController {
    token: CancellationToken,
}

impl FailoverController {
    pub async fn start(
        store: Arc<dyn StoreGateway>,
        thread_id: &str,
        observer: Arc<dyn ThreadObserver>,
        config: SyncConfig,
    ) -> Self {
        let token = CancellationToken::new();
        let seen = Arc::new(SeenSet::new(config.seen_capacity));

        let subscription = ThreadSubscription::start(
            Arc::clone(&store),
            thread_id,
            Arc::clone(&observer),
            Arc::clone(&seen),
            &config,
        )
        .await;

        let task_token = token.clone();
        let thread = thread_id.to_string();
        tokio::spawn(async move {
            let sub = match subscription {
                Ok(sub) => sub,
                Err(e) => {
                    warn!(
                        thread_id = %thread,
                        error = %e,
                        "push subscription unavailable, starting poller"
                    );
                    run_poller(store, &thread, observer, seen, &config, task_token).await;
                    return;
                }
            };

            let mut interval =
                tokio::time::interval(Duration::from_millis(config.health_interval_ms));
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        sub.unsubscribe();
                        return;
                    }
                    _ = interval.tick() => {}
                }
                match sub.health() {
                    ChannelHealth::Live => {}
                    state => {
                        warn!(
                            thread_id = %thread,
                            state = ?state,
                            "push channel degraded, failing over to polling"
                        );
                        sub.unsubscribe();
                        run_poller(store, &thread, observer, seen, &config, task_token).await;
                        return;
                    }
                }
            }
        });

        info!(thread_id, "failover controller started");
        Self { token }
    }

    /// Tear down whichever path is active. Safe to call more than once.
    pub fn unsubscribe(&self) {
        self.token.cancel();
    }
}

impl Drop for FailoverController {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run_poller(
    store: Arc<dyn StoreGateway>,
    thread_id: &str,
    observer: Arc<dyn ThreadObserver>,
    seen: Arc<SeenSet>,
    config: &SyncConfig,
    token: CancellationToken,
) {
    let poller = ThreadPoller::start(store, thread_id, observer, seen, config);
    token.cancelled().await;
    poller.unsubscribe();
}
