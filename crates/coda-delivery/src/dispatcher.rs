// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background dispatch with bounded retry.
//!
//! Runs detached from the caller: outcomes are recorded in the store
//! (and logs), never surfaced to the sender's task.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use coda_config::DeliveryConfig;
use coda_core::{MessageStatus, StoreGateway};
use coda_egress::{IngressClient, MessageDispatch};

/// Delay before retrying after the `attempt`-th failure (1-based).
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms * 2u64.pow(attempt - 1))
}

/// Attempt delivery up to `max_attempts` times with exponential backoff.
///
/// On success the row is left as-is; the downstream processor owns all
/// later status transitions. On exhaustion the row is moved to `error`
/// with a user-facing reason so observers see the failure.
pub async fn dispatch_with_retry(
    store: Arc<dyn StoreGateway>,
    ingress: Arc<IngressClient>,
    config: DeliveryConfig,
    dispatch: MessageDispatch,
) {
    let mut last_error = String::new();
    for attempt in 1..=config.max_attempts {
        if attempt > 1 {
            tokio::time::sleep(backoff_delay(config.backoff_base_ms, attempt - 1)).await;
        }
        match ingress.send_message(&dispatch).await {
            Ok(ack) => {
                debug!(
                    thread_id = %dispatch.thread_id,
                    client_msg_id = %dispatch.client_msg_id,
                    attempt,
                    estimated_processing_time = ?ack.estimated_processing_time,
                    "message dispatched"
                );
                return;
            }
            Err(e) => {
                warn!(
                    thread_id = %dispatch.thread_id,
                    client_msg_id = %dispatch.client_msg_id,
                    attempt,
                    max_attempts = config.max_attempts,
                    error = %e,
                    "dispatch attempt failed"
                );
                last_error = e.to_string();
            }
        }
    }

    let reason = format!(
        "delivery failed after {} attempts: {last_error}",
        config.max_attempts
    );
    if let Err(e) = store
        .set_status(
            &dispatch.thread_id,
            &dispatch.client_msg_id,
            MessageStatus::Error,
            Some(&reason),
        )
        .await
    {
        error!(
            thread_id = %dispatch.thread_id,
            client_msg_id = %dispatch.client_msg_id,
            error = %e,
            "failed to record dispatch failure"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_base() {
        assert_eq!(backoff_delay(1000, 1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(1000, 2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(250, 1), Duration::from_millis(250));
        assert_eq!(backoff_delay(250, 3), Duration::from_millis(1000));
    }
}
