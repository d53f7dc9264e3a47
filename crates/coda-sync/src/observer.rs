// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use coda_core::Message;

/// Consumer-side callbacks for thread changes.
///
/// The same shape is driven by the push subscription, the polling
/// fallback, and the failover controller, so consumers implement it
/// once and never care which path delivered an event.
pub trait ThreadObserver: Send + Sync {
    /// A message seen for the first time, backfilled or live.
    fn on_insert(&self, message: Message);

    /// A known message whose row changed (status, diagnostics).
    fn on_update(&self, message: Message);

    /// A message that entered the logically-deleted state.
    fn on_delete(&self, message: Message);
}
