// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread synchronization: push change-feed consumption with a polling
//! fallback.
//!
//! Both paths feed one [`ThreadObserver`] through a shared dedupe stage,
//! so a consumer sees exactly one `on_insert` per message no matter
//! which path delivered it.

pub mod failover;
pub mod observer;
pub mod poller;
pub mod seen;
pub mod subscription;

pub use failover::FailoverController;
pub use observer::ThreadObserver;
pub use poller::ThreadPoller;
pub use seen::SeenSet;
pub use subscription::{ChannelHealth, ThreadSubscription};
