// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message delivery orchestration.
//!
//! Enforces the persist-before-dispatch ordering: a message is durably
//! written and verified readable before any network egress is attempted,
//! and dispatch failures can never invalidate the stored row.

pub mod dispatcher;
pub mod orchestrator;

pub use orchestrator::MessageWriter;
