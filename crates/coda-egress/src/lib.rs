// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Egress client for the signed ingress webhook protocol.
//!
//! Builds HMAC-SHA256-signed JSON envelopes and POSTs them to the
//! downstream processor's ingress endpoint. The only outbound network
//! actor in the delivery layer besides the store itself.

pub mod client;
pub mod envelope;

pub use client::{IngressAck, IngressClient, MessageDispatch};
pub use envelope::{EnvelopePayload, IngressEnvelope, SPEC_VERSION};
