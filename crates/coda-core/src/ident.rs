// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-sortable unique identifier generation.
//!
//! Produces 26-character Crockford base32 strings: a 48-bit millisecond
//! timestamp prefix (10 characters) followed by 80 random bits
//! (16 characters). Two ids generated at least 1ms apart sort in call
//! order; the random suffix makes collisions negligible at per-thread
//! message volume.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;

/// Crockford base32 alphabet (no I, L, O, U).
const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Length of every generated identifier.
pub const CLIENT_MSG_ID_LEN: usize = 26;

/// Generate a new idempotency token for a message.
pub fn client_msg_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut randomness = [0u8; 10];
    rand::thread_rng().fill_bytes(&mut randomness);
    encode(millis, &randomness)
}

/// Encode a millisecond timestamp and 80 bits of entropy as a 26-char id.
fn encode(millis: u64, randomness: &[u8; 10]) -> String {
    let mut out = [0u8; CLIENT_MSG_ID_LEN];

    // Low 48 bits of the timestamp, big-endian across 10 base32 digits.
    let mut ts = millis & 0xFFFF_FFFF_FFFF;
    for slot in out[..10].iter_mut().rev() {
        *slot = ALPHABET[(ts & 0x1F) as usize];
        ts >>= 5;
    }

    // 80 random bits across the remaining 16 digits.
    let mut acc: u128 = 0;
    for byte in randomness {
        acc = (acc << 8) | u128::from(*byte);
    }
    for slot in out[10..].iter_mut().rev() {
        *slot = ALPHABET[(acc & 0x1F) as usize];
        acc >>= 5;
    }

    out.iter().map(|&b| b as char).collect()
}
