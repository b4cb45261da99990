// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

// Symmetric key derivation for the quota service envelope.

use std::fmt;

use sha2::{Digest, Sha256};
use zeroize::Zeroize;

/// Length of the AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// A 256-bit symmetric key.
///
/// Immutable once derived. `Debug` never prints the key material and the
/// bytes are wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Derive the envelope key from an operator secret.
///
/// A secret of exactly 64 hex digits (either case) is taken as the raw key.
/// Anything else is hashed: the key is the SHA-256 digest of its UTF-8 bytes.
pub fn derive_key(secret: &str) -> SymmetricKey {
    let mut raw = [0u8; KEY_LEN];
    if is_raw_hex_key(secret) && hex::decode_to_slice(secret, &mut raw).is_ok() {
        return SymmetricKey(raw);
    }
    raw.copy_from_slice(&Sha256::digest(secret.as_bytes()));
    SymmetricKey(raw)
}

fn is_raw_hex_key(secret: &str) -> bool {
    secret.len() == KEY_LEN * 2 && secret.bytes().all(|b| b.is_ascii_hexdigit())
}
