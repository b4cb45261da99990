// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

// Encrypted quota service protocol.
//
// - Key derivation from the operator secret
// - Typed request schema and kind-tag dispatch
// - AES-256-GCM envelope sealing with space padding
// - HTTP client (encrypted request, plaintext JSON response)
// - Fail-closed quota gate used before each extraction

mod client;
mod codec;
mod error;
mod gate;
mod key;
mod request;

pub use client::AuthClient;
pub use codec::{
    encrypt_request, pad_plaintext, seal_request, AesGcmCipher, EncryptedEnvelope, EnvelopeCipher,
    NONCE_LEN, PAD_BLOCK, TAG_LEN,
};
pub use error::AuthError;
pub use gate::{quota_from_response, DenyReason, QuotaDecision, QuotaGate, RemoteQuotaGate};
pub use key::{derive_key, SymmetricKey, KEY_LEN};
pub use request::{
    build_request, AuthPayload, AuthRequest, CheckRevokeRequest, Expiry, QuotaRequest, RequestKind,
    RevokeRequest,
};
