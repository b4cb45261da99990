// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

/// Errors raised while building, encrypting or sending quota service requests.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request kind tag is not one of the known kinds.
    #[error("unknown request kind: {0}")]
    InvalidKind(String),

    /// The params do not match the shape required by the request kind.
    #[error("invalid params for {kind} request: {reason}")]
    InvalidParams { kind: &'static str, reason: String },

    #[error("failed to serialize auth request: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to encrypt auth request")]
    EncryptionFailed,

    #[error("failed to decrypt auth envelope")]
    DecryptionFailed,

    /// The quota service answered with a non-2xx status.
    #[error("failed to send auth request: {status_code} {status_text}")]
    Transport { status_code: u16, status_text: String },

    /// The quota service could not be reached.
    #[error("auth service unreachable: {0}")]
    Network(String),

    /// The quota service answered 2xx with a body that is not JSON.
    #[error("auth service returned an invalid response: {0}")]
    InvalidResponse(String),
}
