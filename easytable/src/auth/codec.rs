// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

// Envelope encryption for quota service requests.
//
// Wire format: nonce (12 bytes) || ciphertext || GCM tag (16 bytes).
// The plaintext is the request JSON right-padded with spaces to a multiple
// of 16 bytes, which the quota service expects.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use bytes::Bytes;

use super::error::AuthError;
use super::key::SymmetricKey;
use super::request::AuthRequest;

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const PAD_BLOCK: usize = 16;

/// Encrypted request body: `nonce || ciphertext+tag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope(Bytes);

impl EncryptedEnvelope {
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn nonce(&self) -> Option<&[u8]> {
        self.0.get(..NONCE_LEN)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Symmetric encryption capability injected into the auth client.
///
/// Implementations must draw a fresh nonce for every `seal` call.
pub trait EnvelopeCipher: Send + Sync {
    fn seal(&self, plaintext: &[u8]) -> Result<EncryptedEnvelope, AuthError>;
    fn open(&self, envelope: &EncryptedEnvelope) -> Result<Vec<u8>, AuthError>;
}

/// AES-256-GCM with a random 96-bit nonce per message and no associated data.
#[derive(Clone)]
pub struct AesGcmCipher {
    aead: Aes256Gcm,
}

impl AesGcmCipher {
    pub fn new(key: &SymmetricKey) -> Self {
        Self {
            aead: Aes256Gcm::new(key.as_bytes().into()),
        }
    }
}

impl EnvelopeCipher for AesGcmCipher {
    fn seal(&self, plaintext: &[u8]) -> Result<EncryptedEnvelope, AuthError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .aead
            .encrypt(&nonce, plaintext)
            .map_err(|_| AuthError::EncryptionFailed)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(EncryptedEnvelope(Bytes::from(out)))
    }

    fn open(&self, envelope: &EncryptedEnvelope) -> Result<Vec<u8>, AuthError> {
        let bytes = envelope.as_bytes();
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(AuthError::DecryptionFailed);
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        self.aead
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| AuthError::DecryptionFailed)
    }
}

/// Right-pad `json` with spaces until its byte length is a multiple of 16.
pub fn pad_plaintext(json: String) -> String {
    let mut padded = json;
    let rem = padded.len() % PAD_BLOCK;
    if rem != 0 {
        padded.extend(std::iter::repeat(' ').take(PAD_BLOCK - rem));
    }
    padded
}

/// Serialize, pad and seal `request` with the injected cipher.
pub fn seal_request(request: &AuthRequest, cipher: &dyn EnvelopeCipher) -> Result<EncryptedEnvelope, AuthError> {
    let json = serde_json::to_string(request)?;
    let padded = pad_plaintext(json);
    cipher.seal(padded.as_bytes())
}

/// Encrypt `request` under `key` with AES-256-GCM.
pub fn encrypt_request(request: &AuthRequest, key: &SymmetricKey) -> Result<EncryptedEnvelope, AuthError> {
    seal_request(request, &AesGcmCipher::new(key))
}
