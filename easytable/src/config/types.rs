// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

/// Default listen port for the relay.
pub const DEFAULT_PORT: u16 = 3000;

/// Default cap on the inbound image body.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Top-level parsed and validated config.
#[derive(Debug, Clone)]
pub struct Config {
    /// Contract version. Always "v1".
    pub version: String,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    /// Quota service settings. `None` disables the quota gate.
    pub auth: Option<AuthConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub max_image_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

/// Model API connection settings.
#[derive(Clone)]
pub struct LlmConfig {
    /// Base URL without a trailing slash; `/chat/completions` is appended.
    pub base_url: String,
    pub api_key: String,
    /// Value of the `x-portkey-provider` header.
    pub provider: String,
    pub model: String,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .finish()
    }
}

/// Quota service settings.
#[derive(Clone)]
pub struct AuthConfig {
    pub url: String,
    pub token: String,
    /// Operator secret the symmetric key is derived from.
    pub encryption_key: String,
    pub max_quota: u64,
    pub timeout_ms: Option<u64>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("encryption_key", &"<redacted>")
            .field("max_quota", &self.max_quota)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}
