// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

// Raw YAML deserialization types. Strings here are pre-interpolation;
// the loader resolves `${VAR}` references and validates before building
// the public config structs.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub easytable: String,
    pub server: Option<RawServerConfig>,
    pub llm: RawLlmConfig,
    pub auth: Option<RawAuthConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawServerConfig {
    pub port: Option<u16>,
    pub max_image_bytes: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawLlmConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default)]
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawAuthConfig {
    pub url: String,
    pub token: String,
    pub encryption_key: String,
    pub max_quota: u64,
    pub timeout_ms: Option<u64>,
}
