// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

use super::error::ConfigError;
use super::interpolation::resolve_variables;
use super::raw;
use super::source::ConfigSource;
use super::types::*;

/// Load and validate an easytable config from the given source.
///
/// Steps:
/// 1. Read raw YAML from source
/// 2. Parse YAML into raw deserialization types
/// 3. Validate the contract version
/// 4. Resolve variable interpolation in string fields
/// 5. Validate required values and build the typed Config
pub fn load_config(source: &dyn ConfigSource) -> Result<Config, ConfigError> {
    let raw_yaml = source.read()?;
    let raw: raw::RawConfig = serde_yaml::from_str(&raw_yaml).map_err(|e| ConfigError::Parse {
        origin: source.origin(),
        source: e,
    })?;

    if raw.easytable != "v1" {
        return Err(ConfigError::UnsupportedVersion { found: raw.easytable });
    }

    let server = build_server_config(raw.server)?;
    let llm = build_llm_config(raw.llm)?;
    let auth = raw.auth.map(build_auth_config).transpose()?;

    Ok(Config {
        version: raw.easytable,
        server,
        llm,
        auth,
    })
}

fn build_server_config(raw: Option<raw::RawServerConfig>) -> Result<ServerConfig, ConfigError> {
    let Some(raw) = raw else {
        return Ok(ServerConfig::default());
    };
    let max_image_bytes = raw.max_image_bytes.unwrap_or(DEFAULT_MAX_IMAGE_BYTES);
    if max_image_bytes == 0 {
        return Err(ConfigError::invalid("server.max_image_bytes", "must be greater than zero"));
    }
    Ok(ServerConfig {
        port: raw.port.unwrap_or(DEFAULT_PORT),
        max_image_bytes,
    })
}

fn build_llm_config(raw: raw::RawLlmConfig) -> Result<LlmConfig, ConfigError> {
    let base_url = required("llm.base_url", &raw.base_url)?;
    Ok(LlmConfig {
        base_url: base_url.trim_end_matches('/').to_string(),
        api_key: required("llm.api_key", &raw.api_key)?,
        provider: resolve_variables(&raw.provider)?,
        model: required("llm.model", &raw.model)?,
    })
}

fn build_auth_config(raw: raw::RawAuthConfig) -> Result<AuthConfig, ConfigError> {
    Ok(AuthConfig {
        url: required("auth.url", &raw.url)?,
        token: required("auth.token", &raw.token)?,
        encryption_key: required("auth.encryption_key", &raw.encryption_key)?,
        max_quota: raw.max_quota,
        timeout_ms: raw.timeout_ms,
    })
}

/// Interpolate a string field and reject it if it resolves to empty.
fn required(field: &'static str, value: &str) -> Result<String, ConfigError> {
    let resolved = resolve_variables(value)?;
    if resolved.trim().is_empty() {
        return Err(ConfigError::invalid(field, "must not be empty"));
    }
    Ok(resolved)
}
