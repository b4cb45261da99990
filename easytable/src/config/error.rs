// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

/// Config loading failures. Messages never include secret values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {origin}: {source}")]
    Read {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unsupported config version {found:?}, expected \"v1\"")]
    UnsupportedVersion { found: String },

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("environment variable {name} referenced in config is not set")]
    UndefinedVariable { name: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
