// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

// Config loader and validator.
//
// Loads easytable.yaml, resolves `${VAR}` interpolation from the
// environment, and validates model API and quota service settings.

mod error;
mod interpolation;
mod loader;
mod raw;
mod source;
mod types;

pub use error::ConfigError;
pub use interpolation::{resolve_variables, resolve_variables_with};
pub use loader::load_config;
pub use source::{ConfigSource, FileSource, StringSource};
pub use types::{
    AuthConfig, Config, LlmConfig, ServerConfig, DEFAULT_MAX_IMAGE_BYTES, DEFAULT_PORT,
};
