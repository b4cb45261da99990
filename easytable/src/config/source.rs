// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use super::error::ConfigError;

/// Where config YAML is read from.
pub trait ConfigSource {
    /// Human-readable origin used in error messages.
    fn origin(&self) -> String;

    fn read(&self) -> Result<String, ConfigError>;
}

/// A config file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn origin(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> Result<String, ConfigError> {
        std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            origin: self.origin(),
            source,
        })
    }
}

/// In-memory YAML, for tests and embedding.
#[derive(Debug, Clone)]
pub struct StringSource(String);

impl StringSource {
    pub fn new(yaml: impl Into<String>) -> Self {
        Self(yaml.into())
    }
}

impl ConfigSource for StringSource {
    fn origin(&self) -> String {
        "<inline>".to_string()
    }

    fn read(&self) -> Result<String, ConfigError> {
        Ok(self.0.clone())
    }
}
