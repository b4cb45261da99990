// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

use super::error::ConfigError;

/// Resolves `${VAR_NAME}` references in a string from environment variables.
/// Returns `ConfigError::UndefinedVariable` if a referenced variable is not set.
///
/// `lookup` is injected so tests can resolve against a fixed table.
pub fn resolve_variables_with<F>(input: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(0) | None => {
                // Malformed or empty reference: keep it literally.
                result.push_str("${");
                rest = after;
            }
            Some(end) => {
                let name = &after[..end];
                let value = lookup(name).ok_or_else(|| ConfigError::UndefinedVariable {
                    name: name.to_string(),
                })?;
                result.push_str(&value);
                rest = &after[end + 1..];
            }
        }
    }
    result.push_str(rest);

    Ok(result)
}

/// Resolves `${VAR_NAME}` references against the process environment.
pub fn resolve_variables(input: &str) -> Result<String, ConfigError> {
    resolve_variables_with(input, |name| std::env::var(name).ok())
}
