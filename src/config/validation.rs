//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::collections::HashSet;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("dispatch.help_header must not be empty")]
    EmptyHelpHeader,
    #[error("member #{0} has an empty id")]
    EmptyMemberId(usize),
    #[error("member id '{0}' is listed more than once")]
    DuplicateMemberId(String),
    #[error("member '{0}' has an empty permission name")]
    EmptyPermission(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.dispatch.help_header.trim().is_empty() {
        errors.push(ValidationError::EmptyHelpHeader);
    }

    let mut seen = HashSet::new();
    for (index, member) in config.member.iter().enumerate() {
        if member.id.trim().is_empty() {
            errors.push(ValidationError::EmptyMemberId(index));
            continue;
        }
        if !seen.insert(member.id.as_str()) {
            errors.push(ValidationError::DuplicateMemberId(member.id.clone()));
        }
        if member.permissions.iter().any(|p| p.trim().is_empty()) {
            errors.push(ValidationError::EmptyPermission(member.id.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
