//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::member::MemberBlock;
use crate::command::DEFAULT_HELP_HEADER;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Dispatch behaviour.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Member blocks.
    #[serde(default)]
    pub member: Vec<MemberBlock>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Dispatch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// First line of every command help text.
    #[serde(default = "default_help_header")]
    pub help_header: String,
    /// Reply sent when a sender lacks a command's permissions.
    #[serde(default = "default_denied_reply")]
    pub denied_reply: String,
    /// Log messages that match no command at debug level.
    #[serde(default)]
    pub log_unmatched: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            help_header: default_help_header(),
            denied_reply: default_denied_reply(),
            log_unmatched: false,
        }
    }
}

fn default_help_header() -> String {
    DEFAULT_HELP_HEADER.to_string()
}

fn default_denied_reply() -> String {
    "⛔ You do not have permission to use this command.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn dispatch_defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.help_header, DEFAULT_HELP_HEADER);
        assert!(config.denied_reply.contains("permission"));
        assert!(!config.log_unmatched);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.dispatch.help_header, DEFAULT_HELP_HEADER);
        assert!(config.member.is_empty());
    }

    #[test]
    fn parses_member_blocks() {
        let config: Config = toml::from_str(
            r#"
            [dispatch]
            help_header = "Help:"

            [[member]]
            id = "100"
            permissions = ["admin", "mod"]

            [[member]]
            id = "200"
            "#,
        )
        .unwrap();
        assert_eq!(config.dispatch.help_header, "Help:");
        assert_eq!(config.member.len(), 2);
        assert_eq!(config.member[0].permissions, vec!["admin", "mod"]);
        assert!(config.member[1].permissions.is_empty());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dispatch]\nlog_unmatched = true").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert!(config.dispatch.log_unmatched);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Config::load("/nonexistent/slbot.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn load_invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dispatch").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
