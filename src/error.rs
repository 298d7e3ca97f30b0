//! Unified error handling for slbot.
//!
//! Normal dispatch flow never produces errors: non-matches, malformed input
//! and permission denials are outcome tags (see [`crate::command::UseOutcome`]).
//! The types here cover construction mistakes and failures raised by handlers
//! or scenes, which the surrounding bot runtime is expected to log.

use thiserror::Error;

// ============================================================================
// Dispatch Errors (construction and registration)
// ============================================================================

/// Errors raised while building parsers or registering commands.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("command already registered: {0}")]
    DuplicateCommand(String),

    #[error("member already registered: {0}")]
    DuplicateMember(String),

    #[error("command {0} has no parsers")]
    NoParsers(String),
}

// ============================================================================
// Handler Errors (callback and scene execution)
// ============================================================================

/// Errors raised by a command callback or a scene hand-off.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler failed: {0}")]
    Handler(String),

    #[error("scene {scene} rejected input: {reason}")]
    Scene { scene: String, reason: String },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Handler(_) => "handler_failed",
            Self::Scene { .. } => "scene_failed",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Result type for command callbacks and scenes.
pub type HandlerResult = Result<(), HandlerError>;

/// A handler or scene error, tagged with the command that raised it.
#[derive(Debug, Error)]
#[error("command {command} failed: {source}")]
pub struct CommandError {
    pub command: String,
    #[source]
    pub source: HandlerError,
}

impl CommandError {
    pub fn new(command: impl Into<String>, source: HandlerError) -> Self {
        Self {
            command: command.into(),
            source,
        }
    }

    /// Error code of the underlying handler error.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        self.source.error_code()
    }
}
