//! Commands: ordered parsers, a permission gate and a callback target.
//!
//! A [`Command`] tries its parsers in declaration order. The first parser
//! that structurally matches decides the outcome for the whole command:
//!
//! - `Pass` from a parser moves on to the next parser.
//! - `Failed` from a parser aborts the command with [`UseOutcome::Failed`].
//! - A parsed match is permission-checked, then executed exactly once and
//!   reported as [`UseOutcome::Handled`].
//!
//! Commands with different input types share one registry through the
//! object-safe [`DynCommand`] trait.

use crate::error::{HandlerError, HandlerResult};
use crate::member::PermissionSource;
use crate::message::Message;
use crate::parser::{ParseOutcome, Parser};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Header line used by [`Command::display_info`].
pub const DEFAULT_HELP_HEADER: &str = "💬 Command help:";

/// Human-readable command description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub usage: String,
    pub description: String,
}

impl CommandInfo {
    pub fn new(usage: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            usage: usage.into(),
            description: description.into(),
        }
    }

    /// Render the help text under `header`.
    pub fn render(&self, header: &str) -> String {
        format!("{}\n{}\n{}", header, self.usage, self.description)
    }
}

/// Input handed to a scene when a command enters it.
pub struct ScenePayload<'a, T> {
    pub message: &'a dyn Message,
    pub input: T,
}

/// Multi-step conversational flow owned outside the dispatch core.
#[async_trait]
pub trait Scene<T>: Send + Sync {
    /// Scene name, used in logs and errors.
    fn name(&self) -> &str;

    /// Begin or resume the flow at its current frame.
    async fn enter_current_frame(&self, payload: ScenePayload<'_, T>) -> HandlerResult;
}

/// Direct command handler.
pub type InputHandler<T> = Arc<dyn Fn(&dyn Message, T) -> HandlerResult + Send + Sync>;

/// What a command runs once it matches.
pub enum Callback<T> {
    Handler(InputHandler<T>),
    Scene(Arc<dyn Scene<T>>),
}

impl<T> Callback<T> {
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&dyn Message, T) -> HandlerResult + Send + Sync + 'static,
    {
        Self::Handler(Arc::new(f))
    }
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Handler(h) => Self::Handler(h.clone()),
            Self::Scene(s) => Self::Scene(s.clone()),
        }
    }
}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("Handler"),
            Self::Scene(s) => write!(f, "Scene({})", s.name()),
        }
    }
}

/// Result of offering a message to one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UseOutcome {
    /// No parser of this command matched.
    Pass,
    /// A parser matched but the sender lacks a required permission.
    Denied,
    /// A parser matched but the arguments were malformed.
    Failed,
    /// A parser matched and the callback ran.
    Handled,
}

impl UseOutcome {
    /// Static label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Denied => "denied",
            Self::Failed => "failed",
            Self::Handled => "handled",
        }
    }
}

impl fmt::Display for UseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered bot command.
pub struct Command<T> {
    id: String,
    info: CommandInfo,
    parsers: Vec<Parser<T>>,
    permissions: Vec<String>,
    callback: Callback<T>,
}

impl<T: Send + 'static> Command<T> {
    pub fn new(id: impl Into<String>, info: CommandInfo, callback: Callback<T>) -> Self {
        Self {
            id: id.into(),
            info,
            parsers: Vec::new(),
            permissions: Vec::new(),
            callback,
        }
    }

    /// Append a parser. Parsers are tried in the order they are added.
    pub fn parser(mut self, parser: Parser<T>) -> Self {
        self.parsers.push(parser);
        self
    }

    /// Require a permission to run this command.
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn info(&self) -> &CommandInfo {
        &self.info
    }

    pub fn parsers(&self) -> &[Parser<T>] {
        &self.parsers
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    /// Help text with the default header.
    pub fn display_info(&self) -> String {
        self.info.render(DEFAULT_HELP_HEADER)
    }

    /// Offer a message to this command.
    pub async fn use_command(
        &self,
        message: &dyn Message,
        members: &dyn PermissionSource,
    ) -> Result<UseOutcome, HandlerError> {
        for parser in &self.parsers {
            let output = match parser.parse(message) {
                ParseOutcome::Pass => continue,
                ParseOutcome::Failed => {
                    debug!(command = %self.id, alias = %parser.alias(), "Malformed arguments");
                    return Ok(UseOutcome::Failed);
                }
                ParseOutcome::Parsed(output) => output,
            };

            if !self.permits(message.sender_id(), members) {
                debug!(
                    command = %self.id,
                    sender = %message.sender_id(),
                    "Missing permissions"
                );
                return Ok(UseOutcome::Denied);
            }

            trace!(
                command = %self.id,
                alias = %output.alias,
                args = output.arguments.len(),
                "Parsed"
            );
            let input = parser.adapt(output);
            self.execute(message, input).await?;
            return Ok(UseOutcome::Handled);
        }

        Ok(UseOutcome::Pass)
    }

    /// Run the callback target with a typed input.
    pub async fn execute(&self, message: &dyn Message, input: T) -> HandlerResult {
        match &self.callback {
            Callback::Handler(handler) => handler(message, input),
            Callback::Scene(scene) => {
                debug!(command = %self.id, scene = %scene.name(), "Entering scene");
                scene
                    .enter_current_frame(ScenePayload { message, input })
                    .await
            }
        }
    }

    fn permits(&self, sender_id: &str, members: &dyn PermissionSource) -> bool {
        self.permissions.is_empty() || members.member_has_permissions(sender_id, &self.permissions)
    }
}

impl<T: Send + 'static> fmt::Debug for Command<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("parsers", &self.parsers)
            .field("permissions", &self.permissions)
            .field("callback", &self.callback)
            .finish()
    }
}

/// Object-safe view of a [`Command`] used by the dispatcher.
#[async_trait]
pub trait DynCommand: Send + Sync {
    fn id(&self) -> &str;

    fn info(&self) -> &CommandInfo;

    fn permissions(&self) -> &[String];

    fn parser_count(&self) -> usize;

    fn display_info(&self) -> String {
        self.info().render(DEFAULT_HELP_HEADER)
    }

    async fn use_command(
        &self,
        message: &dyn Message,
        members: &dyn PermissionSource,
    ) -> Result<UseOutcome, HandlerError>;
}

#[async_trait]
impl<T: Send + 'static> DynCommand for Command<T> {
    fn id(&self) -> &str {
        Command::id(self)
    }

    fn info(&self) -> &CommandInfo {
        Command::info(self)
    }

    fn permissions(&self) -> &[String] {
        Command::permissions(self)
    }

    fn parser_count(&self) -> usize {
        self.parsers.len()
    }

    async fn use_command(
        &self,
        message: &dyn Message,
        members: &dyn PermissionSource,
    ) -> Result<UseOutcome, HandlerError> {
        Command::use_command(self, message, members).await
    }
}
