//! Command registry and dispatch.
//!
//! The `Dispatcher` owns the registered commands and the member source used
//! for permission checks. Commands are offered each message in registration
//! order; the first one that does not pass resolves the message.

use crate::command::{Command, DynCommand, UseOutcome};
use crate::config::DispatchConfig;
use crate::error::{CommandError, DispatchError};
use crate::member::PermissionSource;
use crate::message::Message;
use crate::metrics;
use crate::registry::OrderedRegistry;
use crate::telemetry::{CommandTimer, spans};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Instrument, Span, debug, info, warn};

/// The command that resolved a message, and how.
#[derive(Clone)]
pub struct CheckResponse {
    pub command: Arc<dyn DynCommand>,
    pub response: UseOutcome,
}

impl std::fmt::Debug for CheckResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckResponse")
            .field("command", &self.command.id())
            .field("response", &self.response)
            .finish()
    }
}

/// Registry of commands plus the permission source they are checked against.
pub struct Dispatcher {
    commands: OrderedRegistry<String, Arc<dyn DynCommand>>,
    members: Arc<dyn PermissionSource>,
    config: DispatchConfig,
    /// Resolved-message counters per command id.
    command_counts: HashMap<String, AtomicU64>,
}

impl Dispatcher {
    /// Create an empty dispatcher with default settings.
    pub fn new(members: Arc<dyn PermissionSource>) -> Self {
        Self::with_config(DispatchConfig::default(), members)
    }

    pub fn with_config(config: DispatchConfig, members: Arc<dyn PermissionSource>) -> Self {
        Self {
            commands: OrderedRegistry::new(),
            members,
            config,
            command_counts: HashMap::new(),
        }
    }

    /// Register a command. Registration order is dispatch order.
    pub fn register<T: Send + 'static>(
        &mut self,
        command: Command<T>,
    ) -> Result<(), DispatchError> {
        self.register_dyn(Arc::new(command))
    }

    /// Register an already type-erased command.
    pub fn register_dyn(&mut self, command: Arc<dyn DynCommand>) -> Result<(), DispatchError> {
        let id = command.id().to_string();
        if command.parser_count() == 0 {
            return Err(DispatchError::NoParsers(id));
        }
        self.commands
            .insert(id.clone(), command)
            .map_err(|_| DispatchError::DuplicateCommand(id.clone()))?;
        self.command_counts.insert(id.clone(), AtomicU64::new(0));
        debug!(command = %id, position = self.commands.len(), "Registered command");
        Ok(())
    }

    /// Offer a message to every command in registration order.
    ///
    /// Returns the first command whose outcome is not `Pass`, or `None` if no
    /// command claimed the message. Errors come from handlers and scenes only,
    /// and count as a resolution of the command that raised them.
    pub async fn check(
        &self,
        message: &dyn Message,
    ) -> Result<Option<CheckResponse>, CommandError> {
        let span = spans::dispatch(message.sender_id());
        self.check_inner(message).instrument(span).await
    }

    async fn check_inner(
        &self,
        message: &dyn Message,
    ) -> Result<Option<CheckResponse>, CommandError> {
        let mut timer = CommandTimer::start();

        for command in self.commands.all() {
            let result = command.use_command(message, self.members.as_ref()).await;
            if matches!(result, Ok(UseOutcome::Pass)) {
                continue;
            }

            Span::current().record("command", command.id());
            timer.resolve(command.id());
            if let Some(counter) = self.command_counts.get(command.id()) {
                counter.fetch_add(1, Ordering::Relaxed);
            }

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    metrics::record_dispatch(command.id(), "error");
                    metrics::record_command_error(command.id(), e.error_code());
                    warn!(command = %command.id(), error = %e, "Command failed");
                    return Err(CommandError::new(command.id(), e));
                }
            };
            metrics::record_dispatch(command.id(), response.as_str());

            match response {
                UseOutcome::Handled => info!(command = %command.id(), "Command handled"),
                _ => debug!(command = %command.id(), outcome = %response, "Command rejected"),
            }

            return Ok(Some(CheckResponse {
                command: command.clone(),
                response,
            }));
        }

        metrics::record_unmatched();
        if self.config.log_unmatched {
            debug!(text = ?message.text(), "No command matched");
        }
        Ok(None)
    }

    /// User-facing reply for a rejected dispatch.
    ///
    /// `Denied` yields the configured denial text, `Failed` the command's help.
    /// Handled dispatches need no reply from the core.
    pub fn reply_for(&self, resolved: &CheckResponse) -> Option<String> {
        match resolved.response {
            UseOutcome::Denied => Some(self.config.denied_reply.clone()),
            UseOutcome::Failed => Some(resolved.command.info().render(&self.config.help_header)),
            UseOutcome::Handled | UseOutcome::Pass => None,
        }
    }

    pub fn command(&self, id: &str) -> Option<&Arc<dyn DynCommand>> {
        self.commands.get(id)
    }

    /// Registered commands in dispatch order.
    pub fn commands(&self) -> impl Iterator<Item = &Arc<dyn DynCommand>> {
        self.commands.all()
    }

    /// Help text for one command, using the configured header.
    pub fn help_for(&self, id: &str) -> Option<String> {
        self.commands
            .get(id)
            .map(|c| c.info().render(&self.config.help_header))
    }

    /// Help text for every command in dispatch order.
    pub fn help(&self) -> Vec<String> {
        self.commands
            .all()
            .map(|c| c.info().render(&self.config.help_header))
            .collect()
    }

    pub fn members(&self) -> &Arc<dyn PermissionSource> {
        &self.members
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Resolved-message counts per command, busiest first.
    pub fn get_command_stats(&self) -> Vec<(&str, u64)> {
        let mut stats: Vec<_> = self
            .command_counts
            .iter()
            .map(|(cmd, count)| (cmd.as_str(), count.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();

        stats.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        stats
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field(
                "commands",
                &self.commands.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            )
            .field("config", &self.config)
            .finish()
    }
}
