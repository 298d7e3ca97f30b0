//! Telemetry utilities for dispatch timing and spans.

use std::time::Instant;

/// Guard for timing a dispatch and recording its latency.
///
/// Records latency when dropped, once the resolving command is known.
pub struct CommandTimer {
    command: Option<String>,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a dispatch.
    pub fn start() -> Self {
        Self {
            command: None,
            start: Instant::now(),
        }
    }

    /// Attribute the measured time to `command`.
    pub fn resolve(&mut self, command: impl Into<String>) {
        self.command = Some(command.into());
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        if let Some(command) = &self.command {
            let duration = self.start.elapsed().as_secs_f64();
            crate::metrics::record_latency(command, duration);
        }
    }
}

/// Standardized span constructors for dispatch observability.
pub mod spans {
    use tracing::{Span, debug_span};

    /// Span covering one inbound message.
    pub fn dispatch(sender: &str) -> Span {
        debug_span!("bot.dispatch", sender = %sender, command = tracing::field::Empty)
    }
}
