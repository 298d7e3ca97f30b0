//! slbot - Straylight Bot
//!
//! Message-driven command dispatch for chat bots: alias matching, argument
//! extraction and validation, permission gating, and routing to handlers or
//! multi-step scenes.
//!
//! ```ignore
//! let members = Arc::new(MemberRegistry::new());
//! let mut dispatcher = Dispatcher::new(members);
//! dispatcher.register(
//!     Command::new(
//!         "ping",
//!         CommandInfo::new("ping", "Check the bot is alive"),
//!         Callback::handler(|_, _| Ok(())),
//!     )
//!     .parser(Parser::raw("ping")),
//! )?;
//! let resolved = dispatcher.check(&TextMessage::new("42", "ping")).await?;
//! ```

pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod member;
pub mod message;
pub mod metrics;
pub mod parser;
pub mod registry;
pub mod telemetry;

pub use command::{
    Callback, Command, CommandInfo, DynCommand, Scene, ScenePayload, UseOutcome,
};
pub use config::{Config, DispatchConfig};
pub use dispatcher::{CheckResponse, Dispatcher};
pub use error::{CommandError, DispatchError, HandlerError, HandlerResult};
pub use member::{Member, MemberRegistry, PermissionSource};
pub use message::{Message, TextMessage};
pub use parser::{Alias, ParseOutcome, Parser, ParserOutput};
pub use registry::OrderedRegistry;
