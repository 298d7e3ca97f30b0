//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, DispatchConfig)
//! - [`member`]: Member seed blocks (MemberBlock)
//! - [`validation`]: Startup validation

mod member;
mod types;
pub mod validation;

pub use member::MemberBlock;
pub use types::{Config, ConfigError, DispatchConfig};
pub use validation::{ValidationError, validate};
