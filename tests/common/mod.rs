//! Integration test common infrastructure.
//!
//! Provides a test bot with a recording log, member fixtures and a scene
//! that remembers every payload it was handed.

pub mod bot;

#[allow(unused_imports)]
pub use bot::{RecordingScene, TestBot};
