//! Inbound message abstraction.
//!
//! The chat transport owns the real session object; the dispatch core only
//! needs the message text and a stable sender identity for one dispatch.

/// A message delivered by the chat transport.
pub trait Message: Send + Sync {
    /// Raw message text, if the message carries any.
    fn text(&self) -> Option<&str>;

    /// Stable identity of the sender (used for member lookups).
    fn sender_id(&self) -> &str;
}

/// Owned message used by the console runtime and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    pub sender_id: String,
    pub text: Option<String>,
}

impl TextMessage {
    /// Create a message with text.
    pub fn new(sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            text: Some(text.into()),
        }
    }

    /// Create a message without text (stickers, attachments, joins).
    pub fn empty(sender_id: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            text: None,
        }
    }
}

impl Message for TextMessage {
    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn sender_id(&self) -> &str {
        &self.sender_id
    }
}
