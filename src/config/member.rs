//! Member seed block configuration.

use serde::Deserialize;

/// Member block configuration.
///
/// Seeds the member registry at startup. Members not listed here are unknown
/// to the bot and can only run commands without permission requirements.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberBlock {
    /// Sender identity as reported by the chat transport.
    pub id: String,
    /// Permission names held by this member.
    #[serde(default)]
    pub permissions: Vec<String>,
}
