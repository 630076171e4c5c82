//! Conversation controller
//!
//! Drives one incoming chat message through the dialog state machine,
//! the record store, and back out as replies.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{BotRuntime, RuntimeError};
pub use traits::*;

use crate::templates::Template;

/// What the user sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// A `/command`, name only
    Command(String),
    /// Anything else
    Text(String),
}

/// A chat message addressed to the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub user_id: String,
    pub kind: MessageKind,
}

impl IncomingMessage {
    #[must_use]
    pub fn command(chat_id: i64, user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            chat_id,
            user_id: user_id.into(),
            kind: MessageKind::Command(name.into()),
        }
    }

    #[must_use]
    pub fn text(chat_id: i64, user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            user_id: user_id.into(),
            kind: MessageKind::Text(text.into()),
        }
    }
}

/// A reply on its way to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    pub html: bool,
    pub disable_preview: bool,
}

impl OutgoingMessage {
    #[must_use]
    pub fn from_template(chat_id: i64, template: Template) -> Self {
        Self {
            chat_id,
            text: template.text.to_string(),
            html: template.html,
            disable_preview: template.disable_preview,
        }
    }

    /// One chunk of the group listing
    #[must_use]
    pub fn listing(chat_id: i64, text: String) -> Self {
        Self {
            chat_id,
            text,
            html: true,
            disable_preview: true,
        }
    }
}
