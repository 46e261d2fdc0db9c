//! Domain model structs exchanged with the backend.
//!
//! Field names follow the backend's camelCase JSON convention; every struct
//! derives `Serialize`/`Deserialize` so it can be handed directly to a UI
//! layer or persisted as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ChatId, MessageId, UserId};

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A conversation thread, direct (two participants) or group.
///
/// Identity is `id`; everything except `last_message_at` and
/// `last_message_preview` is immutable once the server has created the chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    /// Unique chat identifier, assigned by the server.
    pub id: ChatId,
    /// Optional display name. Direct chats usually have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether this is a group conversation.
    #[serde(default)]
    pub is_group: bool,
    /// The user who created the chat.
    pub created_by: UserId,
    /// When the chat was created on the server.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<DateTime<Utc>>,
    /// Truncated body of the most recent message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_preview: Option<String>,
}

impl Chat {
    /// The string shown in the conversation list: the chat's name when it
    /// has one, otherwise its id.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.id.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message. Belongs to exactly one [`Chat`].
///
/// At least one of `content` / `attachment_url` is present for a persisted
/// message; the send path rejects empty payloads before they reach the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier. Client-generated for optimistic entries,
    /// server-assigned once persisted.
    pub id: MessageId,
    /// The chat this message belongs to.
    pub chat_id: ChatId,
    /// The author.
    pub sender_id: UserId,
    /// Text body, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Attachment payload encoded as a `data:` URL, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    /// When the message was created (sender clock for optimistic entries,
    /// server clock once confirmed).
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether this message was authored by `user`.
    pub fn is_from(&self, user: UserId) -> bool {
        self.sender_id == user
    }

    /// Truncated body used for the chat-list preview line.
    pub fn preview(&self) -> String {
        match &self.content {
            Some(text) => text.chars().take(crate::constants::PREVIEW_MAX_CHARS).collect(),
            None => "[attachment]".to_string(),
        }
    }
}
