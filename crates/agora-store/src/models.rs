//! Record structs persisted in the local database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agora_shared::ChatId;

/// A per-chat preference record.
///
/// Created lazily on first toggle or first selection; a chat without a row
/// behaves exactly like one whose row holds all defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatPrefs {
    /// The chat these preferences belong to.
    pub chat_id: ChatId,
    /// Hidden from every filter view except "archived".
    pub archived: bool,
    /// Notifications suppressed.
    pub muted: bool,
    /// Sorted before unpinned chats regardless of filter.
    pub pinned: bool,
    /// Shown in the "favorites" filter view.
    pub favorite: bool,
    /// Last time the user read this chat. `None` means never read, so
    /// every message from others counts as unread.
    pub last_read_at: Option<DateTime<Utc>>,
}

impl ChatPrefs {
    /// The all-defaults record for a chat with no stored row.
    pub fn default_for(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            archived: false,
            muted: false,
            pinned: false,
            favorite: false,
            last_read_at: None,
        }
    }
}

/// A partial update to a [`ChatPrefs`] record. `None` fields are left
/// untouched; each flag write is independent and last-write-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefsPatch {
    pub archived: Option<bool>,
    pub muted: Option<bool>,
    pub pinned: Option<bool>,
    pub favorite: Option<bool>,
}

impl PrefsPatch {
    pub fn archived(value: bool) -> Self {
        Self { archived: Some(value), ..Self::default() }
    }

    pub fn muted(value: bool) -> Self {
        Self { muted: Some(value), ..Self::default() }
    }

    pub fn pinned(value: bool) -> Self {
        Self { pinned: Some(value), ..Self::default() }
    }

    pub fn favorite(value: bool) -> Self {
        Self { favorite: Some(value), ..Self::default() }
    }

    /// Apply this patch on top of an existing record.
    pub fn apply(&self, prefs: &mut ChatPrefs) {
        if let Some(v) = self.archived {
            prefs.archived = v;
        }
        if let Some(v) = self.muted {
            prefs.muted = v;
        }
        if let Some(v) = self.pinned {
            prefs.pinned = v;
        }
        if let Some(v) = self.favorite {
            prefs.favorite = v;
        }
    }
}

/// The boolean columns of `chat_prefs`, for set-style queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatFlag {
    Archived,
    Muted,
    Pinned,
    Favorite,
}

impl ChatFlag {
    /// The column name backing this flag.
    pub(crate) fn column(self) -> &'static str {
        match self {
            ChatFlag::Archived => "archived",
            ChatFlag::Muted => "muted",
            ChatFlag::Pinned => "pinned",
            ChatFlag::Favorite => "favorite",
        }
    }
}

/// The global message-id flag sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageFlag {
    Starred,
    Pinned,
}

impl MessageFlag {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            MessageFlag::Starred => "starred",
            MessageFlag::Pinned => "pinned",
        }
    }
}
