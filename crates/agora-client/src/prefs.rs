//! The preference store facade.
//!
//! Every durable, local-only key the engine touches -- per-chat flags,
//! last-read timestamps, the starred/pinned message sets -- goes through
//! this one type. The backend never sees any of it.
//!
//! Storage degradation is deliberate and silent: when the on-disk database
//! cannot be opened, the store falls back to an in-memory database and the
//! caller is not informed. Flags default to unset, so the worst case is
//! preferences that do not survive the session, not a correctness bug.
//! Individual read/write failures after open are logged and swallowed the
//! same way.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use agora_shared::{ChatId, MessageId};
use agora_store::{ChatFlag, ChatPrefs, Database, MessageFlag, PrefsPatch, StoreError};

use crate::mutex::lock;

/// Synchronous, non-blocking access to all durable engine state.
pub struct PreferenceStore {
    db: Option<Mutex<Database>>,
}

impl PreferenceStore {
    /// Open the store at the platform data directory, or at `data_dir`
    /// when given. Falls back to in-memory on any open failure.
    pub fn open(data_dir: Option<&Path>) -> Self {
        let opened = match data_dir {
            Some(dir) => Database::open_at(&dir.join("agora.db")),
            None => Database::new(),
        };

        let db = match opened {
            Ok(db) => Some(db),
            Err(e) => {
                tracing::warn!(error = %e, "preference database unavailable, degrading to in-memory");
                Database::open_in_memory().ok()
            }
        };

        Self {
            db: db.map(Mutex::new),
        }
    }

    /// A store backed by a volatile in-memory database. Used by tests and
    /// by embedders that opt out of persistence.
    pub fn in_memory() -> Self {
        let db = match Database::open_in_memory() {
            Ok(db) => Some(Mutex::new(db)),
            Err(e) => {
                tracing::warn!(error = %e, "in-memory database unavailable");
                None
            }
        };
        Self { db }
    }

    /// Run `f` against the database, returning `default` when the store is
    /// unavailable or the operation fails.
    fn with_db<T>(
        &self,
        default: T,
        f: impl FnOnce(&Database) -> std::result::Result<T, StoreError>,
    ) -> T {
        let Some(db) = &self.db else {
            return default;
        };
        match f(&lock(db)) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "preference store operation failed");
                default
            }
        }
    }

    // ------------------------------------------------------------------
    // Per-chat flags
    // ------------------------------------------------------------------

    /// The preference record for a chat; all-defaults when never touched.
    pub fn get(&self, chat_id: ChatId) -> ChatPrefs {
        self.with_db(ChatPrefs::default_for(chat_id), |db| db.get_prefs(chat_id))
    }

    /// Apply a partial flag update.
    pub fn update(&self, chat_id: ChatId, patch: &PrefsPatch) -> ChatPrefs {
        self.with_db(ChatPrefs::default_for(chat_id), |db| {
            db.update_prefs(chat_id, patch)
        })
    }

    /// Snapshot of every stored record, keyed by chat id.
    pub fn snapshot(&self) -> HashMap<ChatId, ChatPrefs> {
        self.with_db(Vec::new(), |db| db.all_prefs())
            .into_iter()
            .map(|p| (p.chat_id, p))
            .collect()
    }

    /// Chat ids carrying a given flag.
    pub fn chats_with_flag(&self, flag: ChatFlag) -> HashSet<ChatId> {
        self.with_db(HashSet::new(), |db| db.chats_with_flag(flag))
    }

    // ------------------------------------------------------------------
    // Last-read timestamps
    // ------------------------------------------------------------------

    pub fn last_read(&self, chat_id: ChatId) -> Option<DateTime<Utc>> {
        self.with_db(None, |db| db.last_read(chat_id))
    }

    pub fn set_last_read(&self, chat_id: ChatId, at: DateTime<Utc>) {
        self.with_db((), |db| db.set_last_read(chat_id, at));
    }

    pub fn clear_last_read(&self, chat_id: ChatId) {
        self.with_db((), |db| db.clear_last_read(chat_id));
    }

    // ------------------------------------------------------------------
    // Message flag sets
    // ------------------------------------------------------------------

    pub fn flag_message(&self, message_id: MessageId, flag: MessageFlag) {
        self.with_db((), |db| db.flag_message(message_id, flag));
    }

    pub fn unflag_message(&self, message_id: MessageId, flag: MessageFlag) {
        self.with_db(false, |db| db.unflag_message(message_id, flag));
    }

    pub fn message_has_flag(&self, message_id: MessageId, flag: MessageFlag) -> bool {
        self.with_db(false, |db| db.message_has_flag(message_id, flag))
    }

    pub fn flagged_messages(&self, flag: MessageFlag) -> HashSet<MessageId> {
        self.with_db(HashSet::new(), |db| db.flagged_messages(flag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_path_degrades_to_in_memory() {
        // A file where a directory is expected makes open fail.
        let file = tempfile::NamedTempFile::new().unwrap();
        let store = PreferenceStore::open(Some(file.path()));

        let chat = ChatId::new();
        store.update(chat, &PrefsPatch::favorite(true));
        assert!(store.get(chat).favorite);
    }

    #[test]
    fn round_trip_through_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let chat = ChatId::new();
        let at = Utc::now();

        {
            let store = PreferenceStore::open(Some(dir.path()));
            store.update(chat, &PrefsPatch::pinned(true));
            store.set_last_read(chat, at);
        }

        let store = PreferenceStore::open(Some(dir.path()));
        let prefs = store.get(chat);
        assert!(prefs.pinned);
        assert_eq!(
            prefs.last_read_at.unwrap().timestamp_millis(),
            at.timestamp_millis()
        );
    }

    #[test]
    fn starred_set_round_trip() {
        let store = PreferenceStore::in_memory();
        let msg = MessageId::new();

        store.flag_message(msg, MessageFlag::Starred);
        assert!(store.message_has_flag(msg, MessageFlag::Starred));

        store.unflag_message(msg, MessageFlag::Starred);
        assert!(!store.message_has_flag(msg, MessageFlag::Starred));
    }
}
