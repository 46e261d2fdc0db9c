//! CRUD operations for [`ChatPrefs`] records.
//!
//! All durable per-chat flags and last-read timestamps go through these
//! helpers -- one choke point instead of ad-hoc key access scattered per
//! flag, so migration and testing happen in exactly one place.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::params;

use agora_shared::ChatId;

use crate::database::Database;
use crate::error::Result;
use crate::models::{ChatFlag, ChatPrefs, PrefsPatch};

impl Database {
    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch the preference record for a chat. A chat with no stored row
    /// yields the all-defaults record.
    pub fn get_prefs(&self, chat_id: ChatId) -> Result<ChatPrefs> {
        let found = self
            .conn()
            .query_row(
                "SELECT chat_id, archived, muted, pinned, favorite, last_read_at
                 FROM chat_prefs
                 WHERE chat_id = ?1",
                params![chat_id.to_string()],
                row_to_prefs,
            );

        match found {
            Ok(prefs) => Ok(prefs),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(ChatPrefs::default_for(chat_id)),
            Err(other) => Err(other.into()),
        }
    }

    /// List every stored preference record.
    pub fn all_prefs(&self) -> Result<Vec<ChatPrefs>> {
        let mut stmt = self.conn().prepare(
            "SELECT chat_id, archived, muted, pinned, favorite, last_read_at
             FROM chat_prefs",
        )?;

        let rows = stmt.query_map([], row_to_prefs)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// The set of chat ids with a given flag switched on.
    pub fn chats_with_flag(&self, flag: ChatFlag) -> Result<HashSet<ChatId>> {
        let sql = format!(
            "SELECT chat_id FROM chat_prefs WHERE {} = 1",
            flag.column()
        );
        let mut stmt = self.conn().prepare(&sql)?;

        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut ids = HashSet::new();
        for row in rows {
            ids.insert(row?.parse()?);
        }
        Ok(ids)
    }

    /// The last-read timestamp for a chat, if the user has ever read it.
    pub fn last_read(&self, chat_id: ChatId) -> Result<Option<DateTime<Utc>>> {
        Ok(self.get_prefs(chat_id)?.last_read_at)
    }

    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    /// Apply a partial flag update, creating the row lazily if needed.
    /// Returns the record as stored after the write.
    pub fn update_prefs(&self, chat_id: ChatId, patch: &PrefsPatch) -> Result<ChatPrefs> {
        let mut prefs = self.get_prefs(chat_id)?;
        patch.apply(&mut prefs);
        self.put_prefs(&prefs)?;
        Ok(prefs)
    }

    /// Advance the last-read timestamp for a chat.
    pub fn set_last_read(&self, chat_id: ChatId, at: DateTime<Utc>) -> Result<()> {
        let mut prefs = self.get_prefs(chat_id)?;
        prefs.last_read_at = Some(at);
        self.put_prefs(&prefs)
    }

    /// Reset a chat to "never read" (the mark-unread action).
    pub fn clear_last_read(&self, chat_id: ChatId) -> Result<()> {
        let mut prefs = self.get_prefs(chat_id)?;
        prefs.last_read_at = None;
        self.put_prefs(&prefs)
    }

    /// Write a full record, replacing any existing row for the chat.
    fn put_prefs(&self, prefs: &ChatPrefs) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO chat_prefs
                 (chat_id, archived, muted, pinned, favorite, last_read_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                prefs.chat_id.to_string(),
                prefs.archived,
                prefs.muted,
                prefs.pinned,
                prefs.favorite,
                prefs.last_read_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`ChatPrefs`].
fn row_to_prefs(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatPrefs> {
    let chat_id_str: String = row.get(0)?;
    let archived: bool = row.get(1)?;
    let muted: bool = row.get(2)?;
    let pinned: bool = row.get(3)?;
    let favorite: bool = row.get(4)?;
    let last_read_str: Option<String> = row.get(5)?;

    let chat_id: ChatId = chat_id_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let last_read_at = last_read_str
        .map(|s| {
            DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc))
        })
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(ChatPrefs {
        chat_id,
        archived,
        muted,
        pinned,
        favorite,
        last_read_at,
    })
}
