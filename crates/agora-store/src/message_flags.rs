//! The global starred / pinned message-id sets.

use std::collections::HashSet;

use chrono::Utc;
use rusqlite::params;

use agora_shared::MessageId;

use crate::database::Database;
use crate::error::Result;
use crate::models::MessageFlag;

impl Database {
    /// Add a message to a flag set. Re-flagging is a no-op.
    pub fn flag_message(&self, message_id: MessageId, flag: MessageFlag) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO message_flags (message_id, flag, created_at)
             VALUES (?1, ?2, ?3)",
            params![
                message_id.to_string(),
                flag.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Remove a message from a flag set. Returns `true` if it was present.
    pub fn unflag_message(&self, message_id: MessageId, flag: MessageFlag) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM message_flags WHERE message_id = ?1 AND flag = ?2",
            params![message_id.to_string(), flag.as_str()],
        )?;
        Ok(affected > 0)
    }

    /// Whether a message carries a given flag.
    pub fn message_has_flag(&self, message_id: MessageId, flag: MessageFlag) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM message_flags WHERE message_id = ?1 AND flag = ?2",
            params![message_id.to_string(), flag.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// All message ids in a flag set.
    pub fn flagged_messages(&self, flag: MessageFlag) -> Result<HashSet<MessageId>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT message_id FROM message_flags WHERE flag = ?1")?;

        let rows = stmt.query_map(params![flag.as_str()], |row| row.get::<_, String>(0))?;

        let mut ids = HashSet::new();
        for row in rows {
            ids.insert(row?.parse()?);
        }
        Ok(ids)
    }
}
