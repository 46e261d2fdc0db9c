//! v001 -- Initial schema creation.
//!
//! Creates the two local-state tables: `chat_prefs` and `message_flags`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Per-chat preference records.
-- One row per chat the user has touched; flags default to off and
-- last_read_at to NULL ("never read"). Rows are created lazily and
-- never deleted.
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chat_prefs (
    chat_id      TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    archived     INTEGER NOT NULL DEFAULT 0, -- boolean 0/1
    muted        INTEGER NOT NULL DEFAULT 0,
    pinned       INTEGER NOT NULL DEFAULT 0,
    favorite     INTEGER NOT NULL DEFAULT 0,
    last_read_at TEXT                        -- ISO-8601 / RFC-3339, NULL = unset
);

-- ----------------------------------------------------------------
-- Global message-id flag sets (starred / pinned messages).
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS message_flags (
    message_id TEXT NOT NULL,                -- UUID v4
    flag       TEXT NOT NULL,                -- 'starred' | 'pinned'
    created_at TEXT NOT NULL,                -- ISO-8601

    PRIMARY KEY (message_id, flag)
);

CREATE INDEX IF NOT EXISTS idx_message_flags_flag ON message_flags(flag);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
