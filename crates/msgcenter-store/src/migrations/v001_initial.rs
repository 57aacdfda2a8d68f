//! v001 -- Initial schema creation.
//!
//! Creates the two per-message tables: `message_state` (read/unread flags)
//! and `message_remark` (user display-name overrides).

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Message state (read / unread)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS message_state (
    message_id   TEXT PRIMARY KEY NOT NULL,   -- feed-supplied message id
    is_read      INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    unread_count INTEGER NOT NULL DEFAULT 0,
    updated_at   TEXT NOT NULL                -- RFC-3339
);

-- ----------------------------------------------------------------
-- Remarks
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS message_remark (
    message_id TEXT PRIMARY KEY NOT NULL,
    nickname   TEXT NOT NULL,                 -- display name at first remark
    remark     TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
