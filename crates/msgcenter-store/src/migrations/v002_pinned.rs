//! v002 -- Pinned conversations.
//!
//! Adds `is_pinned` to `message_state`. Existing rows default to unpinned and
//! keep their read/unread data.

use rusqlite::Connection;

use super::column_exists;

const ADD_PINNED_SQL: &str =
    "ALTER TABLE message_state ADD COLUMN is_pinned INTEGER NOT NULL DEFAULT 0";

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    if column_exists(conn, "message_state", "is_pinned")? {
        tracing::debug!("is_pinned column already present");
        return Ok(());
    }
    conn.execute_batch(ADD_PINNED_SQL)
}
