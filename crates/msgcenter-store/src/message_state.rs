//! Read/unread/pinned state keyed by message id.

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use msgcenter_shared::{Message, MessageId};

use crate::database::{parse_timestamp, Database};
use crate::error::Result;
use crate::models::MessageState;

const SELECT_STATE: &str = "SELECT message_id, is_read, unread_count, is_pinned, updated_at
                            FROM message_state";

impl Database {
    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    /// Upsert the full state of a message. Last write wins.
    pub fn set_state(
        &self,
        message_id: &MessageId,
        is_read: bool,
        unread_count: u32,
        is_pinned: bool,
    ) -> Result<MessageState> {
        self.with_conn(|conn| upsert_state(conn, message_id, is_read, unread_count, is_pinned))
    }

    /// Update read/unread, keeping the stored pin flag (unpinned if no row).
    pub fn set_read_state(
        &self,
        message_id: &MessageId,
        is_read: bool,
        unread_count: u32,
    ) -> Result<MessageState> {
        self.with_transaction(|tx| {
            let is_pinned = select_state(tx, message_id)?
                .map(|s| s.is_pinned)
                .unwrap_or(false);
            upsert_state(tx, message_id, is_read, unread_count, is_pinned)
        })
    }

    /// Update the pin flag, keeping stored read/unread (unread, 0 if no row).
    pub fn set_pinned(&self, message_id: &MessageId, is_pinned: bool) -> Result<MessageState> {
        self.with_transaction(|tx| {
            let (is_read, unread_count) = select_state(tx, message_id)?
                .map(|s| (s.is_read, s.unread_count))
                .unwrap_or((false, 0));
            upsert_state(tx, message_id, is_read, unread_count, is_pinned)
        })
    }

    /// Seed state from a batch of feed messages in one transaction.
    pub fn batch_set_state(&self, messages: &[Message]) -> Result<()> {
        self.with_transaction(|tx| {
            for message in messages {
                upsert_state(
                    tx,
                    &message.id,
                    message.is_read,
                    message.unread_count,
                    message.is_pinned,
                )?;
            }
            Ok(())
        })?;

        tracing::debug!(count = messages.len(), "seeded message state");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch the state of one message; `None` if it was never written.
    pub fn get_state(&self, message_id: &MessageId) -> Result<Option<MessageState>> {
        self.with_conn(|conn| select_state(conn, message_id))
    }

    /// Load every stored state in a single scan.
    pub fn get_all_states(&self) -> Result<HashMap<MessageId, MessageState>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(SELECT_STATE)?;
            let rows = stmt.query_map([], row_to_state)?;

            let mut states = HashMap::new();
            for row in rows {
                let state = row?;
                states.insert(state.message_id.clone(), state);
            }
            Ok(states)
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn upsert_state(
    conn: &Connection,
    message_id: &MessageId,
    is_read: bool,
    unread_count: u32,
    is_pinned: bool,
) -> Result<MessageState> {
    let updated_at = Utc::now();

    conn.execute(
        "INSERT INTO message_state (message_id, is_read, unread_count, is_pinned, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(message_id) DO UPDATE SET
             is_read      = excluded.is_read,
             unread_count = excluded.unread_count,
             is_pinned    = excluded.is_pinned,
             updated_at   = excluded.updated_at",
        params![
            message_id.as_str(),
            is_read,
            unread_count,
            is_pinned,
            updated_at.to_rfc3339(),
        ],
    )?;

    Ok(MessageState {
        message_id: message_id.clone(),
        is_read,
        unread_count,
        is_pinned,
        updated_at,
    })
}

fn select_state(conn: &Connection, message_id: &MessageId) -> Result<Option<MessageState>> {
    let state = conn
        .query_row(
            &format!("{SELECT_STATE} WHERE message_id = ?1"),
            params![message_id.as_str()],
            row_to_state,
        )
        .optional()?;
    Ok(state)
}

/// Map a `rusqlite::Row` to a [`MessageState`].
fn row_to_state(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageState> {
    let message_id: String = row.get(0)?;
    let is_read: bool = row.get(1)?;
    let unread_count: u32 = row.get(2)?;
    let is_pinned: bool = row.get(3)?;
    let updated_str: String = row.get(4)?;

    Ok(MessageState {
        message_id: MessageId(message_id),
        is_read,
        unread_count,
        is_pinned,
        updated_at: parse_timestamp(4, &updated_str)?,
    })
}
