//! CRUD operations for [`Remark`] records.

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use msgcenter_shared::MessageId;

use crate::database::{parse_timestamp, Database};
use crate::error::Result;
use crate::models::Remark;

impl Database {
    /// Insert or update the remark for a message.
    ///
    /// An existing row keeps its `created_at` and its first-remark
    /// `nickname`; only the text and `updated_at` change.
    pub fn set_remark(&self, message_id: &MessageId, nickname: &str, remark: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO message_remark (message_id, nickname, remark, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(message_id) DO UPDATE SET
                     remark     = excluded.remark,
                     updated_at = excluded.updated_at",
                params![message_id.as_str(), nickname, remark, now],
            )?;
            Ok(())
        })?;

        tracing::debug!(message_id = %message_id, "remark saved");
        Ok(())
    }

    /// Remark text for a message, if one was ever saved.
    pub fn get_remark(&self, message_id: &MessageId) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let remark = conn
                .query_row(
                    "SELECT remark FROM message_remark WHERE message_id = ?1",
                    params![message_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(remark)
        })
    }

    /// Full remark row for a message.
    pub fn get_remark_record(&self, message_id: &MessageId) -> Result<Option<Remark>> {
        self.with_conn(|conn| {
            let record = conn
                .query_row(
                    "SELECT message_id, nickname, remark, created_at, updated_at
                     FROM message_remark WHERE message_id = ?1",
                    params![message_id.as_str()],
                    row_to_remark,
                )
                .optional()?;
            Ok(record)
        })
    }

    /// Every saved remark text, keyed by message id, in a single scan.
    pub fn get_all_remarks(&self) -> Result<HashMap<MessageId, String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT message_id, remark FROM message_remark")?;
            let rows = stmt.query_map([], |row| {
                Ok((MessageId(row.get(0)?), row.get::<_, String>(1)?))
            })?;

            let mut remarks = HashMap::new();
            for row in rows {
                let (id, remark) = row?;
                remarks.insert(id, remark);
            }
            Ok(remarks)
        })
    }
}

fn row_to_remark(row: &rusqlite::Row<'_>) -> rusqlite::Result<Remark> {
    let message_id: String = row.get(0)?;
    let created_str: String = row.get(3)?;
    let updated_str: String = row.get(4)?;

    Ok(Remark {
        message_id: MessageId(message_id),
        nickname: row.get(1)?,
        remark: row.get(2)?,
        created_at: parse_timestamp(3, &created_str)?,
        updated_at: parse_timestamp(4, &updated_str)?,
    })
}
