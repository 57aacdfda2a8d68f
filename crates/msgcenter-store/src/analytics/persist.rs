//! Ledger persistence: the event log and the aggregated counter slots.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use msgcenter_shared::{MessageId, MessageType};

use super::stats::{DailyStats, EventRecord, MessageEvent};
use crate::database::{conversion_error, parse_timestamp, Database};
use crate::error::Result;

pub(crate) const SLOT_TODAY: &str = "today";
pub(crate) const SLOT_TOTAL: &str = "total";
pub(crate) const SLOT_WEEKLY: &str = "weekly";

impl Database {
    /// Append an event and store the counters it produced, atomically.
    pub(crate) fn persist_event(
        &self,
        record: &EventRecord,
        today: &DailyStats,
        total: &DailyStats,
        weekly: &[DailyStats],
    ) -> Result<()> {
        self.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO analytics_event (id, event, message_id, message_type, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id.to_string(),
                    record.event.as_str(),
                    record.message_id.as_str(),
                    record.message_type.as_str(),
                    record.timestamp.to_rfc3339(),
                ],
            )?;
            write_slots(tx, today, total, weekly)
        })
    }

    /// Store the three counter slots without an event.
    pub(crate) fn persist_stats(
        &self,
        today: &DailyStats,
        total: &DailyStats,
        weekly: &[DailyStats],
    ) -> Result<()> {
        self.with_transaction(|tx| write_slots(tx, today, total, weekly))
    }

    pub(crate) fn load_stats_slot<T: DeserializeOwned>(&self, slot: &str) -> Result<Option<T>> {
        let payload: Option<String> = self.with_conn(|conn| {
            let payload = conn
                .query_row(
                    "SELECT payload FROM analytics_stats WHERE slot = ?1",
                    params![slot],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(payload)
        })?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Most recent events first.
    pub fn recent_events(&self, limit: u32) -> Result<Vec<EventRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, event, message_id, message_type, timestamp
                 FROM analytics_event
                 ORDER BY timestamp DESC, rowid DESC
                 LIMIT ?1",
            )?;

            let rows = stmt.query_map(params![limit], row_to_event)?;

            let mut events = Vec::new();
            for row in rows {
                events.push(row?);
            }
            Ok(events)
        })
    }

    /// Drop the event log and every counter slot.
    pub(crate) fn clear_analytics(&self) -> Result<()> {
        self.with_transaction(|tx| {
            tx.execute_batch("DELETE FROM analytics_event; DELETE FROM analytics_stats;")?;
            Ok(())
        })
    }
}

fn write_slots(
    conn: &Connection,
    today: &DailyStats,
    total: &DailyStats,
    weekly: &[DailyStats],
) -> Result<()> {
    write_slot(conn, SLOT_TODAY, today)?;
    write_slot(conn, SLOT_TOTAL, total)?;
    write_slot(conn, SLOT_WEEKLY, weekly)?;
    Ok(())
}

fn write_slot<T: Serialize + ?Sized>(conn: &Connection, slot: &str, value: &T) -> Result<()> {
    let payload = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO analytics_stats (slot, payload, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(slot) DO UPDATE SET
             payload    = excluded.payload,
             updated_at = excluded.updated_at",
        params![slot, payload, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRecord> {
    let id_str: String = row.get(0)?;
    let event_str: String = row.get(1)?;
    let message_id: String = row.get(2)?;
    let type_str: String = row.get(3)?;
    let ts_str: String = row.get(4)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conversion_error(0, e))?;
    let event = event_str
        .parse::<MessageEvent>()
        .map_err(|e| conversion_error(1, e))?;
    let message_type = type_str
        .parse::<MessageType>()
        .map_err(|e| conversion_error(3, e))?;

    Ok(EventRecord {
        id,
        event,
        message_id: MessageId(message_id),
        message_type,
        timestamp: parse_timestamp(4, &ts_str)?,
    })
}
