//! v003 -- Analytics ledger.
//!
//! Adds the append-only `analytics_event` log and the `analytics_stats` slot
//! table holding the today, weekly and lifetime counters as JSON.

use rusqlite::Connection;

const UP_SQL: &str = r#"
-- Append-only lifecycle event log
CREATE TABLE IF NOT EXISTS analytics_event (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    event        TEXT NOT NULL,               -- received / displayed / clicked / read / button_clicked
    message_id   TEXT NOT NULL,
    message_type TEXT NOT NULL,
    timestamp    TEXT NOT NULL                -- RFC-3339
);

CREATE INDEX IF NOT EXISTS idx_analytics_event_ts ON analytics_event(timestamp);

-- Aggregated counters: one JSON payload per slot (today / total / weekly)
CREATE TABLE IF NOT EXISTS analytics_stats (
    slot       TEXT PRIMARY KEY NOT NULL,
    payload    TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
