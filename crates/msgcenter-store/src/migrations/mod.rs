//! Database migration runner.
//!
//! Migrations are executed in order on every [`Database::new`] /
//! [`Database::open_at`] call. The schema version lives in the
//! `user_version` pragma. Every step checks for existing structures before
//! creating them, so re-running a step is harmless.
//!
//! [`Database::new`]: crate::Database::new
//! [`Database::open_at`]: crate::Database::open_at

pub mod v001_initial;
pub mod v002_pinned;
pub mod v003_analytics;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version. Bump this and add a new migration module whenever
/// the schema changes.
pub const CURRENT_VERSION: u32 = 3;

type Step = fn(&Connection) -> std::result::Result<(), rusqlite::Error>;

/// Ordered schema steps; entry `i` upgrades from version `i` to `i + 1`.
const STEPS: &[(u32, &str, Step)] = &[
    (1, "v001_initial", v001_initial::up),
    (2, "v002_pinned", v002_pinned::up),
    (3, "v003_analytics", v003_analytics::up),
];

/// Read the schema version recorded in the database (0 for a new file).
pub fn schema_version(conn: &Connection) -> Result<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Run all pending migrations against the open connection.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    run_migrations_to(conn, CURRENT_VERSION)
}

/// Bring the schema from its recorded version up to `target`.
///
/// Pending steps and the final version bump share one transaction, so a
/// failing step leaves the database at its previous version.
pub fn run_migrations_to(conn: &mut Connection, target: u32) -> Result<()> {
    let current = schema_version(conn)?;

    tracing::info!(
        current_version = current,
        target_version = target,
        "checking database migrations"
    );

    if current >= target {
        return Ok(());
    }

    let tx = conn.transaction()?;

    for (version, name, up) in STEPS {
        if *version <= current || *version > target {
            continue;
        }

        tracing::info!(version, "applying migration {name}");
        up(&tx).map_err(|e| {
            tracing::error!(version, error = %e, "migration {name} failed");
            StoreError::Migration {
                version: *version,
                reason: e.to_string(),
            }
        })?;
    }

    tx.pragma_update(None, "user_version", target)?;
    tx.commit()?;

    tracing::info!(version = target, "database schema up to date");
    Ok(())
}

/// Whether `table` already has a column named `column`.
pub(crate) fn column_exists(
    conn: &Connection,
    table: &str,
    column: &str,
) -> std::result::Result<bool, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;

    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .unwrap();
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        names
    }

    fn tables(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        names
    }

    #[test]
    fn fresh_database_reaches_current_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);

        run_migrations(&mut conn).unwrap();

        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
        let tables = tables(&conn);
        for name in ["analytics_event", "analytics_stats", "message_remark", "message_state"] {
            assert!(tables.contains(&name.to_string()), "missing table {name}");
        }
        assert!(columns(&conn, "message_state").contains(&"is_pinned".to_string()));
    }

    #[test]
    fn running_twice_matches_running_once() {
        let mut once = Connection::open_in_memory().unwrap();
        run_migrations(&mut once).unwrap();

        let mut twice = Connection::open_in_memory().unwrap();
        run_migrations(&mut twice).unwrap();
        run_migrations(&mut twice).unwrap();

        assert_eq!(tables(&once), tables(&twice));
        assert_eq!(columns(&once, "message_state"), columns(&twice, "message_state"));
        assert_eq!(schema_version(&twice).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn v1_rows_survive_pinned_column_addition() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations_to(&mut conn, 1).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 1);
        assert!(!columns(&conn, "message_state").contains(&"is_pinned".to_string()));

        conn.execute(
            "INSERT INTO message_state (message_id, is_read, unread_count, updated_at)
             VALUES ('msg_7', 1, 0, '2024-01-01T00:00:00+00:00'),
                    ('msg_8', 0, 4, '2024-01-01T00:00:00+00:00')",
            [],
        )
        .unwrap();

        run_migrations(&mut conn).unwrap();

        let rows: Vec<(String, bool, u32, bool)> = {
            let mut stmt = conn
                .prepare(
                    "SELECT message_id, is_read, unread_count, is_pinned
                     FROM message_state ORDER BY message_id",
                )
                .unwrap();
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                })
                .unwrap()
                .collect::<std::result::Result<_, _>>()
                .unwrap();
            rows
        };

        assert_eq!(
            rows,
            vec![
                ("msg_7".to_string(), true, 0, false),
                ("msg_8".to_string(), false, 4, false),
            ]
        );
    }

    #[test]
    fn steps_rerun_from_intermediate_version_are_harmless() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO message_state (message_id, is_read, unread_count, is_pinned, updated_at)
             VALUES ('msg_1', 0, 2, 1, '2024-01-01T00:00:00+00:00')",
            [],
        )
        .unwrap();

        // Pretend the version marker was lost after step 1.
        conn.pragma_update(None, "user_version", 1).unwrap();
        run_migrations(&mut conn).unwrap();

        let pinned: bool = conn
            .query_row(
                "SELECT is_pinned FROM message_state WHERE message_id = 'msg_1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(pinned);
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn failing_step_keeps_previous_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations_to(&mut conn, 1).unwrap();

        // A conflicting object under the name step 3 wants for its table.
        conn.execute_batch("CREATE VIEW analytics_event AS SELECT 1 AS id;")
            .unwrap();

        let err = run_migrations(&mut conn).unwrap_err();
        assert!(matches!(err, StoreError::Migration { version: 3, .. }));
        assert_eq!(schema_version(&conn).unwrap(), 1);
        assert!(!columns(&conn, "message_state").contains(&"is_pinned".to_string()));
    }
}
