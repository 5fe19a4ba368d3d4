//! SQL schema for the event store.

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: u32 = 1;

/// Create the `events` table and its indexes if they do not already exist.
/// Idempotent: safe to call on every startup.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
        [],
    )?;

    let current_version: Option<u32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .ok();

    if current_version.is_none() {
        create_tables(conn)?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [SCHEMA_VERSION],
        )?;
    }

    Ok(())
}

fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id BLOB PRIMARY KEY,
            author BLOB NOT NULL,
            created_at INTEGER NOT NULL,
            kind INTEGER NOT NULL,
            d_tag TEXT NOT NULL,
            tags TEXT NOT NULL,
            content TEXT NOT NULL,
            signature BLOB NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_events_replaceable
            ON events(author, kind, d_tag)
            WHERE kind >= 10000 AND kind < 20000",
        [],
    )?;

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_events_parameterized
            ON events(author, kind, d_tag)
            WHERE kind >= 30000 AND kind < 40000",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_kind ON events(kind)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_author ON events(author)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_created_at ON events(created_at)",
        [],
    )?;

    Ok(())
}
