//! SQLite schema for integration batches.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> SqliteResult<()> {
    // WAL for better concurrent read access
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current_version < 1 {
        apply_v1_schema(conn)?;
    }

    Ok(())
}

fn apply_v1_schema(conn: &Connection) -> SqliteResult<()> {
    // One batch per calendar period (YYYY-MM), append-only
    conn.execute(
        "CREATE TABLE IF NOT EXISTS integration_batches (
            period TEXT PRIMARY KEY,
            total_count INTEGER NOT NULL DEFAULT 0,
            cross_session_count INTEGER NOT NULL DEFAULT 0,
            temporal_evolution_count INTEGER NOT NULL DEFAULT 0,
            concept_synthesis_count INTEGER NOT NULL DEFAULT 0,
            mean_confidence REAL NOT NULL DEFAULT 0.0,
            last_updated TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS integrated_knowledge (
            id TEXT PRIMARY KEY,
            period TEXT NOT NULL,
            kind TEXT NOT NULL,
            method TEXT NOT NULL,
            confidence REAL NOT NULL,
            novelty REAL NOT NULL,
            created_at TEXT NOT NULL,
            record TEXT NOT NULL,
            FOREIGN KEY (period) REFERENCES integration_batches(period)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_knowledge_period ON integrated_knowledge(period)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_knowledge_kind ON integrated_knowledge(kind)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_knowledge_confidence ON integrated_knowledge(confidence)",
        [],
    )?;

    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Check whether the schema has been initialized.
pub fn is_initialized(conn: &Connection) -> bool {
    conn.query_row(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |_| Ok(()),
    )
    .is_ok()
}

/// Get the current schema version, or 0 if uninitialized.
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}
