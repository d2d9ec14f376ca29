//! Database migrations for the sqlite edge store
//!
//! Each migration is applied atomically and tracked in the
//! `graph_schema_version` table.

use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::info;

use crate::errors::GraphResult;

/// Current schema version for the follow graph
pub const CURRENT_GRAPH_SCHEMA_VERSION: i32 = 1;

/// Migration descriptor
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
}

/// All available migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Actors and follow edges",
        up_sql: r#"
            CREATE TABLE IF NOT EXISTS actors (
                id TEXT PRIMARY KEY,                    -- ActorId (acct:nick@host)
                nickname TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            -- seq gives every adjacency list a stable insertion order
            CREATE TABLE IF NOT EXISTS follow_edges (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id TEXT NOT NULL REFERENCES actors(id),
                target_id TEXT NOT NULL REFERENCES actors(id),
                created_at INTEGER NOT NULL,
                UNIQUE (source_id, target_id)
            );

            CREATE INDEX IF NOT EXISTS idx_follow_edges_target ON follow_edges(target_id, seq);
            CREATE INDEX IF NOT EXISTS idx_follow_edges_source ON follow_edges(source_id, seq);
        "#,
    }]
}

fn get_current_version(pool: &Pool<SqliteConnectionManager>) -> GraphResult<i32> {
    let conn = pool.get()?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS graph_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let version: Result<i32, _> = conn.query_row(
        "SELECT version FROM graph_schema_version ORDER BY version DESC LIMIT 1",
        [],
        |row| row.get(0),
    );

    Ok(version.unwrap_or(0))
}

/// Run all pending migrations
pub fn migrate(pool: &Pool<SqliteConnectionManager>) -> GraphResult<()> {
    let current_version = get_current_version(pool)?;
    let pending: Vec<_> = get_migrations()
        .into_iter()
        .filter(|m| m.version > current_version)
        .collect();

    if pending.is_empty() {
        return Ok(());
    }

    let mut conn = pool.get()?;
    for migration in pending {
        let tx = conn.transaction()?;
        tx.execute_batch(migration.up_sql)?;
        tx.execute(
            "INSERT INTO graph_schema_version (version, applied_at) VALUES (?, ?)",
            params![migration.version, Utc::now().timestamp_millis()],
        )?;
        tx.commit()?;

        info!(
            version = migration.version,
            description = migration.description,
            "Applied graph migration"
        );
    }

    Ok(())
}
