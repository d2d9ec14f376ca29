//! SQLite-backed edge store
//!
//! Pair uniqueness is enforced by the `UNIQUE (source_id, target_id)`
//! constraint; inserts run inside `BEGIN IMMEDIATE` transactions so the
//! actor checks and the insert commit together. All connection work runs on
//! the blocking pool. `close` checkpoints the WAL and drops the pool; the
//! connections go away once in-flight operations finish.

use super::migrations;
use super::EdgeStore;
use crate::config::StoreConfig;
use crate::core_graph::actor::{validate_nickname, Actor, ActorId};
use crate::core_graph::edge::{EdgeDirection, EdgePage, FollowEdge, InsertOutcome};
use crate::errors::{GraphError, GraphResult};
use crate::metrics;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, error};

/// SQLite edge store over an r2d2 connection pool
pub struct SqliteEdgeStore {
    /// `None` once closed
    pool: RwLock<Option<Arc<Pool<SqliteConnectionManager>>>>,
    hostname: String,
}

impl SqliteEdgeStore {
    /// Open (and migrate) the database described by `config`
    pub fn open(config: &StoreConfig, hostname: &str) -> GraphResult<Self> {
        Self::with_pool_options(
            &config.database_path,
            hostname,
            config.pool_size,
            config.busy_timeout,
        )
    }

    /// Open a database file with explicit pool settings
    pub fn with_pool_options<P: AsRef<Path>>(
        db_path: P,
        hostname: &str,
        pool_size: u32,
        busy_timeout: Duration,
    ) -> GraphResult<Self> {
        let manager = SqliteConnectionManager::file(db_path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        });
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e| GraphError::Store(format!("Failed to create connection pool: {}", e)))?;

        migrations::migrate(&pool)?;

        Ok(Self {
            pool: RwLock::new(Some(Arc::new(pool))),
            hostname: hostname.to_string(),
        })
    }

    fn pool(&self) -> GraphResult<Arc<Pool<SqliteConnectionManager>>> {
        self.pool
            .read()
            .map_err(|_| GraphError::Internal("edge store lock poisoned".to_string()))?
            .clone()
            .ok_or_else(|| GraphError::Store("edge store is closed".to_string()))
    }

    /// Run `f` with a pooled connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> GraphResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> GraphResult<T> + Send + 'static,
    {
        let pool = self.pool()?;
        let result = tokio::task::spawn_blocking(move || -> GraphResult<T> {
            let mut conn = pool.get()?;
            f(&mut *conn)
        })
        .await?;

        if let Err(GraphError::Store(ref msg)) = result {
            error!(error = %msg, "Edge store operation failed");
        }
        result
    }
}

fn actor_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Actor> {
    let id: String = row.get(0)?;
    Ok(Actor::new(ActorId::new(id), row.get::<_, String>(1)?, row.get::<_, String>(2)?))
}

fn lookup_actor(conn: &Connection, id: &ActorId) -> GraphResult<Option<Actor>> {
    Ok(conn
        .query_row(
            "SELECT id, nickname, display_name FROM actors WHERE id = ?1",
            params![id.as_str()],
            actor_from_row,
        )
        .optional()?)
}

fn count_edges(conn: &Connection, direction: EdgeDirection, anchor: &ActorId) -> GraphResult<usize> {
    let sql = match direction {
        EdgeDirection::Followers => "SELECT COUNT(*) FROM follow_edges WHERE target_id = ?1",
        EdgeDirection::Following => "SELECT COUNT(*) FROM follow_edges WHERE source_id = ?1",
    };
    let count: i64 = conn.query_row(sql, params![anchor.as_str()], |row| row.get(0))?;
    Ok(count as usize)
}

fn scan_edges(
    conn: &Connection,
    direction: EdgeDirection,
    anchor: &ActorId,
    offset: usize,
    limit: usize,
) -> GraphResult<Vec<Actor>> {
    let sql = match direction {
        EdgeDirection::Followers => {
            "SELECT a.id, a.nickname, a.display_name
             FROM follow_edges e JOIN actors a ON a.id = e.source_id
             WHERE e.target_id = ?1
             ORDER BY e.seq ASC
             LIMIT ?2 OFFSET ?3"
        }
        EdgeDirection::Following => {
            "SELECT a.id, a.nickname, a.display_name
             FROM follow_edges e JOIN actors a ON a.id = e.target_id
             WHERE e.source_id = ?1
             ORDER BY e.seq ASC
             LIMIT ?2 OFFSET ?3"
        }
    };
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let offset = i64::try_from(offset).unwrap_or(i64::MAX);

    let mut stmt = conn.prepare_cached(sql)?;
    let actors = stmt
        .query_map(params![anchor.as_str(), limit, offset], actor_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(actors)
}

fn require_actor(conn: &Connection, id: &ActorId) -> GraphResult<()> {
    if lookup_actor(conn, id)?.is_none() {
        return Err(GraphError::ActorNotFound(id.to_string()));
    }
    Ok(())
}

#[async_trait]
impl EdgeStore for SqliteEdgeStore {
    async fn register_actor(&self, nickname: &str, display_name: &str) -> GraphResult<Actor> {
        validate_nickname(nickname)?;
        let actor = Actor::new(
            ActorId::for_nickname(nickname, &self.hostname),
            nickname,
            display_name,
        );

        let record = actor.clone();
        self.with_conn(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let taken: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM actors WHERE nickname = ?1",
                    params![record.nickname],
                    |row| row.get(0),
                )
                .optional()?;
            if taken.is_some() {
                return Err(GraphError::Conflict(format!(
                    "nickname already taken: {}",
                    record.nickname
                )));
            }
            tx.execute(
                "INSERT INTO actors (id, nickname, display_name, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.id.as_str(),
                    record.nickname,
                    record.display_name,
                    Utc::now().timestamp_millis()
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await?;

        debug!(nickname, "Registered actor");
        Ok(actor)
    }

    async fn actor_by_id(&self, id: &ActorId) -> GraphResult<Option<Actor>> {
        let id = id.clone();
        self.with_conn(move |conn| lookup_actor(conn, &id)).await
    }

    async fn actor_by_nickname(&self, nickname: &str) -> GraphResult<Option<Actor>> {
        let nickname = nickname.to_string();
        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT id, nickname, display_name FROM actors WHERE nickname = ?1",
                    params![nickname],
                    actor_from_row,
                )
                .optional()?)
        })
        .await
    }

    async fn insert_edge(&self, source: &ActorId, target: &ActorId) -> GraphResult<InsertOutcome> {
        let (source, target) = (source.clone(), target.clone());
        let outcome = self
            .with_conn(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                require_actor(&tx, &source)?;
                require_actor(&tx, &target)?;
                let inserted = tx.execute(
                    "INSERT INTO follow_edges (source_id, target_id, created_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(source_id, target_id) DO NOTHING",
                    params![source.as_str(), target.as_str(), Utc::now().timestamp_millis()],
                )?;
                tx.commit()?;
                Ok(InsertOutcome { created: inserted == 1 })
            })
            .await?;

        metrics::record_edge_insert(outcome.created);
        Ok(outcome)
    }

    async fn find_edge(&self, source: &ActorId, target: &ActorId) -> GraphResult<Option<FollowEdge>> {
        let (source, target) = (source.clone(), target.clone());
        self.with_conn(move |conn| {
            let row: Option<(i64, i64)> = conn
                .query_row(
                    "SELECT seq, created_at FROM follow_edges WHERE source_id = ?1 AND target_id = ?2",
                    params![source.as_str(), target.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            Ok(row.map(|(seq, created_at)| FollowEdge {
                created_at: Utc
                    .timestamp_millis_opt(created_at)
                    .single()
                    .unwrap_or_else(Utc::now),
                seq: seq as u64,
                source,
                target,
            }))
        })
        .await
    }

    async fn count(&self, direction: EdgeDirection, anchor: &ActorId) -> GraphResult<usize> {
        let anchor = anchor.clone();
        self.with_conn(move |conn| {
            require_actor(conn, &anchor)?;
            count_edges(conn, direction, &anchor)
        })
        .await
    }

    async fn scan(
        &self,
        direction: EdgeDirection,
        anchor: &ActorId,
        offset: usize,
        limit: usize,
    ) -> GraphResult<Vec<Actor>> {
        let anchor = anchor.clone();
        self.with_conn(move |conn| {
            require_actor(conn, &anchor)?;
            scan_edges(conn, direction, &anchor, offset, limit)
        })
        .await
    }

    async fn page(
        &self,
        direction: EdgeDirection,
        anchor: &ActorId,
        offset: usize,
        limit: usize,
    ) -> GraphResult<EdgePage> {
        let anchor = anchor.clone();
        let page = self
            .with_conn(move |conn| {
                // One read transaction so the total and the rows agree.
                let tx = conn.transaction()?;
                require_actor(&tx, &anchor)?;
                let total = count_edges(&tx, direction, &anchor)?;
                let actors = scan_edges(&tx, direction, &anchor, offset, limit)?;
                tx.commit()?;
                Ok(EdgePage { total, actors })
            })
            .await?;

        metrics::record_scan(direction);
        Ok(page)
    }

    async fn close(&self) -> GraphResult<()> {
        let pool = self
            .pool
            .write()
            .map_err(|_| GraphError::Internal("edge store lock poisoned".to_string()))?
            .take();
        let Some(pool) = pool else {
            return Ok(());
        };

        tokio::task::spawn_blocking(move || -> GraphResult<()> {
            let conn = pool.get()?;
            conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
            drop(conn);
            drop(pool);
            Ok(())
        })
        .await??;
        debug!("Closed sqlite edge store");
        Ok(())
    }
}
