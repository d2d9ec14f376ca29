//! Edge store abstraction and its backends

mod memory_store;
pub mod migrations;
mod sql_store;

pub use memory_store::MemoryEdgeStore;
pub use sql_store::SqliteEdgeStore;

use super::actor::{Actor, ActorId};
use super::edge::{EdgeDirection, EdgePage, FollowEdge, InsertOutcome};
use crate::config::{StoreBackend, StoreConfig};
use crate::errors::GraphResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Durable, ordered record of follow edges plus the actor directory they
/// reference.
///
/// Implementations must keep at most one edge per ordered pair even under
/// concurrent inserts, and must scan each adjacency list in insertion order.
#[async_trait]
pub trait EdgeStore: Send + Sync {
    /// Register a new actor. Fails with `Conflict` on a taken nickname.
    async fn register_actor(&self, nickname: &str, display_name: &str) -> GraphResult<Actor>;

    async fn actor_by_id(&self, id: &ActorId) -> GraphResult<Option<Actor>>;

    async fn actor_by_nickname(&self, nickname: &str) -> GraphResult<Option<Actor>>;

    async fn actor_exists(&self, id: &ActorId) -> GraphResult<bool> {
        Ok(self.actor_by_id(id).await?.is_some())
    }

    /// Insert `source -> target`. Idempotent; `NotFound` if either actor is unknown.
    async fn insert_edge(&self, source: &ActorId, target: &ActorId) -> GraphResult<InsertOutcome>;

    /// Existence check for a single ordered pair
    async fn find_edge(&self, source: &ActorId, target: &ActorId) -> GraphResult<Option<FollowEdge>>;

    async fn count(&self, direction: EdgeDirection, anchor: &ActorId) -> GraphResult<usize>;

    async fn scan(
        &self,
        direction: EdgeDirection,
        anchor: &ActorId,
        offset: usize,
        limit: usize,
    ) -> GraphResult<Vec<Actor>>;

    /// Total and page from a single snapshot
    async fn page(
        &self,
        direction: EdgeDirection,
        anchor: &ActorId,
        offset: usize,
        limit: usize,
    ) -> GraphResult<EdgePage>;

    /// Release backend resources. Later calls fail.
    async fn close(&self) -> GraphResult<()>;

    async fn count_followers(&self, target: &ActorId) -> GraphResult<usize> {
        self.count(EdgeDirection::Followers, target).await
    }

    async fn count_following(&self, source: &ActorId) -> GraphResult<usize> {
        self.count(EdgeDirection::Following, source).await
    }

    async fn scan_followers(
        &self,
        target: &ActorId,
        offset: usize,
        limit: usize,
    ) -> GraphResult<Vec<Actor>> {
        self.scan(EdgeDirection::Followers, target, offset, limit).await
    }

    async fn scan_following(
        &self,
        source: &ActorId,
        offset: usize,
        limit: usize,
    ) -> GraphResult<Vec<Actor>> {
        self.scan(EdgeDirection::Following, source, offset, limit).await
    }
}

/// Construct the configured backend
pub fn open_store(config: &StoreConfig, hostname: &str) -> GraphResult<Arc<dyn EdgeStore>> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Opening in-memory edge store");
            Ok(Arc::new(MemoryEdgeStore::new(hostname)))
        }
        StoreBackend::Sqlite => {
            info!(path = %config.database_path.display(), "Opening sqlite edge store");
            Ok(Arc::new(SqliteEdgeStore::open(config, hostname)?))
        }
    }
}
