//! In-memory edge store
//!
//! Each actor owns two adjacency lists (followers and following), each behind
//! its own mutex. An insert locks the target's followers list first, which
//! serializes same-pair inserts, then the source's following list. Locks are
//! always taken in that order, so inserts for unrelated targets never contend.

use super::EdgeStore;
use crate::core_graph::actor::{validate_nickname, Actor, ActorId};
use crate::core_graph::edge::{EdgeDirection, EdgePage, FollowEdge, InsertOutcome};
use crate::errors::{GraphError, GraphResult};
use crate::metrics;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Debug, Clone)]
struct AdjacencyEntry {
    /// The neighbour on the far end of the edge
    actor: Actor,
    edge: FollowEdge,
}

/// Insertion-ordered neighbours of one actor
#[derive(Debug, Default)]
struct Adjacency {
    entries: Vec<AdjacencyEntry>,
    index: HashMap<ActorId, usize>,
}

impl Adjacency {
    fn contains(&self, id: &ActorId) -> bool {
        self.index.contains_key(id)
    }

    fn get(&self, id: &ActorId) -> Option<&FollowEdge> {
        self.index.get(id).map(|&i| &self.entries[i].edge)
    }

    fn push(&mut self, actor: Actor, edge: FollowEdge) {
        self.index.insert(actor.id.clone(), self.entries.len());
        self.entries.push(AdjacencyEntry { actor, edge });
    }

    fn slice(&self, offset: usize, limit: usize) -> Vec<Actor> {
        self.entries
            .iter()
            .skip(offset)
            .take(limit)
            .map(|e| e.actor.clone())
            .collect()
    }
}

type AdjacencySlot = Arc<Mutex<Adjacency>>;

#[derive(Default)]
struct ActorDirectory {
    by_id: HashMap<ActorId, Actor>,
    by_nickname: HashMap<String, ActorId>,
    followers: HashMap<ActorId, AdjacencySlot>,
    following: HashMap<ActorId, AdjacencySlot>,
}

/// Edge store kept entirely in process memory
pub struct MemoryEdgeStore {
    hostname: String,
    directory: RwLock<ActorDirectory>,
    next_seq: AtomicU64,
    closed: AtomicBool,
}

impl MemoryEdgeStore {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            directory: RwLock::new(ActorDirectory::default()),
            next_seq: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> GraphResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(GraphError::Store("edge store is closed".to_string()));
        }
        Ok(())
    }

    async fn slot(&self, direction: EdgeDirection, anchor: &ActorId) -> GraphResult<AdjacencySlot> {
        let directory = self.directory.read().await;
        let slots = match direction {
            EdgeDirection::Followers => &directory.followers,
            EdgeDirection::Following => &directory.following,
        };
        slots
            .get(anchor)
            .cloned()
            .ok_or_else(|| GraphError::ActorNotFound(anchor.to_string()))
    }
}

#[async_trait]
impl EdgeStore for MemoryEdgeStore {
    async fn register_actor(&self, nickname: &str, display_name: &str) -> GraphResult<Actor> {
        self.ensure_open()?;
        validate_nickname(nickname)?;

        let mut directory = self.directory.write().await;
        if directory.by_nickname.contains_key(nickname) {
            return Err(GraphError::Conflict(format!("nickname already taken: {}", nickname)));
        }

        let id = ActorId::for_nickname(nickname, &self.hostname);
        let actor = Actor::new(id.clone(), nickname, display_name);

        directory.by_nickname.insert(nickname.to_string(), id.clone());
        directory.by_id.insert(id.clone(), actor.clone());
        directory.followers.insert(id.clone(), AdjacencySlot::default());
        directory.following.insert(id, AdjacencySlot::default());

        debug!(nickname, "Registered actor");
        Ok(actor)
    }

    async fn actor_by_id(&self, id: &ActorId) -> GraphResult<Option<Actor>> {
        self.ensure_open()?;
        Ok(self.directory.read().await.by_id.get(id).cloned())
    }

    async fn actor_by_nickname(&self, nickname: &str) -> GraphResult<Option<Actor>> {
        self.ensure_open()?;
        let directory = self.directory.read().await;
        Ok(directory
            .by_nickname
            .get(nickname)
            .and_then(|id| directory.by_id.get(id))
            .cloned())
    }

    async fn insert_edge(&self, source: &ActorId, target: &ActorId) -> GraphResult<InsertOutcome> {
        self.ensure_open()?;

        let (source_actor, target_actor, followers_slot, following_slot) = {
            let directory = self.directory.read().await;
            let source_actor = directory
                .by_id
                .get(source)
                .cloned()
                .ok_or_else(|| GraphError::ActorNotFound(source.to_string()))?;
            let target_actor = directory
                .by_id
                .get(target)
                .cloned()
                .ok_or_else(|| GraphError::ActorNotFound(target.to_string()))?;
            let followers_slot = directory
                .followers
                .get(target)
                .cloned()
                .ok_or_else(|| GraphError::Internal(format!("missing followers list for {}", target)))?;
            let following_slot = directory
                .following
                .get(source)
                .cloned()
                .ok_or_else(|| GraphError::Internal(format!("missing following list for {}", source)))?;
            (source_actor, target_actor, followers_slot, following_slot)
        };

        // Lock order: target's followers, then source's following.
        let mut followers = followers_slot.lock().await;
        if followers.contains(source) {
            metrics::record_edge_insert(false);
            return Ok(InsertOutcome { created: false });
        }
        let mut following = following_slot.lock().await;

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let edge = FollowEdge {
            source: source.clone(),
            target: target.clone(),
            created_at: Utc::now(),
            seq,
        };
        followers.push(source_actor, edge.clone());
        following.push(target_actor, edge);

        debug!(%source, %target, seq, "Inserted follow edge");
        metrics::record_edge_insert(true);
        Ok(InsertOutcome { created: true })
    }

    async fn find_edge(&self, source: &ActorId, target: &ActorId) -> GraphResult<Option<FollowEdge>> {
        self.ensure_open()?;
        let slot = self.slot(EdgeDirection::Followers, target).await?;
        let followers = slot.lock().await;
        Ok(followers.get(source).cloned())
    }

    async fn count(&self, direction: EdgeDirection, anchor: &ActorId) -> GraphResult<usize> {
        self.ensure_open()?;
        let slot = self.slot(direction, anchor).await?;
        let adjacency = slot.lock().await;
        Ok(adjacency.entries.len())
    }

    async fn scan(
        &self,
        direction: EdgeDirection,
        anchor: &ActorId,
        offset: usize,
        limit: usize,
    ) -> GraphResult<Vec<Actor>> {
        self.ensure_open()?;
        let slot = self.slot(direction, anchor).await?;
        let adjacency = slot.lock().await;
        Ok(adjacency.slice(offset, limit))
    }

    async fn page(
        &self,
        direction: EdgeDirection,
        anchor: &ActorId,
        offset: usize,
        limit: usize,
    ) -> GraphResult<EdgePage> {
        self.ensure_open()?;
        let slot = self.slot(direction, anchor).await?;
        let adjacency = slot.lock().await;
        metrics::record_scan(direction);
        Ok(EdgePage {
            total: adjacency.entries.len(),
            actors: adjacency.slice(offset, limit),
        })
    }

    async fn close(&self) -> GraphResult<()> {
        self.closed.store(true, Ordering::Release);
        debug!("Closed in-memory edge store");
        Ok(())
    }
}
