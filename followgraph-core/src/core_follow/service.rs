//! Collection reads and follow writes over an injected edge store

use std::sync::Arc;

use tracing::{debug, info};

use super::activity::{Activity, ActivityRequest};
use super::collection::{Collection, CollectionKind};
use crate::core_access::CallerContext;
use crate::core_graph::{Actor, ActorId, EdgeStore};
use crate::core_pagination::{PageRequest, PaginationEngine};
use crate::errors::{GraphError, GraphResult};

/// Methods advertised by OPTIONS on either collection
pub const ALLOWED_COLLECTION_METHODS: &[&str] = &["GET"];

/// Result of applying a follow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowOutcome {
    pub source: Actor,
    pub target: Actor,
    /// False when `source` already followed `target`
    pub created: bool,
}

/// Answers followers/following requests and applies new follow edges.
///
/// Callers reach this after the access gate; reads only need a caller of
/// either scope, writes need the source actor's own token.
#[derive(Clone)]
pub struct FollowCollectionService {
    store: Arc<dyn EdgeStore>,
    pagination: PaginationEngine,
    base_url: String,
}

impl FollowCollectionService {
    pub fn new(store: Arc<dyn EdgeStore>, pagination: PaginationEngine, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            store,
            pagination,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn store(&self) -> &Arc<dyn EdgeStore> {
        &self.store
    }

    pub fn pagination(&self) -> &PaginationEngine {
        &self.pagination
    }

    /// Collection URL without paging parameters
    pub fn collection_url(&self, kind: CollectionKind, nickname: &str) -> String {
        format!("{}/api/user/{}/{}", self.base_url, nickname, kind.path_segment())
    }

    pub async fn get_followers(
        &self,
        nickname: &str,
        caller: &CallerContext,
        page: PageRequest,
    ) -> GraphResult<Collection> {
        self.collection(CollectionKind::Followers, nickname, caller, page).await
    }

    pub async fn get_following(
        &self,
        nickname: &str,
        caller: &CallerContext,
        page: PageRequest,
    ) -> GraphResult<Collection> {
        self.collection(CollectionKind::Following, nickname, caller, page).await
    }

    pub async fn collection(
        &self,
        kind: CollectionKind,
        nickname: &str,
        caller: &CallerContext,
        page: PageRequest,
    ) -> GraphResult<Collection> {
        let subject = self.require_actor(nickname).await?;

        let edge_page = self
            .store
            .page(kind.direction(), &subject.id, page.offset, page.count)
            .await?;
        let window = self.pagination.window(page, edge_page.total);
        let id = self.collection_url(kind, nickname);
        let links = self.pagination.links(&id, &window);

        debug!(
            client_id = caller.client_id(),
            nickname,
            collection = kind.path_segment(),
            total = window.total,
            start = window.start,
            "Served collection page"
        );

        Ok(Collection {
            display_name: kind.display_name(&subject.display_name),
            author: subject.to_person(),
            total_items: edge_page.total,
            items: edge_page.actors.iter().map(Actor::to_person).collect(),
            items_per_page: page.count,
            start_index: window.start,
            links,
            object_types: Collection::person_object_types(),
            id,
        })
    }

    /// Make `source_nickname` follow `target_id` on behalf of `caller`
    pub async fn apply_follow(
        &self,
        caller: &CallerContext,
        source_nickname: &str,
        target_id: &ActorId,
    ) -> GraphResult<FollowOutcome> {
        let caller_actor = caller.require_actor()?;

        let source = self.require_actor(source_nickname).await?;
        if caller_actor.id != source.id {
            return Err(GraphError::Forbidden(format!(
                "{} may not post to {}'s feed",
                caller_actor.nickname, source.nickname
            )));
        }
        if &source.id == target_id {
            return Err(GraphError::BadRequest("An actor cannot follow itself".to_string()));
        }

        let target = self
            .store
            .actor_by_id(target_id)
            .await?
            .ok_or_else(|| GraphError::ActorNotFound(target_id.to_string()))?;

        let outcome = self.store.insert_edge(&source.id, &target.id).await?;
        if outcome.created {
            info!(source = %source.id, target = %target.id, "Follow edge created");
        } else {
            debug!(source = %source.id, target = %target.id, "Follow edge already present");
        }

        Ok(FollowOutcome {
            source,
            target,
            created: outcome.created,
        })
    }

    /// Handle a feed post; only the follow verb is accepted
    pub async fn post_activity(
        &self,
        caller: &CallerContext,
        nickname: &str,
        request: &ActivityRequest,
    ) -> GraphResult<Activity> {
        // Credentials are checked before the body is interpreted.
        caller.require_actor()?;
        let target_id = request.follow_target()?;
        let outcome = self.apply_follow(caller, nickname, &target_id).await?;
        Ok(Activity::follow(
            outcome.source.to_person(),
            outcome.target.to_person(),
        ))
    }

    /// OPTIONS discovery; never touches the store
    pub fn allowed_methods(&self) -> &'static [&'static str] {
        ALLOWED_COLLECTION_METHODS
    }

    async fn require_actor(&self, nickname: &str) -> GraphResult<Actor> {
        self.store
            .actor_by_nickname(nickname)
            .await?
            .ok_or_else(|| GraphError::ActorNotFound(nickname.to_string()))
    }
}
