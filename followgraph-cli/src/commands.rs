//! Operator commands over a local sqlite follow graph

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use followgraph_core::config::Config;
use followgraph_core::core_admission::AdmissionQueue;
use followgraph_core::core_graph::{Actor, EdgeStore, SqliteEdgeStore};
use followgraph_core::{
    CallerContext, CollectionKind, FollowCollectionService, GraphError, PaginationEngine,
};
use serde_json::{json, Value};
use tracing::{info, warn};

const CLI_CLIENT_ID: &str = "followgraph-cli";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register an actor
    Register {
        nickname: String,
        #[arg(long)]
        display_name: Option<String>,
    },
    /// Make SOURCE follow TARGET (both nicknames)
    Follow { source: String, target: String },
    /// List an actor's followers
    Followers {
        nickname: String,
        #[arg(long)]
        offset: Option<String>,
        #[arg(long)]
        count: Option<String>,
    },
    /// List the actors a nickname follows
    Following {
        nickname: String,
        #[arg(long)]
        offset: Option<String>,
        #[arg(long)]
        count: Option<String>,
    },
    /// Register PREFIX0..PREFIX{count-1} and have each follow TARGET
    BulkFollow {
        target: String,
        #[arg(long, default_value = "follower")]
        prefix: String,
        #[arg(long, default_value_t = 100)]
        count: usize,
        /// Defaults to `admission.concurrency_limit` from the configuration
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

/// An opened store plus the collection service over it
pub struct Workspace {
    store: Arc<dyn EdgeStore>,
    service: FollowCollectionService,
    default_concurrency: usize,
}

impl Workspace {
    /// Open `database`; pool, paging and admission settings come from `config`
    pub fn open(database: &Path, base_url: &str, config: &Config) -> Result<Self> {
        let store: Arc<dyn EdgeStore> = Arc::new(
            SqliteEdgeStore::with_pool_options(
                database,
                &config.server.hostname,
                config.store.pool_size,
                config.store.busy_timeout,
            )
            .with_context(|| format!("opening {}", database.display()))?,
        );
        let service = FollowCollectionService::new(
            store.clone(),
            PaginationEngine::new(config.pagination.default_count),
            base_url,
        );
        Ok(Self {
            store,
            service,
            default_concurrency: config.admission.concurrency_limit,
        })
    }

    pub async fn close(&self) -> Result<()> {
        self.store.close().await?;
        Ok(())
    }

    pub async fn run(&self, command: Command) -> Result<Value> {
        match command {
            Command::Register {
                nickname,
                display_name,
            } => {
                let display_name = display_name.unwrap_or_else(|| nickname.clone());
                let actor = self.store.register_actor(&nickname, &display_name).await?;
                Ok(serde_json::to_value(actor.to_person())?)
            }
            Command::Follow { source, target } => {
                let source = self.actor(&source).await?;
                let target = self.actor(&target).await?;
                let outcome = self
                    .service
                    .apply_follow(&operator(&source), &source.nickname, &target.id)
                    .await?;
                Ok(json!({
                    "source": outcome.source.id,
                    "target": outcome.target.id,
                    "created": outcome.created,
                }))
            }
            Command::Followers {
                nickname,
                offset,
                count,
            } => self.list(CollectionKind::Followers, &nickname, offset, count).await,
            Command::Following {
                nickname,
                offset,
                count,
            } => self.list(CollectionKind::Following, &nickname, offset, count).await,
            Command::BulkFollow {
                target,
                prefix,
                count,
                concurrency,
            } => {
                let concurrency = concurrency.unwrap_or(self.default_concurrency);
                self.bulk_follow(&target, &prefix, count, concurrency).await
            }
        }
    }

    async fn actor(&self, nickname: &str) -> Result<Actor> {
        Ok(self
            .store
            .actor_by_nickname(nickname)
            .await?
            .ok_or_else(|| GraphError::ActorNotFound(nickname.to_string()))?)
    }

    async fn list(
        &self,
        kind: CollectionKind,
        nickname: &str,
        offset: Option<String>,
        count: Option<String>,
    ) -> Result<Value> {
        let page = self
            .service
            .pagination()
            .parse_request(offset.as_deref(), count.as_deref())?;
        let caller = CallerContext::Consumer {
            client_id: CLI_CLIENT_ID.to_string(),
        };
        let collection = self.service.collection(kind, nickname, &caller, page).await?;
        Ok(serde_json::to_value(collection)?)
    }

    async fn bulk_follow(
        &self,
        target: &str,
        prefix: &str,
        count: usize,
        concurrency: usize,
    ) -> Result<Value> {
        let target = self.actor(target).await?;
        let queue = AdmissionQueue::new(concurrency);
        info!(target = %target.id, count, concurrency = queue.limit(), "Starting bulk follow");

        let mut handles = Vec::with_capacity(count);
        for i in 0..count {
            let nickname = format!("{}{}", prefix, i);
            let service = self.service.clone();
            let target_id = target.id.clone();
            handles.push(queue.submit(async move {
                let source = match service.store().actor_by_nickname(&nickname).await? {
                    Some(actor) => actor,
                    None => service.store().register_actor(&nickname, &nickname).await?,
                };
                service
                    .apply_follow(&operator(&source), &nickname, &target_id)
                    .await
            })?);
        }

        let (mut created, mut existing, mut failed) = (0usize, 0usize, 0usize);
        for handle in handles {
            match handle.await {
                Ok(Ok(outcome)) if outcome.created => created += 1,
                Ok(Ok(_)) => existing += 1,
                Ok(Err(e)) => {
                    warn!("Follow failed: {}", e);
                    failed += 1;
                }
                Err(e) => {
                    warn!("Follow aborted: {}", e);
                    failed += 1;
                }
            }
        }
        queue.drain().await?;

        let total = self.store.count_followers(&target.id).await?;
        Ok(json!({
            "target": target.id,
            "created": created,
            "existing": existing,
            "failed": failed,
            "total_followers": total,
            "concurrency": queue.limit(),
        }))
    }
}

/// The local operator acts as whichever actor a command names
fn operator(actor: &Actor) -> CallerContext {
    CallerContext::Actor {
        client_id: CLI_CLIENT_ID.to_string(),
        actor: actor.clone(),
    }
}
