//! Test fixtures for graph stores, callers, and bulk follows

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AuthConfig, PasswordHashConfig, SeedClient};
use crate::core_access::CallerContext;
use crate::core_admission::AdmissionQueue;
use crate::core_graph::{Actor, EdgeStore, MemoryEdgeStore, SqliteEdgeStore};
use crate::errors::GraphResult;

/// Hostname every fixture store uses
pub const TEST_HOSTNAME: &str = "localhost";

/// Client id and secret of the seeded test client
pub const TEST_CLIENT_ID: &str = "test-client";
pub const TEST_CLIENT_SECRET: &str = "test-client-secret";

pub fn memory_store() -> Arc<dyn EdgeStore> {
    Arc::new(MemoryEdgeStore::new(TEST_HOSTNAME))
}

/// Sqlite store in `dir`, small pool
pub fn sqlite_store(dir: &Path) -> GraphResult<Arc<dyn EdgeStore>> {
    let store = SqliteEdgeStore::with_pool_options(
        dir.join("followgraph.db"),
        TEST_HOSTNAME,
        4,
        Duration::from_secs(5),
    )?;
    Ok(Arc::new(store))
}

/// Register each nickname with itself as display name
pub async fn register_all(store: &dyn EdgeStore, nicknames: &[&str]) -> GraphResult<Vec<Actor>> {
    let mut actors = Vec::with_capacity(nicknames.len());
    for nickname in nicknames {
        actors.push(store.register_actor(nickname, nickname).await?);
    }
    Ok(actors)
}

/// `prefix0 .. prefix{n-1}`
pub fn numbered_nicknames(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{}{}", prefix, i)).collect()
}

pub fn consumer_caller() -> CallerContext {
    CallerContext::Consumer {
        client_id: TEST_CLIENT_ID.to_string(),
    }
}

pub fn actor_caller(actor: &Actor) -> CallerContext {
    CallerContext::Actor {
        client_id: TEST_CLIENT_ID.to_string(),
        actor: actor.clone(),
    }
}

/// One seeded client and argon2 parameters cheap enough for tests
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        clients: vec![SeedClient {
            client_id: TEST_CLIENT_ID.to_string(),
            client_secret: TEST_CLIENT_SECRET.to_string(),
        }],
        password_hash: PasswordHashConfig {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        },
    }
}

/// Every actor in `sources` follows `target`, at most `limit` at a time.
/// Returns how many edges were newly created.
pub async fn bulk_follow(
    store: Arc<dyn EdgeStore>,
    sources: &[Actor],
    target: &Actor,
    limit: usize,
) -> GraphResult<usize> {
    let queue = AdmissionQueue::new(limit);
    let mut handles = Vec::with_capacity(sources.len());
    for source in sources {
        let store = store.clone();
        let (source, target) = (source.id.clone(), target.id.clone());
        handles.push(
            queue
                .submit(async move { store.insert_edge(&source, &target).await })?,
        );
    }

    let mut created = 0;
    for handle in handles {
        let outcome = handle.await??;
        if outcome.created {
            created += 1;
        }
    }
    Ok(created)
}
