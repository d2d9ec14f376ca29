//! Follow graph scenarios run against both store backends

use std::sync::Arc;

use followgraph_core::core_admission::AdmissionQueue;
use followgraph_core::core_graph::{Actor, EdgeStore};
use followgraph_core::test_utils::{
    actor_caller, assert_completes_within, bulk_follow, consumer_caller, memory_store,
    numbered_nicknames, register_all, sqlite_store, DEFAULT_TEST_TIMEOUT,
};
use followgraph_core::{FollowCollectionService, PageRequest, PaginationEngine};

const BASE: &str = "http://localhost:4815";

fn service(store: Arc<dyn EdgeStore>) -> FollowCollectionService {
    FollowCollectionService::new(store, PaginationEngine::default(), BASE)
}

async fn register_pack(store: &dyn EdgeStore, prefix: &str, n: usize) -> Vec<Actor> {
    let names = numbered_nicknames(prefix, n);
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    register_all(store, &names).await.unwrap()
}

async fn hundred_followers(store: Arc<dyn EdgeStore>) {
    let nymeria = store.register_actor("nymeria", "Nymeria").await.unwrap();
    let wolves = register_pack(store.as_ref(), "wolf", 100).await;

    let created = assert_completes_within(
        DEFAULT_TEST_TIMEOUT,
        bulk_follow(store.clone(), &wolves, &nymeria, 10),
    )
    .await
    .unwrap();
    assert_eq!(created, 100);

    let service = service(store.clone());
    let caller = consumer_caller();

    let first = service
        .get_followers("nymeria", &caller, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(first.total_items, 100);
    assert_eq!(first.items.len(), 20);
    assert!(first.links.next.is_some());
    assert!(first.links.prev.is_none());

    let forty = service
        .get_followers("nymeria", &caller, PageRequest::new(0, 40).unwrap())
        .await
        .unwrap();
    assert_eq!(forty.items.len(), 40);
    assert!(forty.links.next.is_some());

    let all = service
        .get_followers("nymeria", &caller, PageRequest::new(0, 200).unwrap())
        .await
        .unwrap();
    assert_eq!(all.items.len(), 100);
    assert!(all.links.next.is_none());
    assert!(all.links.prev.is_none());

    let interior = service
        .get_followers("nymeria", &caller, PageRequest::new(20, 20).unwrap())
        .await
        .unwrap();
    assert_eq!(interior.start_index, 20);
    assert!(interior.links.next.is_some());
    assert!(interior.links.prev.is_some());

    // Pages tile the full listing without gaps or repeats
    assert_eq!(&all.items[..20], &first.items[..]);
    assert_eq!(&all.items[20..40], &interior.items[..]);

    let past_end = service
        .get_followers("nymeria", &caller, PageRequest::new(150, 20).unwrap())
        .await
        .unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total_items, 100);
    assert!(past_end.links.prev.is_some());
    assert!(past_end.links.next.is_none());
}

async fn following_fifty(store: Arc<dyn EdgeStore>) {
    let varys = store.register_actor("varys", "Varys").await.unwrap();
    let birds = register_pack(store.as_ref(), "bird", 50).await;
    let service = service(store.clone());
    let caller = actor_caller(&varys);

    let queue = AdmissionQueue::new(10);
    let handles: Vec<_> = birds
        .iter()
        .map(|bird| {
            let service = service.clone();
            let caller = caller.clone();
            let target = bird.id.clone();
            queue
                .submit(async move { service.apply_follow(&caller, "varys", &target).await })
                .unwrap()
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().created);
    }
    queue.drain().await.unwrap();

    let reader = consumer_caller();
    let first = service
        .get_following("varys", &reader, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(first.total_items, 50);
    assert_eq!(first.items.len(), 20);
    assert!(first.links.next.is_some());

    let all = service
        .get_following("varys", &reader, PageRequest::new(0, 100).unwrap())
        .await
        .unwrap();
    assert_eq!(all.items.len(), 50);
    assert!(all.links.next.is_none());
    assert!(all.links.prev.is_none());
}

async fn concurrent_same_pair(store: Arc<dyn EdgeStore>) {
    let actors = register_all(store.as_ref(), &["greatjon", "robb"]).await.unwrap();
    let (greatjon, robb) = (actors[0].clone(), actors[1].clone());

    let queue = AdmissionQueue::new(8);
    let handles: Vec<_> = (0..32)
        .map(|_| {
            let store = store.clone();
            let (source, target) = (greatjon.id.clone(), robb.id.clone());
            queue
                .submit(async move { store.insert_edge(&source, &target).await })
                .unwrap()
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().created {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    assert_eq!(store.count_followers(&robb.id).await.unwrap(), 1);
    assert_eq!(store.count_following(&greatjon.id).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_hundred_followers() {
    hundred_followers(memory_store()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_hundred_followers() {
    let dir = tempfile::tempdir().unwrap();
    hundred_followers(sqlite_store(dir.path()).unwrap()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_following_fifty() {
    following_fifty(memory_store()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_following_fifty() {
    let dir = tempfile::tempdir().unwrap();
    following_fifty(sqlite_store(dir.path()).unwrap()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_concurrent_same_pair() {
    concurrent_same_pair(memory_store()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_concurrent_same_pair() {
    let dir = tempfile::tempdir().unwrap();
    concurrent_same_pair(sqlite_store(dir.path()).unwrap()).await;
}

#[tokio::test]
async fn sqlite_edges_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = sqlite_store(dir.path()).unwrap();
        let actors = register_all(store.as_ref(), &["robb", "greatjon"]).await.unwrap();
        store.insert_edge(&actors[1].id, &actors[0].id).await.unwrap();
        store.close().await.unwrap();
    }

    let store = sqlite_store(dir.path()).unwrap();
    let service = service(store);
    let followers = service
        .get_followers("robb", &consumer_caller(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(followers.total_items, 1);
    assert_eq!(followers.items[0].preferred_username, "greatjon");
}
