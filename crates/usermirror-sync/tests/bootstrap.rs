use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use usermirror_core::{
    CollectionDescriptor, CollectionInfo, Distance, IndexEntry, IndexPoint, PayloadFilter,
    ScoredPoint, SyncError, UserRecord, VectorIndex,
};
use usermirror_sync::{
    CollectionBootstrapper, CollectionSpec, CollectionState, SyncConfig, UserIndex,
};
use usermirror_vectorstores::InMemoryIndex;

fn bootstrapper() -> (Arc<InMemoryIndex>, CollectionBootstrapper) {
    let index = Arc::new(InMemoryIndex::new());
    (index.clone(), CollectionBootstrapper::new(index))
}

#[tokio::test]
async fn users_collection_on_empty_index() {
    let (index, bootstrapper) = bootstrapper();
    let spec = CollectionSpec::new(SyncConfig::default().descriptor());

    let state = bootstrapper.ensure_collection(&spec).await.unwrap();

    assert_eq!(state, CollectionState::Created);
    assert_eq!(
        index.list_collections().await.unwrap(),
        vec!["users_collection".to_string()]
    );
    assert_eq!(index.len("users_collection").await, Some(0));

    let descriptor = index.descriptor("users_collection").await.unwrap();
    assert_eq!(descriptor.dimension, 128);
    assert_eq!(descriptor.distance, Distance::Cosine);
}

#[tokio::test]
async fn second_ensure_issues_no_create() {
    let (index, bootstrapper) = bootstrapper();
    let spec = CollectionSpec::new(CollectionDescriptor::new("users_collection", 128));

    bootstrapper.ensure_collection(&spec).await.unwrap();
    let state = bootstrapper.ensure_collection(&spec).await.unwrap();

    assert_eq!(state, CollectionState::AlreadyExists);
    assert_eq!(index.create_calls().await, 1);
}

#[tokio::test]
async fn seed_is_written_on_creation_only() {
    let (index, bootstrapper) = bootstrapper();
    let spec = CollectionSpec::new(CollectionDescriptor::new("cities", 2)).with_seed(vec![
        IndexPoint::new(1, vec![0.1, 0.2], HashMap::from([("city".into(), json!("Rome"))])),
    ]);

    bootstrapper.ensure_collection(&spec).await.unwrap();
    assert_eq!(index.len("cities").await, Some(1));

    index.delete("cities", &[1]).await.unwrap();
    bootstrapper.ensure_collection(&spec).await.unwrap();
    assert_eq!(index.len("cities").await, Some(0));
}

#[tokio::test]
async fn existing_collection_is_not_reconciled() {
    let (index, bootstrapper) = bootstrapper();
    index
        .create_collection(&CollectionDescriptor::new("users_collection", 8))
        .await
        .unwrap();

    let spec = CollectionSpec::new(
        CollectionDescriptor::new("users_collection", 128).with_distance(Distance::Dot),
    );
    let state = bootstrapper.ensure_collection(&spec).await.unwrap();

    assert_eq!(state, CollectionState::AlreadyExists);
    let descriptor = index.descriptor("users_collection").await.unwrap();
    assert_eq!(descriptor.dimension, 8);
    assert_eq!(descriptor.distance, Distance::Cosine);
}

#[tokio::test]
async fn bootstrap_creates_in_order() {
    let (index, bootstrapper) = bootstrapper();
    index
        .create_collection(&CollectionDescriptor::new("b", 4))
        .await
        .unwrap();

    let states = bootstrapper
        .bootstrap(&[
            CollectionSpec::new(CollectionDescriptor::new("a", 4)),
            CollectionSpec::new(CollectionDescriptor::new("b", 4)),
        ])
        .await
        .unwrap();

    assert_eq!(
        states,
        vec![CollectionState::Created, CollectionState::AlreadyExists]
    );
}

#[tokio::test]
async fn bootstrap_escalates_unreachable_index() {
    let (index, bootstrapper) = bootstrapper();
    index.set_offline(true);

    let err = bootstrapper
        .bootstrap(&[CollectionSpec::new(CollectionDescriptor::new("a", 4))])
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Connectivity(_)));
    assert_eq!(index.create_calls().await, 0);
}

/// Hands control back to the runtime after every listing, so concurrent
/// callers all observe the collection as missing.
struct YieldingIndex(Arc<InMemoryIndex>);

#[async_trait]
impl VectorIndex for YieldingIndex {
    async fn list_collections(&self) -> Result<Vec<String>, SyncError> {
        let names = self.0.list_collections().await;
        tokio::task::yield_now().await;
        names
    }

    async fn create_collection(&self, descriptor: &CollectionDescriptor) -> Result<(), SyncError> {
        self.0.create_collection(descriptor).await
    }

    async fn upsert(&self, collection: &str, points: Vec<IndexPoint>) -> Result<(), SyncError> {
        self.0.upsert(collection, points).await
    }

    async fn delete(&self, collection: &str, ids: &[u64]) -> Result<(), SyncError> {
        self.0.delete(collection, ids).await
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        filter: Option<&PayloadFilter>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, SyncError> {
        self.0.search(collection, vector, filter, limit).await
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&PayloadFilter>,
        limit: usize,
        with_vectors: bool,
    ) -> Result<Vec<IndexEntry>, SyncError> {
        self.0.scroll(collection, filter, limit, with_vectors).await
    }

    async fn describe_collection(&self, collection: &str) -> Result<CollectionInfo, SyncError> {
        self.0.describe_collection(collection).await
    }
}

#[tokio::test]
async fn concurrent_ensure_tolerates_lost_create() {
    let inner = Arc::new(InMemoryIndex::new());
    let bootstrapper = CollectionBootstrapper::new(Arc::new(YieldingIndex(inner.clone())));
    let spec = CollectionSpec::new(SyncConfig::default().descriptor());

    let (a, b) = tokio::join!(
        bootstrapper.ensure_collection(&spec),
        bootstrapper.ensure_collection(&spec)
    );

    let mut states = vec![a.unwrap(), b.unwrap()];
    states.sort_by_key(|state| *state == CollectionState::AlreadyExists);
    assert_eq!(
        states,
        vec![CollectionState::Created, CollectionState::AlreadyExists]
    );
    assert_eq!(inner.create_calls().await, 2);
    assert_eq!(inner.len("users_collection").await, Some(0));
}

#[tokio::test]
async fn concurrent_first_upserts_both_succeed() {
    let inner = Arc::new(InMemoryIndex::new());
    let users = UserIndex::from_config(
        Arc::new(YieldingIndex(inner.clone())),
        &SyncConfig::default(),
    );
    let alice = UserRecord::new("u1", "a@x.com").with_full_name("Alice");
    let bob = UserRecord::new("u2", "b@x.com");

    let (a, b) = tokio::join!(users.upsert(&alice), users.upsert(&bob));

    a.unwrap();
    b.unwrap();
    assert_eq!(inner.len("users_collection").await, Some(2));
}

#[tokio::test]
async fn failed_create_of_absent_collection_is_returned() {
    let inner = Arc::new(InMemoryIndex::new());
    let bootstrapper = CollectionBootstrapper::new(Arc::new(YieldingIndex(inner.clone())));
    let spec = CollectionSpec::new(CollectionDescriptor::new("a", 4));

    // The listing succeeds; everything after it fails.
    let ensure = bootstrapper.ensure_collection(&spec);
    tokio::pin!(ensure);
    assert!(futures::poll!(&mut ensure).is_pending());
    inner.set_offline(true);
    let err = ensure.await.unwrap_err();

    assert!(matches!(err, SyncError::Connectivity(_)));
}
