use std::sync::Arc;

use serde_json::json;
use usermirror_core::{CollectionDescriptor, SyncError, VectorIndex};
use usermirror_sync::demo::{
    add_demo_points, demo_collection_spec, demo_extra_points, init_index, DEMO_COLLECTION,
};
use usermirror_sync::{CollectionBootstrapper, CollectionSpec, SyncConfig};
use usermirror_vectorstores::InMemoryIndex;

fn users_spec() -> CollectionSpec {
    CollectionSpec::new(SyncConfig::default().descriptor())
}

#[test]
fn demo_spec_holds_two_cities() {
    let spec = demo_collection_spec();
    assert_eq!(spec.descriptor.name, "example_collection");
    assert_eq!(spec.descriptor.dimension, 4);
    assert_eq!(spec.seed.len(), 2);
    assert_eq!(spec.seed[0].vector, vec![0.05, 0.61, 0.76, 0.74]);
    assert_eq!(spec.seed[1].payload["city"], json!("London"));
}

#[test]
fn extra_points_carry_country_and_population() {
    let points = demo_extra_points();
    let ids: Vec<u64> = points.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![3, 4, 5]);
    assert_eq!(points[1].payload["country"], json!("Japan"));
    assert_eq!(points[2].payload["population"], json!(8_000_000));
}

#[tokio::test]
async fn init_index_creates_both_collections() {
    let index = Arc::new(InMemoryIndex::new());
    let bootstrapper = CollectionBootstrapper::new(index.clone());

    init_index(&bootstrapper, &users_spec()).await.unwrap();
    init_index(&bootstrapper, &users_spec()).await.unwrap();

    assert_eq!(
        index.list_collections().await.unwrap(),
        vec![DEMO_COLLECTION.to_string(), "users_collection".to_string()]
    );
    assert_eq!(index.len(DEMO_COLLECTION).await, Some(2));
    assert_eq!(index.len("users_collection").await, Some(0));
    assert_eq!(index.create_calls().await, 2);
}

#[tokio::test]
async fn init_index_escalates_demo_failure() {
    let index = Arc::new(InMemoryIndex::new());
    index.set_offline(true);
    let bootstrapper = CollectionBootstrapper::new(index);

    let err = init_index(&bootstrapper, &users_spec()).await.unwrap_err();
    assert!(matches!(err, SyncError::Connectivity(_)));
}

#[tokio::test]
async fn add_demo_points_creates_collection_when_missing() {
    let index = Arc::new(InMemoryIndex::new());
    let bootstrapper = CollectionBootstrapper::new(index.clone());

    let written = add_demo_points(&bootstrapper).await.unwrap();

    assert_eq!(written, 3);
    assert_eq!(index.len(DEMO_COLLECTION).await, Some(3));
    assert!(index.point(DEMO_COLLECTION, 1).await.is_none());
}

#[tokio::test]
async fn add_demo_points_extends_seeded_collection() {
    let index = Arc::new(InMemoryIndex::new());
    let bootstrapper = CollectionBootstrapper::new(index.clone());
    init_index(&bootstrapper, &users_spec()).await.unwrap();

    add_demo_points(&bootstrapper).await.unwrap();

    assert_eq!(index.len(DEMO_COLLECTION).await, Some(5));
    let (_, paris) = index.point(DEMO_COLLECTION, 3).await.unwrap();
    assert_eq!(paris["city"], json!("Paris"));
}

#[tokio::test]
async fn add_demo_points_rejects_mismatched_collection() {
    let index = Arc::new(InMemoryIndex::new());
    index
        .create_collection(&CollectionDescriptor::new(DEMO_COLLECTION, 8))
        .await
        .unwrap();

    let err = add_demo_points(&CollectionBootstrapper::new(index))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Index(_)));
}
