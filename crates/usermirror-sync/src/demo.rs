//! The example collection shipped next to the users collection.
//!
//! It holds a handful of city points so a freshly started index has something
//! to show in its dashboard.

use serde_json::json;
use usermirror_core::{CollectionDescriptor, IndexPoint, Payload, SyncError};

use crate::{CollectionBootstrapper, CollectionSpec, CollectionState};

pub const DEMO_COLLECTION: &str = "example_collection";
pub const DEMO_DIMENSION: usize = 4;

fn point(id: u64, vector: [f32; 4], payload: serde_json::Value) -> IndexPoint {
    let payload: Payload = match payload {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        _ => Payload::new(),
    };
    IndexPoint::new(id, vector.to_vec(), payload)
}

/// The example collection, seeded with Berlin and London.
pub fn demo_collection_spec() -> CollectionSpec {
    CollectionSpec::new(CollectionDescriptor::new(DEMO_COLLECTION, DEMO_DIMENSION)).with_seed(vec![
        point(1, [0.05, 0.61, 0.76, 0.74], json!({"city": "Berlin"})),
        point(2, [0.19, 0.81, 0.75, 0.11], json!({"city": "London"})),
    ])
}

/// Additional cities for the example collection.
pub fn demo_extra_points() -> Vec<IndexPoint> {
    vec![
        point(
            3,
            [0.25, 0.45, 0.65, 0.85],
            json!({"city": "Paris", "country": "France", "population": 2_100_000}),
        ),
        point(
            4,
            [0.15, 0.35, 0.55, 0.75],
            json!({"city": "Tokyo", "country": "Japan", "population": 14_000_000}),
        ),
        point(
            5,
            [0.30, 0.50, 0.70, 0.90],
            json!({"city": "New York", "country": "USA", "population": 8_000_000}),
        ),
    ]
}

/// Initialise the example collection, then the users collection.
///
/// A failure on the example collection is returned. A failure on the users
/// collection is only logged: user syncs retry the creation on every call.
pub async fn init_index(
    bootstrapper: &CollectionBootstrapper,
    users: &CollectionSpec,
) -> Result<(), SyncError> {
    bootstrapper.ensure_collection(&demo_collection_spec()).await?;

    if let Err(e) = bootstrapper.ensure_collection(users).await {
        tracing::error!("failed to initialize users collection: {e}");
    }
    Ok(())
}

/// Write [`demo_extra_points`] into the example collection, creating it
/// (without seed) when missing. Returns the number of points written.
pub async fn add_demo_points(bootstrapper: &CollectionBootstrapper) -> Result<usize, SyncError> {
    let spec = CollectionSpec::new(CollectionDescriptor::new(DEMO_COLLECTION, DEMO_DIMENSION));
    if bootstrapper.ensure_collection(&spec).await? == CollectionState::Created {
        tracing::info!("collection '{DEMO_COLLECTION}' was missing and has been created");
    }

    let points = demo_extra_points();
    let count = points.len();
    bootstrapper.index().upsert(DEMO_COLLECTION, points).await?;
    Ok(count)
}
