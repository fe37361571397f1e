use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use usermirror_core::{
    CollectionDescriptor, CollectionInfo, Distance, IndexEntry, IndexPoint, Payload,
    PayloadFilter, ScoredPoint, SyncError, VectorIndex,
};

/// Stored point data, keyed by id in its collection.
struct StoredPoint {
    vector: Vec<f32>,
    payload: Payload,
}

struct StoredCollection {
    descriptor: CollectionDescriptor,
    points: BTreeMap<u64, StoredPoint>,
}

/// A request received by an [`InMemoryIndex`], recorded in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexCall {
    ListCollections,
    CreateCollection(String),
    Upsert { collection: String, ids: Vec<u64> },
    Delete { collection: String, ids: Vec<u64> },
    Search { collection: String, limit: usize },
    Scroll { collection: String, limit: usize },
    Describe(String),
}

/// In-memory [`VectorIndex`] with exact (brute-force) search.
///
/// Every request is recorded so callers can assert on what was sent, and the
/// index can be switched offline to simulate an unreachable service.
pub struct InMemoryIndex {
    collections: RwLock<BTreeMap<String, StoredCollection>>,
    calls: Mutex<Vec<IndexCall>>,
    offline: AtomicBool,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// When offline, every request fails with [`SyncError::Connectivity`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    /// All requests received so far.
    pub async fn calls(&self) -> Vec<IndexCall> {
        self.calls.lock().await.clone()
    }

    /// Number of `create_collection` requests received.
    pub async fn create_calls(&self) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| matches!(call, IndexCall::CreateCollection(_)))
            .count()
    }

    /// The stored point with `id`, if any, as `(vector, payload)`.
    pub async fn point(&self, collection: &str, id: u64) -> Option<(Vec<f32>, Payload)> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|c| c.points.get(&id))
            .map(|p| (p.vector.clone(), p.payload.clone()))
    }

    /// Number of points in `collection`, or `None` if it does not exist.
    pub async fn len(&self, collection: &str) -> Option<usize> {
        let collections = self.collections.read().await;
        collections.get(collection).map(|c| c.points.len())
    }

    /// Descriptor the collection was created with.
    pub async fn descriptor(&self, collection: &str) -> Option<CollectionDescriptor> {
        let collections = self.collections.read().await;
        collections.get(collection).map(|c| c.descriptor.clone())
    }

    async fn record(&self, call: IndexCall) -> Result<(), SyncError> {
        self.calls.lock().await.push(call);
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(SyncError::Connectivity("in-memory index is offline".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn missing(collection: &str) -> SyncError {
    SyncError::NotFound(format!("collection '{collection}' does not exist"))
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn list_collections(&self) -> Result<Vec<String>, SyncError> {
        self.record(IndexCall::ListCollections).await?;
        Ok(self.collections.read().await.keys().cloned().collect())
    }

    async fn create_collection(
        &self,
        descriptor: &CollectionDescriptor,
    ) -> Result<(), SyncError> {
        self.record(IndexCall::CreateCollection(descriptor.name.clone()))
            .await?;

        let mut collections = self.collections.write().await;
        if collections.contains_key(&descriptor.name) {
            return Err(SyncError::Index(format!(
                "collection '{}' already exists",
                descriptor.name
            )));
        }
        collections.insert(
            descriptor.name.clone(),
            StoredCollection {
                descriptor: descriptor.clone(),
                points: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<IndexPoint>) -> Result<(), SyncError> {
        self.record(IndexCall::Upsert {
            collection: collection.to_string(),
            ids: points.iter().map(|p| p.id).collect(),
        })
        .await?;

        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| missing(collection))?;

        // Validate the whole batch first so a bad point leaves the collection untouched.
        let dimension = target.descriptor.dimension;
        if let Some(bad) = points.iter().find(|p| p.vector.len() != dimension) {
            return Err(SyncError::Index(format!(
                "point {} has {} dimensions, collection '{collection}' expects {dimension}",
                bad.id,
                bad.vector.len()
            )));
        }

        for point in points {
            target.points.insert(
                point.id,
                StoredPoint {
                    vector: point.vector,
                    payload: point.payload,
                },
            );
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[u64]) -> Result<(), SyncError> {
        self.record(IndexCall::Delete {
            collection: collection.to_string(),
            ids: ids.to_vec(),
        })
        .await?;

        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| missing(collection))?;
        for id in ids {
            target.points.remove(id);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        filter: Option<&PayloadFilter>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, SyncError> {
        self.record(IndexCall::Search {
            collection: collection.to_string(),
            limit,
        })
        .await?;

        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| missing(collection))?;

        let distance = target.descriptor.distance;
        let mut scored: Vec<ScoredPoint> = target
            .points
            .iter()
            .filter(|(_, p)| filter.is_none_or(|f| f.matches(&p.payload)))
            .map(|(id, p)| ScoredPoint {
                id: *id,
                score: score(distance, vector, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();

        scored.sort_by(|a, b| closest_first(distance, a.score, b.score));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&PayloadFilter>,
        limit: usize,
        with_vectors: bool,
    ) -> Result<Vec<IndexEntry>, SyncError> {
        self.record(IndexCall::Scroll {
            collection: collection.to_string(),
            limit,
        })
        .await?;

        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| missing(collection))?;

        Ok(target
            .points
            .iter()
            .filter(|(_, p)| filter.is_none_or(|f| f.matches(&p.payload)))
            .take(limit)
            .map(|(id, p)| IndexEntry {
                id: *id,
                payload: p.payload.clone(),
                vector: with_vectors.then(|| p.vector.clone()),
            })
            .collect())
    }

    async fn describe_collection(&self, collection: &str) -> Result<CollectionInfo, SyncError> {
        self.record(IndexCall::Describe(collection.to_string()))
            .await?;

        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| missing(collection))?;
        Ok(CollectionInfo {
            name: collection.to_string(),
            points_count: target.points.len() as u64,
            dimension: Some(target.descriptor.dimension),
            distance: Some(target.descriptor.distance),
            status: "green".to_string(),
        })
    }
}

/// Score `b` against the query `a` under `distance`.
fn score(distance: Distance, a: &[f32], b: &[f32]) -> f32 {
    match distance {
        Distance::Cosine => cosine_similarity(a, b),
        Distance::Dot => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        Distance::Euclid => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
        Distance::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
    }
}

fn closest_first(distance: Distance, a: f32, b: f32) -> Ordering {
    match distance {
        Distance::Cosine | Distance::Dot => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        Distance::Euclid | Distance::Manhattan => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Compute cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
