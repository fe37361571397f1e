use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, vectors_config, vectors_output::VectorsOptions,
    CollectionStatus, Condition, CreateCollectionBuilder, DeletePointsBuilder,
    Distance as QdrantDistance, Filter, PointId, PointStruct, PointsIdsList, RetrievedPoint,
    ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder, VectorsOutput,
};
use qdrant_client::{Qdrant, QdrantError};
use serde_json::Value as JsonValue;
use usermirror_core::{
    CollectionDescriptor, CollectionInfo, Distance, IndexEntry, IndexPoint, MatchValue, Payload,
    PayloadFilter, ScoredPoint, SyncError, VectorIndex,
};

use crate::QdrantConfig;

// ---------------------------------------------------------------------------
// QdrantIndex
// ---------------------------------------------------------------------------

/// A [`VectorIndex`] implementation backed by [Qdrant](https://qdrant.tech/).
///
/// Points are keyed by unsigned integer ids; payloads are stored field by
/// field so they can be filtered on and browsed in the Qdrant dashboard.
/// Writes wait for the operation to be applied before returning.
pub struct QdrantIndex {
    client: Qdrant,
    config: QdrantConfig,
}

impl QdrantIndex {
    /// Create a new index handle. No request is sent until the first call.
    pub fn new(config: QdrantConfig) -> Result<Self, SyncError> {
        let mut builder = Qdrant::from_url(&config.url);
        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            SyncError::Connectivity(format!("failed to build Qdrant client: {e}"))
        })?;
        Ok(Self { client, config })
    }

    /// Create an index from an existing [`Qdrant`] client.
    pub fn from_client(client: Qdrant, config: QdrantConfig) -> Self {
        Self { client, config }
    }

    /// Return a reference to the underlying Qdrant client.
    pub fn client(&self) -> &Qdrant {
        &self.client
    }

    /// Return a reference to the config.
    pub fn config(&self) -> &QdrantConfig {
        &self.config
    }
}

fn index_err(op: &str, e: QdrantError) -> SyncError {
    SyncError::Index(format!("{op} failed: {e}"))
}

// ---------------------------------------------------------------------------
// VectorIndex implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn list_collections(&self) -> Result<Vec<String>, SyncError> {
        let response = self
            .client
            .list_collections()
            .await
            .map_err(|e| SyncError::Connectivity(format!("list collections failed: {e}")))?;
        Ok(response.collections.into_iter().map(|c| c.name).collect())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, SyncError> {
        self.client
            .collection_exists(name)
            .await
            .map_err(|e| {
                SyncError::Connectivity(format!("collection exists check failed: {e}"))
            })
    }

    async fn create_collection(
        &self,
        descriptor: &CollectionDescriptor,
    ) -> Result<(), SyncError> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&descriptor.name).vectors_config(
                    VectorParamsBuilder::new(
                        descriptor.dimension as u64,
                        to_qdrant_distance(descriptor.distance),
                    ),
                ),
            )
            .await
            .map_err(|e| index_err("create collection", e))?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<IndexPoint>) -> Result<(), SyncError> {
        if points.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| PointStruct::new(p.id, p.vector, payload_to_qdrant(&p.payload)))
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(|e| index_err("upsert", e))?;
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[u64]) -> Result<(), SyncError> {
        if ids.is_empty() {
            return Ok(());
        }

        let point_ids: Vec<PointId> = ids.iter().map(|id| PointId::from(*id)).collect();

        self.client
            .delete_points(
                DeletePointsBuilder::new(collection)
                    .points(PointsIdsList { ids: point_ids })
                    .wait(true),
            )
            .await
            .map_err(|e| index_err("delete", e))?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        filter: Option<&PayloadFilter>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, SyncError> {
        let mut request =
            SearchPointsBuilder::new(collection, vector.to_vec(), limit as u64).with_payload(true);
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            request = request.filter(filter_to_qdrant(filter));
        }

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| index_err("search", e))?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|sp| {
                let id = numeric_id(sp.id.as_ref())?;
                Some(ScoredPoint {
                    id,
                    score: sp.score,
                    payload: payload_from_qdrant(&sp.payload),
                })
            })
            .collect())
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&PayloadFilter>,
        limit: usize,
        with_vectors: bool,
    ) -> Result<Vec<IndexEntry>, SyncError> {
        let limit = u32::try_from(limit).unwrap_or(u32::MAX);
        let mut request = ScrollPointsBuilder::new(collection)
            .limit(limit)
            .with_payload(true)
            .with_vectors(with_vectors);
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            request = request.filter(filter_to_qdrant(filter));
        }

        let response = self
            .client
            .scroll(request)
            .await
            .map_err(|e| index_err("scroll", e))?;

        Ok(response
            .result
            .into_iter()
            .filter_map(retrieved_point_to_entry)
            .collect())
    }

    async fn describe_collection(&self, collection: &str) -> Result<CollectionInfo, SyncError> {
        let response = self
            .client
            .collection_info(collection)
            .await
            .map_err(|e| index_err("collection info", e))?;
        let info = response
            .result
            .ok_or_else(|| SyncError::NotFound(format!("collection '{collection}'")))?;

        let params = info
            .config
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|config| match config {
                vectors_config::Config::Params(params) => Some(params),
                vectors_config::Config::ParamsMap(_) => None,
            });

        let status = CollectionStatus::try_from(info.status)
            .map(|s| s.as_str_name().to_ascii_lowercase())
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(CollectionInfo {
            name: collection.to_string(),
            points_count: info.points_count.unwrap_or(0),
            dimension: params.as_ref().map(|p| p.size as usize),
            distance: params
                .as_ref()
                .and_then(|p| QdrantDistance::try_from(p.distance).ok())
                .and_then(from_qdrant_distance),
            status,
        })
    }
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

fn to_qdrant_distance(distance: Distance) -> QdrantDistance {
    match distance {
        Distance::Cosine => QdrantDistance::Cosine,
        Distance::Euclid => QdrantDistance::Euclid,
        Distance::Dot => QdrantDistance::Dot,
        Distance::Manhattan => QdrantDistance::Manhattan,
    }
}

fn from_qdrant_distance(distance: QdrantDistance) -> Option<Distance> {
    match distance {
        QdrantDistance::Cosine => Some(Distance::Cosine),
        QdrantDistance::Euclid => Some(Distance::Euclid),
        QdrantDistance::Dot => Some(Distance::Dot),
        QdrantDistance::Manhattan => Some(Distance::Manhattan),
        QdrantDistance::UnknownDistance => None,
    }
}

fn filter_to_qdrant(filter: &PayloadFilter) -> Filter {
    Filter::must(filter.must.iter().map(|cond| {
        let key = cond.key.clone();
        match &cond.value {
            MatchValue::Bool(b) => Condition::matches(key, *b),
            MatchValue::Keyword(s) => Condition::matches(key, s.clone()),
            MatchValue::Integer(i) => Condition::matches(key, *i),
        }
    }))
}

/// Numeric id of a point. Points keyed by UUID are not produced by usermirror.
fn numeric_id(id: Option<&PointId>) -> Option<u64> {
    match id.and_then(|pid| pid.point_id_options.as_ref()) {
        Some(PointIdOptions::Num(n)) => Some(*n),
        Some(PointIdOptions::Uuid(uuid)) => {
            tracing::debug!("skipping point with non-numeric id {uuid}");
            None
        }
        None => None,
    }
}

fn retrieved_point_to_entry(point: RetrievedPoint) -> Option<IndexEntry> {
    let id = numeric_id(point.id.as_ref())?;
    Some(IndexEntry {
        id,
        payload: payload_from_qdrant(&point.payload),
        vector: point.vectors.and_then(dense_vector),
    })
}

#[allow(deprecated)]
fn dense_vector(vectors: VectorsOutput) -> Option<Vec<f32>> {
    match vectors.vectors_options? {
        VectorsOptions::Vector(vector) => Some(vector.data),
        VectorsOptions::Vectors(_) => None,
    }
}

fn payload_to_qdrant(payload: &Payload) -> HashMap<String, QdrantValue> {
    payload
        .iter()
        .map(|(k, v)| (k.clone(), json_to_qdrant(v)))
        .collect()
}

fn payload_from_qdrant(payload: &HashMap<String, QdrantValue>) -> Payload {
    payload
        .iter()
        .map(|(k, v)| (k.clone(), qdrant_to_json(v)))
        .collect()
}

/// Convert a `serde_json::Value` into a `qdrant_client::qdrant::Value`.
fn json_to_qdrant(json: &JsonValue) -> QdrantValue {
    let kind = match json {
        JsonValue::Null => Some(Kind::NullValue(0)),
        JsonValue::Bool(b) => Some(Kind::BoolValue(*b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Kind::IntegerValue(i))
            } else {
                Some(Kind::DoubleValue(n.as_f64().unwrap_or(0.0)))
            }
        }
        JsonValue::String(s) => Some(Kind::StringValue(s.clone())),
        JsonValue::Array(arr) => {
            let values: Vec<QdrantValue> = arr.iter().map(json_to_qdrant).collect();
            Some(Kind::ListValue(qdrant_client::qdrant::ListValue { values }))
        }
        JsonValue::Object(map) => {
            let fields: HashMap<String, QdrantValue> = map
                .iter()
                .map(|(k, v)| (k.clone(), json_to_qdrant(v)))
                .collect();
            Some(Kind::StructValue(qdrant_client::qdrant::Struct { fields }))
        }
    };
    QdrantValue { kind }
}

/// Convert a `qdrant_client::qdrant::Value` into a `serde_json::Value`.
fn qdrant_to_json(val: &QdrantValue) -> JsonValue {
    match &val.kind {
        None | Some(Kind::NullValue(_)) => JsonValue::Null,
        Some(Kind::BoolValue(b)) => JsonValue::Bool(*b),
        Some(Kind::IntegerValue(i)) => JsonValue::Number((*i).into()),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(*d)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Some(Kind::StringValue(s)) => JsonValue::String(s.clone()),
        Some(Kind::ListValue(list)) => {
            JsonValue::Array(list.values.iter().map(qdrant_to_json).collect())
        }
        Some(Kind::StructValue(st)) => {
            let map: serde_json::Map<String, JsonValue> = st
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), qdrant_to_json(v)))
                .collect();
            JsonValue::Object(map)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
