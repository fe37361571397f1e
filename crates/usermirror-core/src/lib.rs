use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Unified error type for usermirror, covering both collaborators and local data.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("connectivity error: {0}")]
    Connectivity(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("data error: {0}")]
    Data(String),
    #[error("index error: {0}")]
    Index(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("config error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// UserRecord
// ---------------------------------------------------------------------------

/// A user as held by the primary store.
///
/// Only the identity fields are modelled; credentials and other account
/// state never leave the primary store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub email_validated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl UserRecord {
    /// An active, non-privileged user with no display name or timestamps.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            full_name: None,
            is_active: true,
            is_superuser: false,
            email_validated: false,
            created: None,
            modified: None,
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn with_superuser(mut self, is_superuser: bool) -> Self {
        self.is_superuser = is_superuser;
        self
    }

    pub fn with_email_validated(mut self, email_validated: bool) -> Self {
        self.email_validated = email_validated;
        self
    }

    pub fn with_timestamps(
        mut self,
        created: Option<DateTime<Utc>>,
        modified: Option<DateTime<Utc>>,
    ) -> Self {
        self.created = created;
        self.modified = modified;
        self
    }

    /// Borrow the identity fields, rejecting records that cannot be keyed.
    ///
    /// Both the id and the email must be non-blank; the display name may be
    /// absent and then contributes an empty string.
    pub fn identity(&self) -> Result<Identity<'_>, SyncError> {
        if self.id.trim().is_empty() {
            return Err(SyncError::Data(format!(
                "user with email '{}' has an empty id",
                self.email
            )));
        }
        if self.email.trim().is_empty() {
            return Err(SyncError::Data(format!("user {} has no email", self.id)));
        }
        Ok(Identity {
            id: &self.id,
            email: &self.email,
            full_name: self.full_name.as_deref().unwrap_or(""),
        })
    }

    /// Denormalized copy of the identity fields, as stored alongside the vector.
    pub fn to_payload(&self) -> UserPayload {
        UserPayload {
            user_id: self.id.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone().unwrap_or_default(),
            is_active: self.is_active,
            is_superuser: self.is_superuser,
            email_validated: self.email_validated,
            created: self.created.as_ref().map(format_timestamp),
            modified: self.modified.as_ref().map(format_timestamp),
        }
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// The identity tuple of a user: `(id, email, full_name)`.
///
/// Displays as the identity string `"{id}_{email}_{full_name}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub full_name: &'a str,
}

impl fmt::Display for Identity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.id, self.email, self.full_name)
    }
}

// ---------------------------------------------------------------------------
// IdentityEmbedder trait (implementations in usermirror-embeddings)
// ---------------------------------------------------------------------------

/// Maps a user identity to a fixed-length vector.
///
/// Implementations must be pure: the same identity always yields the same
/// vector, so re-syncing an unchanged user never moves its entry.
pub trait IdentityEmbedder: Send + Sync {
    /// Length of every vector produced by [`embed`](Self::embed).
    fn dimension(&self) -> usize;

    fn embed(&self, identity: &Identity<'_>) -> Vec<f32>;
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Free-form metadata attached to an index entry.
pub type Payload = HashMap<String, Value>;

/// The payload written for every mirrored user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPayload {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub email_validated: bool,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
}

impl UserPayload {
    pub fn into_payload(self) -> Payload {
        let optional = |v: Option<String>| v.map(Value::String).unwrap_or(Value::Null);
        HashMap::from([
            ("user_id".to_string(), Value::String(self.user_id)),
            ("email".to_string(), Value::String(self.email)),
            ("full_name".to_string(), Value::String(self.full_name)),
            ("is_active".to_string(), Value::Bool(self.is_active)),
            ("is_superuser".to_string(), Value::Bool(self.is_superuser)),
            ("email_validated".to_string(), Value::Bool(self.email_validated)),
            ("created".to_string(), optional(self.created)),
            ("modified".to_string(), optional(self.modified)),
        ])
    }

    pub fn from_payload(payload: &Payload) -> Result<Self, SyncError> {
        let object: serde_json::Map<String, Value> = payload
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        serde_json::from_value(Value::Object(object))
            .map_err(|e| SyncError::Data(format!("payload is not a user: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// Distance metric a collection is created with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    #[default]
    Cosine,
    Euclid,
    Dot,
    Manhattan,
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Distance::Cosine => "cosine",
            Distance::Euclid => "euclid",
            Distance::Dot => "dot",
            Distance::Manhattan => "manhattan",
        };
        f.write_str(name)
    }
}

impl FromStr for Distance {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Distance::Cosine),
            "euclid" | "euclidean" => Ok(Distance::Euclid),
            "dot" => Ok(Distance::Dot),
            "manhattan" => Ok(Distance::Manhattan),
            other => Err(SyncError::Config(format!("unknown distance metric '{other}'"))),
        }
    }
}

/// Name and vector configuration of a collection. Fixed once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    pub name: String,
    pub dimension: usize,
    pub distance: Distance,
}

impl CollectionDescriptor {
    /// A cosine collection of the given dimensionality.
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            distance: Distance::Cosine,
        }
    }

    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }
}

/// Live description of a collection as reported by the index.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionInfo {
    pub name: String,
    pub points_count: u64,
    pub dimension: Option<usize>,
    pub distance: Option<Distance>,
    pub status: String,
}

// ---------------------------------------------------------------------------
// Points
// ---------------------------------------------------------------------------

/// An entry to write into a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

impl IndexPoint {
    pub fn new(id: u64, vector: Vec<f32>, payload: Payload) -> Self {
        Self {
            id,
            vector,
            payload,
        }
    }
}

/// A search hit.
///
/// The score is metric-specific: a similarity for cosine and dot (higher is
/// closer), a distance for euclid and manhattan (lower is closer).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: u64,
    pub score: f32,
    pub payload: Payload,
}

/// A point returned by a scroll; the vector is only present when requested.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub id: u64,
    pub payload: Payload,
    pub vector: Option<Vec<f32>>,
}

// ---------------------------------------------------------------------------
// Payload filters
// ---------------------------------------------------------------------------

/// Exact-match value for a payload field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchValue {
    Bool(bool),
    Keyword(String),
    Integer(i64),
}

impl MatchValue {
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (MatchValue::Bool(expected), Value::Bool(actual)) => expected == actual,
            (MatchValue::Keyword(expected), Value::String(actual)) => expected == actual,
            (MatchValue::Integer(expected), Value::Number(actual)) => {
                actual.as_i64() == Some(*expected)
            }
            _ => false,
        }
    }
}

impl From<bool> for MatchValue {
    fn from(value: bool) -> Self {
        MatchValue::Bool(value)
    }
}

impl From<&str> for MatchValue {
    fn from(value: &str) -> Self {
        MatchValue::Keyword(value.to_string())
    }
}

impl From<String> for MatchValue {
    fn from(value: String) -> Self {
        MatchValue::Keyword(value)
    }
}

impl From<i64> for MatchValue {
    fn from(value: i64) -> Self {
        MatchValue::Integer(value)
    }
}

/// One `key == value` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub key: String,
    pub value: MatchValue,
}

/// Conjunction of exact-match conditions over payload fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadFilter {
    pub must: Vec<FieldMatch>,
}

impl PayloadFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to equal `value`.
    pub fn must_match(mut self, key: impl Into<String>, value: impl Into<MatchValue>) -> Self {
        self.must.push(FieldMatch {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
    }

    /// Whether every condition holds for `payload`. Missing keys never match.
    pub fn matches(&self, payload: &Payload) -> bool {
        self.must.iter().all(|cond| {
            payload
                .get(&cond.key)
                .is_some_and(|value| cond.value.matches(value))
        })
    }
}

// ---------------------------------------------------------------------------
// VectorIndex trait (implementations in usermirror-qdrant, usermirror-vectorstores)
// ---------------------------------------------------------------------------

/// The secondary index that mirrors users as vectors plus payloads.
///
/// A single handle is created at process start and shared by every component;
/// implementations must tolerate concurrent calls without external locking.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Names of all collections.
    async fn list_collections(&self) -> Result<Vec<String>, SyncError>;

    async fn collection_exists(&self, name: &str) -> Result<bool, SyncError> {
        Ok(self
            .list_collections()
            .await?
            .iter()
            .any(|existing| existing == name))
    }

    async fn create_collection(&self, descriptor: &CollectionDescriptor)
        -> Result<(), SyncError>;

    /// Insert or replace points by id.
    async fn upsert(&self, collection: &str, points: Vec<IndexPoint>) -> Result<(), SyncError>;

    /// Delete points by id. Unknown ids are ignored.
    async fn delete(&self, collection: &str, ids: &[u64]) -> Result<(), SyncError>;

    /// Nearest-neighbour search, closest first.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        filter: Option<&PayloadFilter>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, SyncError>;

    /// Unordered listing of up to `limit` points.
    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&PayloadFilter>,
        limit: usize,
        with_vectors: bool,
    ) -> Result<Vec<IndexEntry>, SyncError>;

    async fn describe_collection(&self, collection: &str) -> Result<CollectionInfo, SyncError>;

    /// Cheap round trip proving the index is reachable.
    async fn ping(&self) -> Result<(), SyncError> {
        self.list_collections().await.map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// UserSource trait (implementations in usermirror-mongodb, usermirror-store)
// ---------------------------------------------------------------------------

/// Lookup key for a single user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    Id(String),
    Email(String),
}

impl UserFilter {
    pub fn matches(&self, user: &UserRecord) -> bool {
        match self {
            UserFilter::Id(id) => &user.id == id,
            UserFilter::Email(email) => &user.email == email,
        }
    }
}

/// Read access to the primary store of users.
#[async_trait]
pub trait UserSource: Send + Sync {
    async fn find_one(&self, filter: &UserFilter) -> Result<Option<UserRecord>, SyncError>;

    /// One page of users in the store's natural order.
    async fn find_page(&self, skip: u64, limit: usize) -> Result<Vec<UserRecord>, SyncError>;

    /// Every user, loaded into memory.
    async fn find_all(&self) -> Result<Vec<UserRecord>, SyncError>;
}

// ---------------------------------------------------------------------------
// Environment configuration helpers
// ---------------------------------------------------------------------------

/// Read a variable from the process environment, treating blank values as unset.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an optional configuration value.
///
/// `Ok(None)` when `lookup` has no value for `key`; a value that does not
/// parse is a [`SyncError::Config`] naming the key.
pub fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, SyncError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| SyncError::Config(format!("invalid {key} value '{raw}': {e}"))),
    }
}

/// Parse an optional boolean flag (`true`/`false`, `1`/`0`, `yes`/`no`).
pub fn parse_flag(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<bool>, SyncError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(SyncError::Config(format!("invalid {key} flag '{raw}'"))),
        },
    }
}
