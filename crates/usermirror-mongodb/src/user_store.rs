use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Bson, Document as BsonDocument};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::Client;
use usermirror_core::{SyncError, UserFilter, UserRecord, UserSource};

use crate::MongoConfig;

// ---------------------------------------------------------------------------
// MongoUserStore
// ---------------------------------------------------------------------------

/// A [`UserSource`] reading user documents from MongoDB.
///
/// Documents are decoded leniently: missing flags take their defaults and a
/// missing email becomes an empty string, so a single malformed user is
/// rejected when it is synced rather than failing the whole listing.
pub struct MongoUserStore {
    config: MongoConfig,
    client: Client,
    collection: mongodb::Collection<BsonDocument>,
}

impl MongoUserStore {
    /// Create a new store for the configured connection string.
    pub async fn connect(config: MongoConfig) -> Result<Self, SyncError> {
        let client = Client::with_uri_str(&config.uri).await.map_err(|e| {
            SyncError::Connectivity(format!("failed to connect to MongoDB: {e}"))
        })?;

        Ok(Self::from_client(client, config))
    }

    /// Create a new store from an existing MongoDB client.
    pub fn from_client(client: Client, config: MongoConfig) -> Self {
        let db = client.database(&config.database);
        let collection = db.collection::<BsonDocument>(&config.collection);
        Self {
            config,
            client,
            collection,
        }
    }

    /// Return a reference to the underlying MongoDB client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &MongoConfig {
        &self.config
    }

    /// Round trip to the server to verify it is reachable.
    pub async fn ping(&self) -> Result<(), SyncError> {
        self.client
            .database(&self.config.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| SyncError::Connectivity(format!("MongoDB ping failed: {e}")))?;
        Ok(())
    }

    async fn find_many(
        &self,
        skip: u64,
        limit: Option<usize>,
    ) -> Result<Vec<UserRecord>, SyncError> {
        let mut find = self.collection.find(doc! {}).sort(doc! { "_id": 1 }).skip(skip);
        if let Some(limit) = limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let cursor = find
            .await
            .map_err(|e| SyncError::Store(format!("MongoDB find failed: {e}")))?;
        let docs: Vec<BsonDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| SyncError::Store(format!("MongoDB cursor error: {e}")))?;

        tracing::debug!(
            "read {} user document(s) from {}.{}",
            docs.len(),
            self.config.database,
            self.config.collection
        );
        Ok(docs.iter().map(user_from_bson).collect())
    }
}

// ---------------------------------------------------------------------------
// UserSource implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl UserSource for MongoUserStore {
    async fn find_one(&self, filter: &UserFilter) -> Result<Option<UserRecord>, SyncError> {
        let found = self
            .collection
            .find_one(user_filter_to_bson(filter))
            .await
            .map_err(|e| SyncError::Store(format!("MongoDB find_one failed: {e}")))?;
        Ok(found.as_ref().map(user_from_bson))
    }

    async fn find_page(&self, skip: u64, limit: usize) -> Result<Vec<UserRecord>, SyncError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.find_many(skip, Some(limit)).await
    }

    async fn find_all(&self) -> Result<Vec<UserRecord>, SyncError> {
        self.find_many(0, None).await
    }
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Build the query document for a [`UserFilter`].
///
/// Ids that parse as an ObjectId are matched as one; anything else is matched
/// as a plain string `_id`.
fn user_filter_to_bson(filter: &UserFilter) -> BsonDocument {
    match filter {
        UserFilter::Id(id) => match ObjectId::parse_str(id) {
            Ok(oid) => doc! { "_id": oid },
            Err(_) => doc! { "_id": id.as_str() },
        },
        UserFilter::Email(email) => doc! { "email": email.as_str() },
    }
}

/// Decode a user document into a [`UserRecord`].
fn user_from_bson(doc: &BsonDocument) -> UserRecord {
    let id = match doc.get("_id") {
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(Bson::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    UserRecord {
        id,
        email: doc.get_str("email").unwrap_or("").to_string(),
        full_name: doc
            .get_str("full_name")
            .ok()
            .map(str::to_string)
            .filter(|name| !name.is_empty()),
        is_active: doc.get_bool("is_active").unwrap_or(true),
        is_superuser: doc.get_bool("is_superuser").unwrap_or(false),
        email_validated: doc.get_bool("email_validated").unwrap_or(false),
        created: timestamp(doc, "created"),
        modified: timestamp(doc, "modified"),
    }
}

fn timestamp(doc: &BsonDocument, key: &str) -> Option<DateTime<Utc>> {
    match doc.get(key) {
        Some(Bson::DateTime(dt)) => Some(dt.to_chrono()),
        Some(Bson::String(s)) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
