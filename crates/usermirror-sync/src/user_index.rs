use std::sync::Arc;

use usermirror_core::{
    CollectionDescriptor, IdentityEmbedder, IndexPoint, Payload, PayloadFilter, SyncError,
    UserPayload, UserRecord, VectorIndex,
};
use usermirror_embeddings::{point_id, DigestEmbeddings};

use crate::{CollectionBootstrapper, CollectionSpec, CollectionState, SyncConfig};

/// Keeps the users collection in step with the primary store.
///
/// Every user maps to exactly one entry, keyed by [`point_id`] of the user id,
/// holding the identity vector and a denormalized [`UserPayload`]. Writes are
/// upserts, so there is no separate create/update path.
///
/// Failures are logged here and returned; nothing panics, so batch callers
/// can carry on with the next user.
pub struct UserIndex {
    bootstrapper: CollectionBootstrapper,
    embedder: Arc<dyn IdentityEmbedder>,
    spec: CollectionSpec,
}

impl UserIndex {
    /// Errors if the embedder's vectors do not fit the collection.
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn IdentityEmbedder>,
        descriptor: CollectionDescriptor,
    ) -> Result<Self, SyncError> {
        if embedder.dimension() != descriptor.dimension {
            return Err(SyncError::Config(format!(
                "embedder produces {} dimensions but collection '{}' is configured for {}",
                embedder.dimension(),
                descriptor.name,
                descriptor.dimension
            )));
        }
        Ok(Self {
            bootstrapper: CollectionBootstrapper::new(index),
            embedder,
            spec: CollectionSpec::new(descriptor),
        })
    }

    /// A users index with [`DigestEmbeddings`] sized from `config`.
    pub fn from_config(index: Arc<dyn VectorIndex>, config: &SyncConfig) -> Self {
        Self {
            bootstrapper: CollectionBootstrapper::new(index),
            embedder: Arc::new(DigestEmbeddings::new(config.dimension)),
            spec: CollectionSpec::new(config.descriptor()),
        }
    }

    pub fn collection(&self) -> &str {
        &self.spec.descriptor.name
    }

    /// The bootstrap spec of the users collection (never seeded).
    pub fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    fn index(&self) -> &Arc<dyn VectorIndex> {
        self.bootstrapper.index()
    }

    /// Create the users collection if it is missing.
    pub async fn ensure_collection(&self) -> Result<CollectionState, SyncError> {
        self.bootstrapper.ensure_collection(&self.spec).await
    }

    /// The entry `user` is stored as.
    pub fn point_for(&self, user: &UserRecord) -> Result<IndexPoint, SyncError> {
        let identity = user.identity()?;
        let vector = self.embedder.embed(&identity);
        Ok(IndexPoint::new(
            point_id(&user.id),
            vector,
            user.to_payload().into_payload(),
        ))
    }

    /// Insert or overwrite the entry of `user`.
    pub async fn upsert(&self, user: &UserRecord) -> Result<(), SyncError> {
        match self.try_upsert(user).await {
            Ok(id) => {
                tracing::info!("user {} saved to index as point {id}", user.email);
                Ok(())
            }
            Err(e) => {
                tracing::error!("error saving user {} to index: {e}", user.email);
                Err(e)
            }
        }
    }

    async fn try_upsert(&self, user: &UserRecord) -> Result<u64, SyncError> {
        self.ensure_collection().await?;
        let point = self.point_for(user)?;
        let id = point.id;
        self.index().upsert(self.collection(), vec![point]).await?;
        Ok(id)
    }

    /// Same as [`upsert`](Self::upsert).
    pub async fn update(&self, user: &UserRecord) -> Result<(), SyncError> {
        self.upsert(user).await
    }

    /// Remove the entry of the user with `user_id`. Absent entries are not an error.
    pub async fn delete(&self, user_id: &str) -> Result<(), SyncError> {
        match self.try_delete(user_id).await {
            Ok(()) => {
                tracing::info!("user {user_id} deleted from index");
                Ok(())
            }
            Err(e) => {
                tracing::error!("error deleting user {user_id} from index: {e}");
                Err(e)
            }
        }
    }

    async fn try_delete(&self, user_id: &str) -> Result<(), SyncError> {
        if !self.index().collection_exists(self.collection()).await? {
            return Err(SyncError::NotFound(format!(
                "collection '{}' does not exist",
                self.collection()
            )));
        }
        self.index()
            .delete(self.collection(), &[point_id(user_id)])
            .await
    }

    /// Payloads of mirrored users.
    ///
    /// With a query vector, the nearest entries (closest first); without one,
    /// or with an empty one, an unordered listing. `filter` applies in both
    /// cases.
    pub async fn search(
        &self,
        query: Option<&[f32]>,
        filter: Option<&PayloadFilter>,
        limit: usize,
    ) -> Result<Vec<Payload>, SyncError> {
        let result = self.try_search(query, filter, limit).await;
        if let Err(e) = &result {
            tracing::error!("error searching users in index: {e}");
        }
        result
    }

    async fn try_search(
        &self,
        query: Option<&[f32]>,
        filter: Option<&PayloadFilter>,
        limit: usize,
    ) -> Result<Vec<Payload>, SyncError> {
        let collection = self.collection();
        match query.filter(|vector| !vector.is_empty()) {
            Some(vector) => {
                let expected = self.spec.descriptor.dimension;
                if vector.len() != expected {
                    return Err(SyncError::Data(format!(
                        "query vector has {} dimensions, expected {expected}",
                        vector.len()
                    )));
                }
                let hits = self.index().search(collection, vector, filter, limit).await?;
                Ok(hits.into_iter().map(|hit| hit.payload).collect())
            }
            None => {
                let entries = self.index().scroll(collection, filter, limit, false).await?;
                Ok(entries.into_iter().map(|entry| entry.payload).collect())
            }
        }
    }

    /// [`search`](Self::search), decoded into [`UserPayload`]s.
    ///
    /// Payloads that are not user payloads are skipped.
    pub async fn search_users(
        &self,
        query: Option<&[f32]>,
        filter: Option<&PayloadFilter>,
        limit: usize,
    ) -> Result<Vec<UserPayload>, SyncError> {
        let payloads = self.search(query, filter, limit).await?;
        Ok(payloads
            .iter()
            .filter_map(|payload| match UserPayload::from_payload(payload) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!("skipping entry in '{}': {e}", self.collection());
                    None
                }
            })
            .collect())
    }
}
