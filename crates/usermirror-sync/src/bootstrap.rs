use std::sync::Arc;

use usermirror_core::{CollectionDescriptor, IndexPoint, SyncError, VectorIndex};

/// A collection to bootstrap, with the points written right after creating it.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSpec {
    pub descriptor: CollectionDescriptor,
    pub seed: Vec<IndexPoint>,
}

impl CollectionSpec {
    /// A spec without seed data.
    pub fn new(descriptor: CollectionDescriptor) -> Self {
        Self {
            descriptor,
            seed: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: Vec<IndexPoint>) -> Self {
        self.seed = seed;
        self
    }
}

/// What [`CollectionBootstrapper::ensure_collection`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionState {
    Created,
    AlreadyExists,
}

/// Creates collections that do not exist yet.
///
/// An existing collection is trusted as is: its dimension and metric are
/// never compared with the spec, and seed data is only written on creation.
#[derive(Clone)]
pub struct CollectionBootstrapper {
    index: Arc<dyn VectorIndex>,
}

impl CollectionBootstrapper {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Create `spec`'s collection and insert its seed points if it is missing.
    pub async fn ensure_collection(
        &self,
        spec: &CollectionSpec,
    ) -> Result<CollectionState, SyncError> {
        let name = &spec.descriptor.name;
        let existing = self.index.list_collections().await?;
        if existing.iter().any(|c| c == name) {
            tracing::debug!("collection '{name}' already exists");
            return Ok(CollectionState::AlreadyExists);
        }

        if let Err(e) = self.index.create_collection(&spec.descriptor).await {
            // Another caller may have created it between the listing and the create.
            if self.index.collection_exists(name).await.unwrap_or(false) {
                tracing::debug!("collection '{name}' was created concurrently");
                return Ok(CollectionState::AlreadyExists);
            }
            return Err(e);
        }
        tracing::info!(
            "collection '{name}' created ({} dimensions, {})",
            spec.descriptor.dimension,
            spec.descriptor.distance
        );

        if !spec.seed.is_empty() {
            self.index.upsert(name, spec.seed.clone()).await?;
            tracing::info!("{} seed point(s) inserted into '{name}'", spec.seed.len());
        }
        Ok(CollectionState::Created)
    }

    /// Ensure every spec in order, stopping at the first failure.
    pub async fn bootstrap(
        &self,
        specs: &[CollectionSpec],
    ) -> Result<Vec<CollectionState>, SyncError> {
        let mut states = Vec::with_capacity(specs.len());
        for spec in specs {
            let state = self.ensure_collection(spec).await.map_err(|e| {
                tracing::error!(
                    "failed to initialize collection '{}': {e}",
                    spec.descriptor.name
                );
                e
            })?;
            states.push(state);
        }
        Ok(states)
    }
}
