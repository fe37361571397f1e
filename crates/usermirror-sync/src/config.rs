use usermirror_core::{env_lookup, parse_var, CollectionDescriptor, Distance, SyncError};
use usermirror_embeddings::DEFAULT_DIMENSION;

/// Collection that mirrored users are written to.
pub const DEFAULT_USERS_COLLECTION: &str = "users_collection";

/// Settings for the users collection and the resync driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Name of the users collection (default: `users_collection`).
    pub collection: String,
    /// Vector dimensionality (default: 128).
    pub dimension: usize,
    /// Distance metric used when the collection is created (default: cosine).
    pub distance: Distance,
    /// Maximum number of users synced at once during a resync (default: 1).
    pub concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_USERS_COLLECTION.to_string(),
            dimension: DEFAULT_DIMENSION,
            distance: Distance::Cosine,
            concurrency: 1,
        }
    }
}

impl SyncConfig {
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    /// Values below 1 are raised to 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Load from `USERMIRROR_COLLECTION`, `USERMIRROR_VECTOR_SIZE`,
    /// `USERMIRROR_DISTANCE` and `USERMIRROR_CONCURRENCY`, defaulting each.
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(env_lookup)
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SyncError> {
        let mut config = Self::default();
        if let Some(collection) = lookup("USERMIRROR_COLLECTION") {
            config.collection = collection;
        }
        if let Some(dimension) = parse_var::<usize>(&lookup, "USERMIRROR_VECTOR_SIZE")? {
            if dimension == 0 {
                return Err(SyncError::Config(
                    "USERMIRROR_VECTOR_SIZE must be positive".into(),
                ));
            }
            config.dimension = dimension;
        }
        if let Some(distance) = parse_var::<Distance>(&lookup, "USERMIRROR_DISTANCE")? {
            config.distance = distance;
        }
        if let Some(concurrency) = parse_var::<usize>(&lookup, "USERMIRROR_CONCURRENCY")? {
            if concurrency == 0 {
                return Err(SyncError::Config(
                    "USERMIRROR_CONCURRENCY must be at least 1".into(),
                ));
            }
            config.concurrency = concurrency;
        }
        Ok(config)
    }

    /// Descriptor the users collection is created with.
    pub fn descriptor(&self) -> CollectionDescriptor {
        CollectionDescriptor::new(&self.collection, self.dimension).with_distance(self.distance)
    }
}
