use usermirror_core::{env_lookup, SyncError};

/// Configuration for a [`MongoUserStore`](crate::MongoUserStore).
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Connection string (e.g. `mongodb://localhost:27017`).
    pub uri: String,
    /// MongoDB database name.
    pub database: String,
    /// Collection holding user documents (default: `users`).
    pub collection: String,
}

impl MongoConfig {
    /// Create a new config with the required connection string and database.
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            collection: "users".to_string(),
        }
    }

    /// Set the users collection name.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Load from `MONGO_DATABASE_URI`, `MONGO_DATABASE` and the optional
    /// `MONGO_USERS_COLLECTION`.
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(env_lookup)
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SyncError> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| SyncError::Config(format!("{key} must be set")))
        };
        let mut config = Self::new(required("MONGO_DATABASE_URI")?, required("MONGO_DATABASE")?);
        if let Some(collection) = lookup("MONGO_USERS_COLLECTION") {
            config = config.with_collection(collection);
        }
        Ok(config)
    }
}
