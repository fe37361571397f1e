//! usermirror: keep a vector index in step with the users of a primary store.
//!
//! This crate re-exports the usermirror sub-crates for single-import usage.
//! Enable features to choose the backends.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `default` | `in-memory` |
//! | `in-memory` | `InMemoryIndex` and `InMemoryUserStore` |
//! | `qdrant` | `QdrantIndex` vector index |
//! | `mongodb` | `MongoUserStore` primary store |
//! | `full` | All features enabled |
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use usermirror::qdrant::{QdrantConfig, QdrantIndex};
//! use usermirror::sync::{SyncConfig, UserIndex};
//!
//! let index = Arc::new(QdrantIndex::new(QdrantConfig::from_env()?)?);
//! let users = UserIndex::from_config(index, &SyncConfig::from_env()?);
//! users.upsert(&user).await?;
//! ```

/// Core traits and types: VectorIndex, UserSource, UserRecord, SyncError, etc.
/// Always available.
pub use usermirror_core as core;

/// Identity vectors and point ids.
pub use usermirror_embeddings as embeddings;

/// Collection bootstrapping, user index synchronization, resync and inspection.
pub use usermirror_sync as sync;

/// In-memory vector index.
#[cfg(feature = "in-memory")]
pub use usermirror_vectorstores as vectorstores;

/// In-memory primary store.
#[cfg(feature = "in-memory")]
pub use usermirror_store as store;

/// Qdrant vector index.
#[cfg(feature = "qdrant")]
pub use usermirror_qdrant as qdrant;

/// MongoDB primary store.
#[cfg(feature = "mongodb")]
pub use usermirror_mongodb as mongodb;
