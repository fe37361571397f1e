//! MongoDB integration for usermirror.
//!
//! This crate provides [`MongoUserStore`], a read-only implementation of the
//! [`UserSource`](usermirror_core::UserSource) trait over the users collection
//! of the primary database.
//!
//! # Example
//!
//! ```rust,no_run
//! use usermirror_mongodb::{MongoConfig, MongoUserStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MongoConfig::new("mongodb://localhost:27017", "app");
//! let store = MongoUserStore::connect(config).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod user_store;

pub use config::MongoConfig;
pub use user_store::MongoUserStore;

// Re-export core traits for convenience.
pub use usermirror_core::UserSource;
