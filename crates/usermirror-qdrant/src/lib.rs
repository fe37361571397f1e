//! Qdrant integration for usermirror.
//!
//! This crate provides [`QdrantIndex`], an implementation of the
//! [`VectorIndex`](usermirror_core::VectorIndex) trait backed by [Qdrant](https://qdrant.tech/).
//!
//! # Example
//!
//! ```rust,no_run
//! use usermirror_qdrant::{QdrantConfig, QdrantIndex};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = QdrantConfig::from_host("localhost", 6334, false);
//! let index = QdrantIndex::new(config)?;
//! # Ok(())
//! # }
//! ```

mod config;
mod index;

pub use config::QdrantConfig;
pub use index::QdrantIndex;

// Re-export core traits for convenience.
pub use usermirror_core::VectorIndex;
