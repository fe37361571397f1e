//! Placeholder embeddings for mirrored users.
//!
//! The index requires every entry to carry a vector. [`DigestEmbeddings`]
//! derives one from the user's identity string, and [`point_id`] derives the
//! integer key the entry is stored under. Neither carries semantic meaning.

mod digest;
mod point_id;

pub use digest::{DigestEmbeddings, DEFAULT_DIMENSION};
pub use point_id::point_id;

// Re-export the IdentityEmbedder trait from core.
pub use usermirror_core::IdentityEmbedder;
