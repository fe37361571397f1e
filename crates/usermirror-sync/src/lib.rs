//! Mirroring of primary-store users into a vector index.
//!
//! - [`CollectionBootstrapper`] creates collections that are missing and
//!   otherwise leaves them alone.
//! - [`UserIndex`] upserts, deletes and searches the entries of mirrored users.
//! - [`ResyncDriver`] pushes every user of a [`UserSource`](usermirror_core::UserSource)
//!   through a [`UserIndex`], isolating per-user failures.
//! - [`IndexInspector`] summarises what the index currently holds.
//!
//! All components share one injected [`VectorIndex`](usermirror_core::VectorIndex)
//! handle.

mod bootstrap;
mod config;
pub mod demo;
mod inspect;
mod resync;
mod user_index;

pub use bootstrap::{CollectionBootstrapper, CollectionSpec, CollectionState};
pub use config::{SyncConfig, DEFAULT_USERS_COLLECTION};
pub use inspect::{CollectionReport, IndexInspector};
pub use resync::{RecordOutcome, ResyncDriver, ResyncReport, SyncSummary};
pub use user_index::UserIndex;
