mod in_memory;

pub use in_memory::InMemoryUserStore;

// Re-export core traits/types for convenience.
pub use usermirror_core::{UserFilter, UserRecord, UserSource};
