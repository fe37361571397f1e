mod in_memory;

pub use in_memory::{InMemoryIndex, IndexCall};

// Re-export core traits/types for convenience.
pub use usermirror_core::{CollectionDescriptor, IndexPoint, VectorIndex};
