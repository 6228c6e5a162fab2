// ============================================================================
// relchange Library
// ============================================================================
//
// Ordering and batching of the database actions that persist or delete
// aggregates (a root entity plus the entities nested below it).
//
// ============================================================================

pub mod conversion;
pub mod core;
pub mod mapping;

// Re-export main types for convenience
pub use conversion::{
    AggregateChange, BatchingAggregateChange, BatchingConfig, ChangeKind, DbAction,
};
pub use core::{Entity, EntityType, RelError, Result, Value};
pub use mapping::{MappingContext, PropertyPath};
