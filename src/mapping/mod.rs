// ============================================================================
// Mapping Metadata
// ============================================================================
//
// Upfront schema description of entity types and resolution of property
// paths inside an aggregate.
//
// - descriptor: declarative entity/property descriptions
// - naming:     derivation of table and column names
// - persistent: resolved per-entity metadata
// - path:       PropertyPath and depth comparators
// - context:    MappingContext, the registry handing out paths
//
// ============================================================================

pub mod context;
pub mod descriptor;
pub mod naming;
pub mod path;
pub mod persistent;

pub use context::MappingContext;
pub use descriptor::{
    CollectionKind, EntityDescriptor, PropertyDescriptor, PropertyKind, ValueKind,
};
pub use naming::{DefaultNamingStrategy, NamingStrategy, UpperCaseNamingStrategy};
pub use path::{PropertyPath, deepest_first, shallowest_first};
pub use persistent::{PersistentEntity, PersistentProperty};
