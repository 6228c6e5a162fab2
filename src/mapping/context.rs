use super::descriptor::{EntityDescriptor, PropertyKind};
use super::naming::{DefaultNamingStrategy, NamingStrategy};
use super::path::{PathFlags, PropertyPath};
use super::persistent::{PersistentEntity, PersistentProperty};
use crate::core::{EntityType, RelError, Result};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of persistent entities and resolver of property paths.
///
/// Owned by the application wiring and lent to whoever needs paths or
/// column metadata. Entities are described once, up front; nothing is
/// discovered lazily.
///
/// # Examples
///
/// ```
/// use relchange::mapping::{EntityDescriptor, MappingContext, PropertyDescriptor};
///
/// # fn main() -> relchange::Result<()> {
/// let mut context = MappingContext::new();
/// context.register(
///     EntityDescriptor::new("Root")
///         .id("id")
///         .property(PropertyDescriptor::entity("intermediate", "Intermediate")),
/// )?;
/// context.register(
///     EntityDescriptor::new("Intermediate")
///         .id("id")
///         .property(PropertyDescriptor::entity("leaf", "Leaf")),
/// )?;
/// context.register(EntityDescriptor::new("Leaf").id("id"))?;
///
/// let path = context.persistent_property_path("intermediate.leaf", &"Root".into())?;
/// assert_eq!(path.depth(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MappingContext {
    naming: Arc<dyn NamingStrategy>,
    entities: HashMap<EntityType, PersistentEntity>,
}

impl MappingContext {
    pub fn new() -> Self {
        Self::with_naming_strategy(Arc::new(DefaultNamingStrategy))
    }

    pub fn with_naming_strategy(naming: Arc<dyn NamingStrategy>) -> Self {
        Self {
            naming,
            entities: HashMap::new(),
        }
    }

    pub fn naming_strategy(&self) -> &dyn NamingStrategy {
        self.naming.as_ref()
    }

    /// Register an entity type.
    ///
    /// Nested entity types may be registered in any order; they are only
    /// required once a path through them is resolved.
    pub fn register(&mut self, descriptor: EntityDescriptor) -> Result<&PersistentEntity> {
        let entity_type = descriptor.entity_type.clone();
        if self.entities.contains_key(&entity_type) {
            warn!("Entity type '{}' registered twice", entity_type);
            return Err(RelError::DuplicateEntity(entity_type));
        }

        let entity = PersistentEntity::from_descriptor(&descriptor, self.naming.as_ref())?;
        debug!(
            "Registered entity '{}' as table '{}' with {} properties",
            entity_type,
            entity.table_name(),
            entity.properties().len()
        );

        Ok(&*self.entities.entry(entity_type).or_insert(entity))
    }

    pub fn persistent_entity(&self, entity_type: &EntityType) -> Option<&PersistentEntity> {
        self.entities.get(entity_type)
    }

    pub fn required_persistent_entity(&self, entity_type: &EntityType) -> Result<&PersistentEntity> {
        self.persistent_entity(entity_type)
            .ok_or_else(|| RelError::UnknownEntity(entity_type.clone()))
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.entities.keys()
    }

    /// Resolve a dotted path expression ("intermediate.leaf") below `root_type`.
    ///
    /// Every segment must name an entity-valued property of the entity reached
    /// so far.
    pub fn persistent_property_path(&self, dot_path: &str, root_type: &EntityType) -> Result<PropertyPath> {
        if dot_path.trim().is_empty() {
            return Err(RelError::InvalidPath(format!(
                "empty path below '{}'",
                root_type
            )));
        }

        let mut owner = self.required_persistent_entity(root_type)?;
        let mut path: Option<PropertyPath> = None;

        for segment in dot_path.split('.') {
            if segment.is_empty() {
                return Err(RelError::InvalidPath(format!(
                    "'{}' contains an empty segment",
                    dot_path
                )));
            }

            let property = owner.required_property(segment)?;
            let target = property.target_entity().ok_or_else(|| RelError::NotTraversable {
                entity: owner.entity_type().clone(),
                property: segment.to_string(),
                path: dot_path.to_string(),
            })?;

            let flags = flags_for(property);
            path = Some(match path {
                None => PropertyPath::root_child(
                    root_type.clone(),
                    segment.to_string(),
                    target.clone(),
                    flags,
                ),
                Some(parent) => parent.child(segment.to_string(), target.clone(), flags),
            });

            owner = self.required_persistent_entity(target)?;
        }

        path.ok_or_else(|| RelError::InvalidPath(dot_path.to_string()))
    }

    /// Persistent property at the end of `path`
    pub fn leaf_property(&self, path: &PropertyPath) -> Result<&PersistentProperty> {
        let owner_type = match path.parent() {
            Some(parent) => parent.entity_type(),
            None => path.root_type(),
        };

        self.required_persistent_entity(owner_type)?
            .required_property(path.leaf_property())
    }

    /// Every entity path below `root_type`, parents before children
    pub fn all_paths(&self, root_type: &EntityType) -> Result<Vec<PropertyPath>> {
        let root = self.required_persistent_entity(root_type)?;
        let mut paths = Vec::new();
        let mut pending: Vec<(Option<PropertyPath>, &PersistentEntity)> = vec![(None, root)];

        while !pending.is_empty() {
            let mut next = Vec::new();
            for (parent, owner) in pending {
                for property in owner.properties() {
                    let Some(target) = property.target_entity() else {
                        continue;
                    };
                    if parent
                        .as_ref()
                        .is_some_and(|p| p.depth() >= MAX_PATH_DEPTH)
                    {
                        return Err(RelError::InvalidPath(format!(
                            "entity graph below '{}' nests deeper than {} levels",
                            root_type, MAX_PATH_DEPTH
                        )));
                    }

                    let flags = flags_for(property);
                    let path = match &parent {
                        None => PropertyPath::root_child(
                            root_type.clone(),
                            property.name().to_string(),
                            target.clone(),
                            flags,
                        ),
                        Some(parent) => parent.child(property.name().to_string(), target.clone(), flags),
                    };

                    let child_owner = self.required_persistent_entity(target)?;
                    paths.push(path.clone());
                    next.push((Some(path), child_owner));
                }
            }
            pending = next;
        }

        Ok(paths)
    }
}

// Cyclic entity graphs would otherwise expand forever.
const MAX_PATH_DEPTH: usize = 32;

fn flags_for(property: &PersistentProperty) -> PathFlags {
    PathFlags {
        collection: property.is_collection(),
        qualified: property.is_qualified(),
        embedded: matches!(property.kind(), PropertyKind::Embedded { .. }),
    }
}

impl Default for MappingContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::descriptor::{CollectionKind, PropertyDescriptor, ValueKind};

    fn context() -> MappingContext {
        let mut context = MappingContext::new();
        context
            .register(
                EntityDescriptor::new("Root")
                    .id("id")
                    .property(PropertyDescriptor::entity("intermediate", "Intermediate"))
                    .property(PropertyDescriptor::collection(
                        "items",
                        "Item",
                        CollectionKind::List,
                    )),
            )
            .unwrap();
        context
            .register(
                EntityDescriptor::new("Intermediate")
                    .id("id")
                    .property(PropertyDescriptor::simple("name", ValueKind::Text))
                    .property(PropertyDescriptor::entity("leaf", "Leaf")),
            )
            .unwrap();
        context
            .register(
                EntityDescriptor::new("Leaf")
                    .id("id")
                    .property(PropertyDescriptor::simple("name", ValueKind::Text)),
            )
            .unwrap();
        context
            .register(EntityDescriptor::new("Item").id("id"))
            .unwrap();
        context
    }

    #[test]
    fn test_resolves_nested_path() {
        let context = context();
        let root = EntityType::new("Root");

        let leaf = context.persistent_property_path("intermediate.leaf", &root).unwrap();
        let intermediate = context.persistent_property_path("intermediate", &root).unwrap();

        assert_eq!(leaf.entity_type().name(), "Leaf");
        assert_eq!(leaf.parent(), Some(&intermediate));
        assert_eq!(intermediate.depth(), 1);
        assert!(!intermediate.is_collection());
    }

    #[test]
    fn test_collection_path_is_qualified() {
        let context = context();
        let items = context
            .persistent_property_path("items", &EntityType::new("Root"))
            .unwrap();

        assert!(items.is_collection());
        assert!(items.is_qualified());
    }

    #[test]
    fn test_resolution_errors() {
        let context = context();
        let root = EntityType::new("Root");

        assert!(matches!(
            context.persistent_property_path("", &root),
            Err(RelError::InvalidPath(_))
        ));
        assert!(matches!(
            context.persistent_property_path("intermediate..leaf", &root),
            Err(RelError::InvalidPath(_))
        ));
        assert!(matches!(
            context.persistent_property_path("missing", &root),
            Err(RelError::UnknownProperty(_, _))
        ));
        assert!(matches!(
            context.persistent_property_path("intermediate.name", &root),
            Err(RelError::NotTraversable { .. })
        ));
        assert!(matches!(
            context.persistent_property_path("intermediate", &EntityType::new("Nope")),
            Err(RelError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut context = context();
        let err = context.register(EntityDescriptor::new("Leaf")).unwrap_err();
        assert!(matches!(err, RelError::DuplicateEntity(_)));
    }

    #[test]
    fn test_leaf_property() {
        let context = context();
        let items = context
            .persistent_property_path("items", &EntityType::new("Root"))
            .unwrap();

        let property = context.leaf_property(&items).unwrap();
        assert_eq!(property.name(), "items");
        assert_eq!(property.reverse_column_name(), Some("root"));
        assert_eq!(property.key_column(), Some("root_key"));
    }

    #[test]
    fn test_all_paths_parents_first() {
        let context = context();
        let paths = context.all_paths(&EntityType::new("Root")).unwrap();
        let dotted: Vec<String> = paths.iter().map(PropertyPath::dot_path).collect();

        assert_eq!(dotted, vec!["intermediate", "items", "intermediate.leaf"]);
    }

    #[test]
    fn test_all_paths_rejects_cycles() {
        let mut context = MappingContext::new();
        context
            .register(
                EntityDescriptor::new("Node")
                    .id("id")
                    .property(PropertyDescriptor::entity("next", "Node")),
            )
            .unwrap();

        assert!(matches!(
            context.all_paths(&EntityType::new("Node")),
            Err(RelError::InvalidPath(_))
        ));
    }
}
