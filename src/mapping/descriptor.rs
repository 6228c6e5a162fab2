// ============================================================================
// Entity Descriptors
// ============================================================================
//
// Declarative description of an entity's shape, written once by the
// application and handed to the MappingContext. Nothing here is derived;
// derivation (column names, column types, reverse columns) happens when a
// descriptor is registered and turned into a PersistentEntity.
//
// ============================================================================

use crate::core::{DataType, EntityType};

/// Kind of a simple (non-entity) property value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Float,
    Text,
    Boolean,
    /// Timestamp without zone information
    LocalTimestamp,
    /// Timestamp with zone; no portable column type, stored as text
    ZonedTimestamp,
    Uuid,
    /// Enumeration, stored by variant name
    Enum(String),
}

impl ValueKind {
    /// Column type used to store values of this kind
    pub fn column_type(&self) -> DataType {
        match self {
            Self::Integer => DataType::Integer,
            Self::Float => DataType::Float,
            Self::Text | Self::ZonedTimestamp | Self::Enum(_) => DataType::Text,
            Self::Boolean => DataType::Boolean,
            Self::LocalTimestamp => DataType::Timestamp,
            Self::Uuid => DataType::Uuid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    List,
    Set,
    Map,
}

impl CollectionKind {
    /// Lists and maps need a key column to identify an element
    pub fn is_qualified(&self) -> bool {
        matches!(self, Self::List | Self::Map)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Simple(ValueKind),
    /// Collection of simple values stored in the owner's table
    SimpleCollection(ValueKind),
    /// Single nested entity stored in its own table
    Entity(EntityType),
    /// Nested entity whose columns live in the owner's table
    Embedded {
        entity: EntityType,
        prefix: Option<String>,
    },
    /// Collection of nested entities stored in their own table
    Collection {
        element: EntityType,
        kind: CollectionKind,
    },
}

impl PropertyKind {
    /// Entity type reachable through this property, if any
    pub fn target_entity(&self) -> Option<&EntityType> {
        match self {
            Self::Entity(entity) => Some(entity),
            Self::Embedded { entity, .. } => Some(entity),
            Self::Collection { element, .. } => Some(element),
            Self::Simple(_) | Self::SimpleCollection(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub kind: PropertyKind,
    pub column: Option<String>,
    pub reverse_column: Option<String>,
    pub key_column: Option<String>,
    pub is_id: bool,
    pub is_version: bool,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            column: None,
            reverse_column: None,
            key_column: None,
            is_id: false,
            is_version: false,
        }
    }

    pub fn simple(name: impl Into<String>, kind: ValueKind) -> Self {
        Self::new(name, PropertyKind::Simple(kind))
    }

    pub fn entity(name: impl Into<String>, target: impl Into<EntityType>) -> Self {
        Self::new(name, PropertyKind::Entity(target.into()))
    }

    pub fn embedded(name: impl Into<String>, target: impl Into<EntityType>) -> Self {
        Self::new(
            name,
            PropertyKind::Embedded {
                entity: target.into(),
                prefix: None,
            },
        )
    }

    pub fn collection(
        name: impl Into<String>,
        element: impl Into<EntityType>,
        kind: CollectionKind,
    ) -> Self {
        Self::new(
            name,
            PropertyKind::Collection {
                element: element.into(),
                kind,
            },
        )
    }

    /// Explicit column name
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Explicit back reference column in the child table
    pub fn reverse_column(mut self, column: impl Into<String>) -> Self {
        self.reverse_column = Some(column.into());
        self
    }

    /// Explicit key column for list/map collections
    pub fn key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = Some(column.into());
        self
    }

    /// Column prefix of an embedded property. No effect on other kinds.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        if let PropertyKind::Embedded { prefix: slot, .. } = &mut self.kind {
            *slot = Some(prefix.into());
        }
        self
    }

    pub fn id(mut self) -> Self {
        self.is_id = true;
        self
    }

    pub fn version(mut self) -> Self {
        self.is_version = true;
        self
    }
}

/// Shape of one entity type
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    pub entity_type: EntityType,
    pub table: Option<String>,
    pub properties: Vec<PropertyDescriptor>,
}

impl EntityDescriptor {
    pub fn new(entity_type: impl Into<EntityType>) -> Self {
        Self {
            entity_type: entity_type.into(),
            table: None,
            properties: Vec::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Shorthand for an integer id property
    pub fn id(self, name: impl Into<String>) -> Self {
        self.property(PropertyDescriptor::simple(name, ValueKind::Integer).id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_and_zoned_stored_as_text() {
        assert_eq!(ValueKind::Enum("SomeEnum".into()).column_type(), DataType::Text);
        assert_eq!(ValueKind::ZonedTimestamp.column_type(), DataType::Text);
        assert_eq!(ValueKind::LocalTimestamp.column_type(), DataType::Timestamp);
        assert_eq!(ValueKind::Uuid.column_type(), DataType::Uuid);
    }

    #[test]
    fn test_prefix_only_applies_to_embedded() {
        let simple = PropertyDescriptor::simple("name", ValueKind::Text).prefix("p_");
        assert_eq!(simple.kind, PropertyKind::Simple(ValueKind::Text));

        let embedded = PropertyDescriptor::embedded("address", "Address").prefix("home_");
        assert_eq!(
            embedded.kind,
            PropertyKind::Embedded {
                entity: EntityType::new("Address"),
                prefix: Some("home_".into()),
            }
        );
    }

    #[test]
    fn test_qualified_collections() {
        assert!(CollectionKind::List.is_qualified());
        assert!(CollectionKind::Map.is_qualified());
        assert!(!CollectionKind::Set.is_qualified());
    }
}
