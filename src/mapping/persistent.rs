use super::descriptor::{EntityDescriptor, PropertyDescriptor, PropertyKind};
use super::naming::NamingStrategy;
use crate::core::{DataType, Entity, EntityType, RelError, Result, Value};
use std::collections::HashMap;

/// Resolved persistence metadata of one property
#[derive(Debug, Clone)]
pub struct PersistentProperty {
    name: String,
    owner: EntityType,
    kind: PropertyKind,
    column_name: String,
    reverse_column_name: Option<String>,
    key_column: Option<String>,
    is_id: bool,
    is_version: bool,
}

impl PersistentProperty {
    fn resolve(
        descriptor: &PropertyDescriptor,
        owner: &EntityType,
        owner_table: &str,
        naming: &dyn NamingStrategy,
    ) -> Self {
        let column_name = descriptor
            .column
            .clone()
            .unwrap_or_else(|| naming.column_name(&descriptor.name));

        let references_table = matches!(
            descriptor.kind,
            PropertyKind::Entity(_) | PropertyKind::Collection { .. }
        );
        let reverse_column_name = references_table.then(|| {
            descriptor
                .reverse_column
                .clone()
                .unwrap_or_else(|| naming.reverse_column_name(owner_table))
        });

        let key_column = match (&descriptor.kind, &reverse_column_name) {
            (PropertyKind::Collection { kind, .. }, Some(reverse)) if kind.is_qualified() => Some(
                descriptor
                    .key_column
                    .clone()
                    .unwrap_or_else(|| naming.key_column(reverse)),
            ),
            _ => None,
        };

        Self {
            name: descriptor.name.clone(),
            owner: owner.clone(),
            kind: descriptor.kind.clone(),
            column_name,
            reverse_column_name,
            key_column,
            is_id: descriptor.is_id,
            is_version: descriptor.is_version,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &EntityType {
        &self.owner
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// Storage type; `None` for properties that map to other tables or embedded columns.
    pub fn column_type(&self) -> Option<DataType> {
        match &self.kind {
            PropertyKind::Simple(kind) | PropertyKind::SimpleCollection(kind) => {
                Some(kind.column_type())
            }
            _ => None,
        }
    }

    pub fn reverse_column_name(&self) -> Option<&str> {
        self.reverse_column_name.as_deref()
    }

    pub fn key_column(&self) -> Option<&str> {
        self.key_column.as_deref()
    }

    /// `None` unless embedded; `Some("")` for an embedded property without prefix
    pub fn embedded_prefix(&self) -> Option<&str> {
        match &self.kind {
            PropertyKind::Embedded { prefix, .. } => Some(prefix.as_deref().unwrap_or("")),
            _ => None,
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.kind, PropertyKind::Embedded { .. })
    }

    /// Whether the property leads to a nested entity (own table or embedded)
    pub fn is_entity(&self) -> bool {
        self.kind.target_entity().is_some()
    }

    pub fn is_collection(&self) -> bool {
        matches!(
            self.kind,
            PropertyKind::Collection { .. } | PropertyKind::SimpleCollection(_)
        )
    }

    pub fn is_qualified(&self) -> bool {
        matches!(&self.kind, PropertyKind::Collection { kind, .. } if kind.is_qualified())
    }

    pub fn is_id(&self) -> bool {
        self.is_id
    }

    pub fn is_version(&self) -> bool {
        self.is_version
    }

    pub fn target_entity(&self) -> Option<&EntityType> {
        self.kind.target_entity()
    }
}

/// Resolved persistence metadata of one entity type
#[derive(Debug, Clone)]
pub struct PersistentEntity {
    entity_type: EntityType,
    table_name: String,
    properties: Vec<PersistentProperty>,
    by_name: HashMap<String, usize>,
    id_property: Option<usize>,
    version_property: Option<usize>,
}

impl PersistentEntity {
    pub fn from_descriptor(descriptor: &EntityDescriptor, naming: &dyn NamingStrategy) -> Result<Self> {
        let entity_type = descriptor.entity_type.clone();
        let table_name = descriptor
            .table
            .clone()
            .unwrap_or_else(|| naming.table_name(&entity_type));

        let mut properties = Vec::with_capacity(descriptor.properties.len());
        let mut by_name = HashMap::new();
        let mut id_property = None;
        let mut version_property = None;

        for property in &descriptor.properties {
            let index = properties.len();
            if by_name.insert(property.name.clone(), index).is_some() {
                return Err(RelError::InvalidConfig(format!(
                    "Property '{}' declared twice on '{}'",
                    property.name, entity_type
                )));
            }

            if property.is_id && id_property.replace(index).is_some() {
                return Err(RelError::InvalidConfig(format!(
                    "Entity '{}' declares more than one id property",
                    entity_type
                )));
            }

            if property.is_version && version_property.replace(index).is_some() {
                return Err(RelError::InvalidConfig(format!(
                    "Entity '{}' declares more than one version property",
                    entity_type
                )));
            }

            properties.push(PersistentProperty::resolve(
                property,
                &entity_type,
                &table_name,
                naming,
            ));
        }

        Ok(Self {
            entity_type,
            table_name,
            properties,
            by_name,
            id_property,
            version_property,
        })
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn properties(&self) -> &[PersistentProperty] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PersistentProperty> {
        self.by_name.get(name).map(|&idx| &self.properties[idx])
    }

    pub fn required_property(&self, name: &str) -> Result<&PersistentProperty> {
        self.property(name)
            .ok_or_else(|| RelError::UnknownProperty(self.entity_type.clone(), name.to_string()))
    }

    pub fn id_property(&self) -> Option<&PersistentProperty> {
        self.id_property.map(|idx| &self.properties[idx])
    }

    pub fn version_property(&self) -> Option<&PersistentProperty> {
        self.version_property.map(|idx| &self.properties[idx])
    }

    /// Id value of an instance; `None` when absent or null
    pub fn id_value<'a>(&self, entity: &'a Entity) -> Option<&'a Value> {
        self.id_property()
            .and_then(|p| entity.get(p.name()))
            .filter(|v| !v.is_null())
    }

    pub fn version_value<'a>(&self, entity: &'a Entity) -> Option<&'a Value> {
        self.version_property()
            .and_then(|p| entity.get(p.name()))
            .filter(|v| !v.is_null())
    }
}
