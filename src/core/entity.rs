use super::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Name tag of an entity type ("Root", "Intermediate", ...)
///
/// Cloning is cheap; the name is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityType(Arc<str>);

impl EntityType {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EntityType {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// An entity instance: its type plus named property values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    entity_type: EntityType,
    properties: BTreeMap<String, Value>,
}

impl Entity {
    pub fn new(entity_type: impl Into<EntityType>) -> Self {
        Self {
            entity_type: entity_type.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Set a property value (builder style)
    pub fn with(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(property.into(), value.into());
        self
    }

    pub fn set(&mut self, property: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(property.into(), value.into());
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_equality_by_name() {
        assert_eq!(EntityType::new("Root"), EntityType::from("Root"));
        assert_ne!(EntityType::new("Root"), EntityType::new("Leaf"));
    }

    #[test]
    fn test_entity_properties() {
        let entity = Entity::new("Root").with("id", 1i64).with("name", "first");

        assert_eq!(entity.entity_type().name(), "Root");
        assert_eq!(entity.get("id"), Some(&Value::Integer(1)));
        assert_eq!(entity.get("missing"), None);
        assert_eq!(entity.properties().count(), 2);
    }
}
