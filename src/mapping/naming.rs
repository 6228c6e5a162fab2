use crate::core::EntityType;
use convert_case::{Case, Casing};
use std::fmt;

/// Derives table and column names for entities that do not declare them.
pub trait NamingStrategy: Send + Sync + fmt::Debug {
    fn table_name(&self, entity_type: &EntityType) -> String {
        entity_type.name().to_case(Case::Snake)
    }

    fn column_name(&self, property: &str) -> String {
        property.to_case(Case::Snake)
    }

    /// Column in a child table referencing its owner
    fn reverse_column_name(&self, owner_table: &str) -> String {
        owner_table.to_string()
    }

    /// Column holding the list index or map key of a qualified collection
    fn key_column(&self, reverse_column: &str) -> String {
        format!("{}_key", reverse_column)
    }
}

/// snake_case tables and columns
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultNamingStrategy;

impl NamingStrategy for DefaultNamingStrategy {}

/// UPPER_SNAKE tables and columns
#[derive(Debug, Default, Clone, Copy)]
pub struct UpperCaseNamingStrategy;

impl NamingStrategy for UpperCaseNamingStrategy {
    fn table_name(&self, entity_type: &EntityType) -> String {
        entity_type.name().to_case(Case::Snake).to_uppercase()
    }

    fn column_name(&self, property: &str) -> String {
        property.to_case(Case::Snake).to_uppercase()
    }

    fn key_column(&self, reverse_column: &str) -> String {
        format!("{}_KEY", reverse_column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_naming() {
        let naming = DefaultNamingStrategy;
        assert_eq!(naming.table_name(&EntityType::new("DummyEntity")), "dummy_entity");
        assert_eq!(naming.column_name("localDateTime"), "local_date_time");
        assert_eq!(naming.reverse_column_name("dummy_entity"), "dummy_entity");
        assert_eq!(naming.key_column("dummy_entity"), "dummy_entity_key");
    }

    #[test]
    fn test_upper_case_naming() {
        let naming = UpperCaseNamingStrategy;
        assert_eq!(naming.table_name(&EntityType::new("DummyEntity")), "DUMMY_ENTITY");
        assert_eq!(naming.column_name("someEnum"), "SOME_ENUM");
        assert_eq!(naming.key_column("DUMMY_ENTITY"), "DUMMY_ENTITY_KEY");
    }
}
