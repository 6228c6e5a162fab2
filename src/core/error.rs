use thiserror::Error;

use super::EntityType;
use crate::conversion::ChangeKind;

#[derive(Error, Debug)]
pub enum RelError {
    #[error("Cannot add a {actual} change to a batching change declared for {expected}")]
    ChangeKindMismatch { expected: ChangeKind, actual: ChangeKind },

    #[error("Cannot add a change for '{actual}' to a batching change declared for '{expected}'")]
    EntityTypeMismatch { expected: EntityType, actual: EntityType },

    #[error("Entity type '{0}' is not registered")]
    UnknownEntity(EntityType),

    #[error("Entity type '{0}' is already registered")]
    DuplicateEntity(EntityType),

    #[error("Property '{1}' not found on entity '{0}'")]
    UnknownProperty(EntityType, String),

    #[error("Property '{property}' of '{entity}' is not an entity and cannot be traversed in '{path}'")]
    NotTraversable {
        entity: EntityType,
        property: String,
        path: String,
    },

    #[error("Invalid property path: {0}")]
    InvalidPath(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Action not found: {0}")]
    ActionNotFound(String),
}

pub type Result<T> = std::result::Result<T, RelError>;
