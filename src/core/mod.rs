pub mod entity;
pub mod error;
pub mod value;

pub use entity::{Entity, EntityType};
pub use error::{RelError, Result};
pub use value::{DataType, Value};
