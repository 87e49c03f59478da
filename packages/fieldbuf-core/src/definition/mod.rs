//! Textual schema definitions and their conversion to the schema model.

mod build;
mod file;

pub use build::parse_type;
pub use file::{FieldDefinition, SchemaDefinition, TableDefinition};
