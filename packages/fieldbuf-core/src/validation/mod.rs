//! Structural validation and schema evolution checks.

mod error;
mod evolution;
mod field;
mod table;

pub use error::{ValidationError, ValidationRule};
pub use evolution::{validate_evolution, validate_table_evolution};
pub use field::{is_valid_field_name, is_valid_table_name, validate_field};
pub use table::{validate_schema, validate_table};
