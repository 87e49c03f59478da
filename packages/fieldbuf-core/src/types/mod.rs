//! Type and schema model: primitive types, field types, fields, tables,
//! schemas and values.
//!
//! The model is pure data. It is built once and then shared read-only;
//! interning caches live in [`TypeInterner`] and the codec layer, never in
//! the model itself.

mod constraints;
mod error;
mod field;
mod field_type;
mod interner;
mod primitive;
mod schema;
mod table;
mod value;

pub use constraints::{Constraints, Presence, SortOrder};
pub use error::ModelError;
pub use field::{Field, DERIVED_FIELD_ID};
pub use field_type::{CollectionKind, FieldType, GroupType, COLLECTION_ID_FACTOR, GROUP_TYPE_ID};
pub use interner::TypeInterner;
pub use primitive::PrimitiveType;
pub use schema::Schema;
pub use table::Table;
pub use value::Value;
