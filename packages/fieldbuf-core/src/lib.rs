//! Schema-defined binary record serialization.
//!
//! Provides the type and schema model, per-type value codecs, a record
//! layout engine with random field access, and structural and schema
//! evolution validation.

pub mod codec;
pub mod config;
pub mod definition;
pub mod error;
pub mod record;
pub mod types;
pub mod validation;

pub use codec::{OperatorRegistry, ValueOperator};
pub use config::CodecConfig;
pub use definition::SchemaDefinition;
pub use error::{CodecError, RecordError};
pub use record::{Record, RecordBuffer, TableCodec};
pub use types::{Field, FieldType, ModelError, PrimitiveType, Schema, Table, TypeInterner, Value};
pub use validation::{validate_evolution, validate_schema, ValidationError};
