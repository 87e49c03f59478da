/// Error type for model construction.
///
/// Raised when a `Field`, `Table` or `Schema` would be malformed; the value is
/// never constructed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Field '{field}' has negative id {id}")]
    NegativeFieldId { field: String, id: i16 },

    #[error("Field name must not be empty")]
    EmptyFieldName,

    #[error("Table name must not be empty")]
    EmptyTableName,

    #[error("Field '{field}' uses unsupported type '{type_name}'")]
    UnsupportedType { field: String, type_name: String },

    #[error("Field '{field}' default value must be a scalar, got {got}")]
    NonScalarDefault { field: String, got: String },

    #[error("Collection element type '{element}' is not allowed")]
    InvalidCollectionElement { element: String },

    #[error("Duplicate field id {id} in table '{table}' ('{first}' and '{second}')")]
    DuplicateFieldId {
        table: String,
        id: i16,
        first: String,
        second: String,
    },

    #[error("Duplicate field name '{field}' in table '{table}'")]
    DuplicateFieldName { table: String, field: String },

    #[error("Duplicate table '{table}' in schema '{schema}'")]
    DuplicateTable { schema: String, table: String },

    #[error("Field '{table}.{field}' references unknown table '{group}'")]
    UnresolvedGroup {
        table: String,
        field: String,
        group: String,
    },

    #[error("Group reference cycle through table '{table}'")]
    CyclicGroup { table: String },

    #[error("Unknown type '{type_name}'")]
    UnknownType { type_name: String },

    #[error("Unknown constraint '{name}'")]
    UnknownConstraint { name: String },

    #[error("Conflicting constraints: {message}")]
    ConflictingConstraints { message: String },

    #[error("Field '{field}' has invalid default: {message}")]
    InvalidDefault { field: String, message: String },

    #[error("Failed to read schema definition: {0}")]
    Io(String),

    #[error("Failed to parse schema definition: {0}")]
    Parse(String),
}
