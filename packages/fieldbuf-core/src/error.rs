//! Codec and record error types.

use thiserror::Error;

/// Value codec errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Value failed the operator's validity check
    #[error("Invalid value: expected {expected}, got {got}")]
    InvalidValue { expected: String, got: String },

    /// Read outside the buffer
    #[error("Out of bounds read: offset {offset}, length {length}, buffer length {buffer_len}")]
    OutOfBounds {
        offset: usize,
        length: usize,
        buffer_len: usize,
    },

    /// Structurally inconsistent buffer
    #[error("Corrupt buffer: {0}")]
    Corrupt(String),

    /// STRING payload is not valid UTF-8
    #[error("Invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// Payload length does not fit the metadata slot
    #[error("Length {length} of {type_name} exceeds maximum {max}")]
    LengthOverflow {
        type_name: String,
        length: usize,
        max: usize,
    },

    /// Group type has no table bound to it
    #[error("Group '{group}' is not resolved to a table")]
    UnresolvedGroup { group: String },

    /// Type has no operator
    #[error("Unsupported type '{type_name}'")]
    UnsupportedType { type_name: String },

    /// Configured limit exceeded
    #[error("{what} {requested} exceeds limit {limit}")]
    LimitExceeded {
        what: &'static str,
        requested: usize,
        limit: usize,
    },

    /// Nested record could not be encoded
    #[error("Nested record of table '{table}' failed: {message}")]
    NestedRecord { table: String, message: String },
}

/// Record access errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    /// Required field not set
    #[error("Required field '{field}' of table '{table}' is not set")]
    MissingRequired { table: String, field: String },

    /// Optional field without value or default
    #[error("Field '{field}' of table '{table}' has no value and no default")]
    NoValue { table: String, field: String },

    /// Field does not belong to the record's table
    #[error("Field '{field}' not found in table '{table}'")]
    UnknownField { table: String, field: String },

    /// Value rejected by the field's operator
    #[error("Value rejected for field '{table}.{field}': expected {expected}, got {got}")]
    ValueRejected {
        table: String,
        field: String,
        expected: String,
        got: String,
    },

    /// Derived field read without a bound computation
    #[error("Derived field '{field}' of table '{table}' has no bound computation")]
    DerivedNotBound { table: String, field: String },

    /// Attempt to store a derived field
    #[error("Derived field '{field}' of table '{table}' cannot be set")]
    DerivedNotWritable { table: String, field: String },

    /// Computation bound to a stored field
    #[error("Field '{field}' of table '{table}' is not derived")]
    NotDerived { table: String, field: String },

    /// Attempt to clear a required field
    #[error("Field '{field}' of table '{table}' is required and cannot be cleared")]
    NotOptional { table: String, field: String },

    /// List operation on a non-collection field
    #[error("Field '{field}' of table '{table}' is not a collection")]
    NotACollection { table: String, field: String },

    /// List element index out of range
    #[error("Index {index} out of range for field '{field}' with {len} elements")]
    IndexOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },

    /// Ordering requested on a table without sort key
    #[error("Table '{table}' has no sort key")]
    NoSortKey { table: String },

    /// Records of different tables
    #[error("Table mismatch: expected '{expected}', got '{got}'")]
    TableMismatch { expected: String, got: String },

    /// JSON value could not be converted
    #[error("Invalid JSON for field '{field}': {message}")]
    Json { field: String, message: String },

    #[error(transparent)]
    Codec(#[from] CodecError),
}
