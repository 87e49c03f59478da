//! Classified validation failures.

use thiserror::Error;

/// Rule family a [`ValidationError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationRule {
    Naming,
    DerivedField,
    SortKey,
    LargeList,
    FieldType,
    DefaultValue,
    TableVersion,
    GroupReference,
    Compatibility,
}

/// Structural or evolution rule violation.
///
/// Validation is fail-fast: the first violation found is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Field name '{field}' in table '{table}' must start with a lowercase letter and contain only letters, digits and '_'")]
    InvalidFieldName { table: String, field: String },

    #[error("Table name '{table}' must start with a letter and contain only letters, digits and '_'")]
    InvalidTableName { table: String },

    #[error("Schema name '{schema}' must start with a letter and contain only letters, digits and '_'")]
    InvalidSchemaName { schema: String },

    #[error("Field '{table}.{field}': derived fields must use id 0 and id 0 is reserved for derived fields (got id {id})")]
    DerivedIdMismatch { table: String, field: String, id: i16 },

    #[error("Derived field '{table}.{field}' must have a primitive type")]
    DerivedNotPrimitive { table: String, field: String },

    #[error("Derived field '{table}.{field}' must be optional")]
    DerivedNotOptional { table: String, field: String },

    #[error("Derived field '{table}.{field}' cannot be a sort key")]
    DerivedSortKey { table: String, field: String },

    #[error("Derived field '{table}.{field}' cannot be frequently used")]
    DerivedFrequentlyUsed { table: String, field: String },

    #[error("Sort key '{table}.{field}' must be required")]
    SortKeyNotRequired { table: String, field: String },

    #[error("Table '{table}' has more than one sort key ('{first}' and '{second}')")]
    MultipleSortKeys {
        table: String,
        first: String,
        second: String,
    },

    #[error("Field '{table}.{field}' is marked large_list but is not a collection")]
    LargeListNotCollection { table: String, field: String },

    #[error("Field '{table}.{field}' has unsupported type '{type_name}'")]
    UnsupportedType {
        table: String,
        field: String,
        type_name: String,
    },

    #[error("Optional field '{table}.{field}' must declare a default value")]
    MissingDefault { table: String, field: String },

    #[error("Field '{table}.{field}' must not declare a default value")]
    UnexpectedDefault { table: String, field: String },

    #[error("Default of field '{table}.{field}' is not a valid {expected} (got {got})")]
    IncompatibleDefault {
        table: String,
        field: String,
        expected: String,
        got: String,
    },

    #[error("Table '{table}' has invalid version {version}")]
    InvalidTableVersion { table: String, version: i16 },

    #[error("Field '{table}.{field}' references unknown table '{group}'")]
    UnresolvedGroup {
        table: String,
        field: String,
        group: String,
    },

    #[error("Table '{table}' was removed")]
    TableRemoved { table: String },

    #[error("Field '{table}.{field}' (id {id}) was removed")]
    FieldRemoved { table: String, field: String, id: i16 },

    #[error("Field '{table}.{field}' changed type from {from} to {to}")]
    FieldTypeChanged {
        table: String,
        field: String,
        from: String,
        to: String,
    },

    #[error("Field '{table}.{field}' changed from optional to required")]
    PresenceNarrowed { table: String, field: String },

    #[error("Field '{table}.{field}' changed from required to optional")]
    PresenceWidened { table: String, field: String },

    #[error("Sort key of field '{table}.{field}' changed")]
    SortKeyChanged { table: String, field: String },

    #[error("New field '{table}.{field}' must be optional")]
    NewFieldNotOptional { table: String, field: String },

    #[error("New field '{table}.{field}' must declare a default value")]
    NewFieldWithoutDefault { table: String, field: String },

    #[error("Table '{table}' version decreased from {from} to {to}")]
    TableVersionRegressed { table: String, from: i16, to: i16 },
}

impl ValidationError {
    /// Rule family of this violation.
    pub fn rule(&self) -> ValidationRule {
        use ValidationError::*;
        match self {
            InvalidFieldName { .. } | InvalidTableName { .. } | InvalidSchemaName { .. } => {
                ValidationRule::Naming
            }
            DerivedIdMismatch { .. }
            | DerivedNotPrimitive { .. }
            | DerivedNotOptional { .. }
            | DerivedSortKey { .. }
            | DerivedFrequentlyUsed { .. } => ValidationRule::DerivedField,
            SortKeyNotRequired { .. } | MultipleSortKeys { .. } => ValidationRule::SortKey,
            LargeListNotCollection { .. } => ValidationRule::LargeList,
            UnsupportedType { .. } => ValidationRule::FieldType,
            MissingDefault { .. } | UnexpectedDefault { .. } | IncompatibleDefault { .. } => {
                ValidationRule::DefaultValue
            }
            InvalidTableVersion { .. } => ValidationRule::TableVersion,
            UnresolvedGroup { .. } => ValidationRule::GroupReference,
            TableRemoved { .. }
            | FieldRemoved { .. }
            | FieldTypeChanged { .. }
            | PresenceNarrowed { .. }
            | PresenceWidened { .. }
            | SortKeyChanged { .. }
            | NewFieldNotOptional { .. }
            | NewFieldWithoutDefault { .. }
            | TableVersionRegressed { .. } => ValidationRule::Compatibility,
        }
    }

    /// Name of the table the violation concerns, if any.
    pub fn table(&self) -> Option<&str> {
        use ValidationError::*;
        match self {
            InvalidSchemaName { .. } => None,
            InvalidFieldName { table, .. }
            | InvalidTableName { table }
            | DerivedIdMismatch { table, .. }
            | DerivedNotPrimitive { table, .. }
            | DerivedNotOptional { table, .. }
            | DerivedSortKey { table, .. }
            | DerivedFrequentlyUsed { table, .. }
            | SortKeyNotRequired { table, .. }
            | MultipleSortKeys { table, .. }
            | LargeListNotCollection { table, .. }
            | UnsupportedType { table, .. }
            | MissingDefault { table, .. }
            | UnexpectedDefault { table, .. }
            | IncompatibleDefault { table, .. }
            | InvalidTableVersion { table, .. }
            | UnresolvedGroup { table, .. }
            | TableRemoved { table }
            | FieldRemoved { table, .. }
            | FieldTypeChanged { table, .. }
            | PresenceNarrowed { table, .. }
            | PresenceWidened { table, .. }
            | SortKeyChanged { table, .. }
            | NewFieldNotOptional { table, .. }
            | NewFieldWithoutDefault { table, .. }
            | TableVersionRegressed { table, .. } => Some(table.as_str()),
        }
    }
}
