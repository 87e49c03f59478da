//! Field-level structural rules.

use crate::codec::primitive_operator;
use crate::config::CodecConfig;
use crate::types::{Field, FieldType, DERIVED_FIELD_ID};

use super::error::ValidationError;

/// Returns `true` for names starting with an ASCII lowercase letter followed
/// by ASCII alphanumerics or `_`.
pub fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Returns `true` for names starting with an ASCII letter followed by ASCII
/// alphanumerics or `_`.
pub fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates one field of `table`.
///
/// # Arguments
/// * `table` - Name of the owning table, used in error messages
/// * `field` - Field to check
///
/// # Returns
/// The first violated rule, or `Ok(())`.
pub fn validate_field(table: &str, field: &Field) -> Result<(), ValidationError> {
    let names = || (table.to_string(), field.name().to_string());
    let constraints = field.constraints();

    if !is_valid_field_name(field.name()) {
        let (table, field) = names();
        return Err(ValidationError::InvalidFieldName { table, field });
    }

    // Derived flag and sentinel id imply each other
    if field.is_derived() != (field.id() == DERIVED_FIELD_ID) {
        let (table, name) = names();
        return Err(ValidationError::DerivedIdMismatch {
            table,
            field: name,
            id: field.id(),
        });
    }

    if field.is_derived() {
        if !field.field_type().is_primitive() {
            let (table, field) = names();
            return Err(ValidationError::DerivedNotPrimitive { table, field });
        }
        if !field.is_optional() {
            let (table, field) = names();
            return Err(ValidationError::DerivedNotOptional { table, field });
        }
        if field.is_sort_key() {
            let (table, field) = names();
            return Err(ValidationError::DerivedSortKey { table, field });
        }
        if constraints.is_frequently_used() {
            let (table, field) = names();
            return Err(ValidationError::DerivedFrequentlyUsed { table, field });
        }
    }

    if field.is_sort_key() && !field.is_required() {
        let (table, field) = names();
        return Err(ValidationError::SortKeyNotRequired { table, field });
    }

    if constraints.is_large_list() && !field.field_type().is_collection() {
        let (table, field) = names();
        return Err(ValidationError::LargeListNotCollection { table, field });
    }

    validate_field_type(table, field)?;
    validate_default(table, field)
}

fn validate_field_type(table: &str, field: &Field) -> Result<(), ValidationError> {
    let unsupported = |ty: &FieldType| ValidationError::UnsupportedType {
        table: table.to_string(),
        field: field.name().to_string(),
        type_name: ty.to_string(),
    };
    match field.field_type() {
        FieldType::Primitive(p) if p.is_sentinel() => Err(unsupported(field.field_type())),
        FieldType::Collection { element, .. } => match element.as_ref() {
            FieldType::Collection { .. } => Err(unsupported(field.field_type())),
            FieldType::Primitive(p) if p.is_sentinel() => Err(unsupported(field.field_type())),
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

fn validate_default(table: &str, field: &Field) -> Result<(), ValidationError> {
    let names = || (table.to_string(), field.name().to_string());
    let default = field.default_value();

    let forbids_default =
        field.is_required() || field.is_derived() || !field.field_type().is_primitive();
    if forbids_default {
        if default.is_some() {
            let (table, field) = names();
            return Err(ValidationError::UnexpectedDefault { table, field });
        }
        return Ok(());
    }

    let Some(default) = default else {
        if field.requires_default() {
            let (table, field) = names();
            return Err(ValidationError::MissingDefault { table, field });
        }
        return Ok(());
    };

    let compatible = field
        .field_type()
        .as_primitive()
        .and_then(|p| primitive_operator(p, &CodecConfig::default()).ok())
        .is_some_and(|op| op.is_valid(default));
    if !compatible {
        let (table, name) = names();
        return Err(ValidationError::IncompatibleDefault {
            table,
            field: name,
            expected: field.field_type().to_string(),
            got: default.type_name().to_string(),
        });
    }
    Ok(())
}
