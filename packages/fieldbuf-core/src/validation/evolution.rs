//! Compatibility check between two versions of a schema.
//!
//! Field ids are the only cross-version key: names may change, ids, types
//! and sort designations may not.

use crate::types::{Schema, Table};

use super::error::ValidationError;
use super::table::validate_schema;

/// Checks that `next` can replace `current`.
///
/// `next` must itself be structurally valid. Then, for every table of
/// `current`:
/// - the table still exists and its version did not decrease
/// - every stored field id still exists, with the same type, the same
///   required/optional constraint and the same sort designation
/// - every new stored field is optional and carries a default where its
///   type requires one
///
/// Derived fields are matched by name and may be added or removed freely.
///
/// # Returns
/// The first incompatibility found, or `Ok(())`.
pub fn validate_evolution(current: &Schema, next: &Schema) -> Result<(), ValidationError> {
    let result = check_schemas(current, next);
    match &result {
        Ok(()) => tracing::debug!(
            "Schema '{}' evolution validated: {} tables",
            next.name(),
            next.tables().len()
        ),
        Err(e) => tracing::warn!("Schema '{}' evolution rejected: {}", next.name(), e),
    }
    result
}

fn check_schemas(current: &Schema, next: &Schema) -> Result<(), ValidationError> {
    validate_schema(next)?;

    for table in current.tables() {
        let candidate = next
            .table(table.name())
            .ok_or_else(|| ValidationError::TableRemoved {
                table: table.name().to_string(),
            })?;
        validate_table_evolution(table, candidate)?;
    }
    Ok(())
}

/// Checks that table `next` can replace table `current`.
pub fn validate_table_evolution(current: &Table, next: &Table) -> Result<(), ValidationError> {
    let table = || current.name().to_string();

    if next.version() < current.version() {
        return Err(ValidationError::TableVersionRegressed {
            table: table(),
            from: current.version(),
            to: next.version(),
        });
    }

    for field in current.stored_fields() {
        let Some(candidate) = next.field_by_id(field.id()).filter(|f| f.is_stored()) else {
            return Err(ValidationError::FieldRemoved {
                table: table(),
                field: field.name().to_string(),
                id: field.id(),
            });
        };

        if candidate.name() != field.name() {
            tracing::debug!(
                "Field {} of '{}' renamed from '{}' to '{}'",
                field.id(),
                current.name(),
                field.name(),
                candidate.name()
            );
        }
        if candidate.field_type() != field.field_type() {
            return Err(ValidationError::FieldTypeChanged {
                table: table(),
                field: field.name().to_string(),
                from: field.field_type().to_string(),
                to: candidate.field_type().to_string(),
            });
        }
        if field.is_optional() && candidate.is_required() {
            return Err(ValidationError::PresenceNarrowed {
                table: table(),
                field: field.name().to_string(),
            });
        }
        if field.is_required() && candidate.is_optional() {
            return Err(ValidationError::PresenceWidened {
                table: table(),
                field: field.name().to_string(),
            });
        }
        if candidate.constraints().sort_order() != field.constraints().sort_order() {
            return Err(ValidationError::SortKeyChanged {
                table: table(),
                field: field.name().to_string(),
            });
        }
    }

    for added in next.stored_fields() {
        if current.field_by_id(added.id()).is_some() {
            continue;
        }
        if !added.is_optional() {
            return Err(ValidationError::NewFieldNotOptional {
                table: table(),
                field: added.name().to_string(),
            });
        }
        if added.requires_default() && added.default_value().is_none() {
            return Err(ValidationError::NewFieldWithoutDefault {
                table: table(),
                field: added.name().to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Constraints, Field, FieldType, PrimitiveType, SortOrder, Value};
    use crate::validation::ValidationRule;
    use std::sync::Arc;

    fn id() -> Field {
        Field::required(1, "id", PrimitiveType::Int32).unwrap()
    }

    fn label() -> Field {
        Field::optional(2, "label", PrimitiveType::String, "unknown").unwrap()
    }

    fn schema(version: i16, fields: Vec<Field>) -> Schema {
        Schema::new(
            "demo",
            vec![Arc::new(Table::new("t", version, fields).unwrap())],
        )
        .unwrap()
    }

    #[test]
    fn test_optional_addition_accepted() {
        let current = schema(1, vec![id(), label()]);
        let count = Field::optional(3, "count", PrimitiveType::Int32, 0).unwrap();
        let next = schema(2, vec![id(), label(), count]);
        validate_evolution(&current, &next).unwrap();
        validate_evolution(&current, &current).unwrap();
    }

    #[test]
    fn test_field_removal_rejected() {
        let current = schema(1, vec![id(), label()]);
        let next = schema(2, vec![label()]);
        assert_eq!(
            validate_evolution(&current, &next).unwrap_err(),
            ValidationError::FieldRemoved {
                table: "t".to_string(),
                field: "id".to_string(),
                id: 1,
            }
        );
    }

    #[test]
    fn test_type_change_rejected() {
        let current = schema(1, vec![id(), label()]);
        let next = schema(
            2,
            vec![Field::required(1, "id", PrimitiveType::Int64).unwrap(), label()],
        );
        assert!(matches!(
            validate_evolution(&current, &next),
            Err(ValidationError::FieldTypeChanged { .. })
        ));
    }

    #[test]
    fn test_presence_changes() {
        let current = schema(1, vec![id(), label()]);
        let narrowed = schema(
            2,
            vec![id(), Field::required(2, "label", PrimitiveType::String).unwrap()],
        );
        assert!(matches!(
            validate_evolution(&current, &narrowed),
            Err(ValidationError::PresenceNarrowed { .. })
        ));

        // Readers of the current version still require `id`
        let widened = schema(
            2,
            vec![Field::optional(1, "id", PrimitiveType::Int32, 0).unwrap(), label()],
        );
        assert_eq!(
            validate_evolution(&current, &widened).unwrap_err(),
            ValidationError::PresenceWidened {
                table: "t".to_string(),
                field: "id".to_string(),
            }
        );
    }

    #[test]
    fn test_new_field_rules() {
        let current = schema(1, vec![id()]);
        let required = schema(
            2,
            vec![id(), Field::required(2, "extra", PrimitiveType::Int32).unwrap()],
        );
        assert!(matches!(
            validate_evolution(&current, &required),
            Err(ValidationError::NewFieldNotOptional { .. })
        ));

        let without_default = Field::new(
            2,
            "extra",
            FieldType::primitive(PrimitiveType::Int32),
            Constraints::optional(),
            None,
        )
        .unwrap();
        assert!(matches!(
            validate_table_evolution(
                current.table("t").unwrap(),
                &Table::new("t", 2, vec![id(), without_default]).unwrap()
            ),
            Err(ValidationError::NewFieldWithoutDefault { .. })
        ));

        // Binary needs no explicit default
        let blob = Field::new(
            2,
            "blob",
            FieldType::primitive(PrimitiveType::Binary),
            Constraints::optional(),
            None,
        )
        .unwrap();
        validate_evolution(&current, &schema(2, vec![id(), blob])).unwrap();
    }

    #[test]
    fn test_sort_key_change_rejected() {
        let key = |order| {
            Field::new(
                1,
                "id",
                FieldType::primitive(PrimitiveType::Int32),
                Constraints::required().with_sort(order),
                None,
            )
            .unwrap()
        };
        let current = schema(1, vec![key(SortOrder::Ascending)]);
        let next = schema(2, vec![key(SortOrder::Descending)]);
        assert!(matches!(
            validate_evolution(&current, &next),
            Err(ValidationError::SortKeyChanged { .. })
        ));
        assert!(matches!(
            validate_evolution(&current, &schema(2, vec![id()])),
            Err(ValidationError::SortKeyChanged { .. })
        ));
    }

    #[test]
    fn test_table_level_rules() {
        let current = schema(3, vec![id()]);
        assert!(matches!(
            validate_evolution(&current, &schema(2, vec![id()])),
            Err(ValidationError::TableVersionRegressed { from: 3, to: 2, .. })
        ));

        let empty = Schema::new("demo", Vec::new()).unwrap();
        let err = validate_evolution(&current, &empty).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TableRemoved {
                table: "t".to_string()
            }
        );
        assert_eq!(err.rule(), ValidationRule::Compatibility);
    }

    #[test]
    fn test_renames_and_derived_fields_allowed() {
        let current = schema(1, vec![id(), label()]);
        let total = Field::new(
            0,
            "total",
            FieldType::primitive(PrimitiveType::Int64),
            Constraints::derived(),
            None,
        )
        .unwrap();
        let next = schema(
            2,
            vec![
                Field::required(1, "key", PrimitiveType::Int32).unwrap(),
                Field::optional(2, "title", PrimitiveType::String, Value::from("none")).unwrap(),
                total,
            ],
        );
        validate_evolution(&current, &next).unwrap();
    }

    #[test]
    fn test_invalid_next_schema_rejected() {
        let current = schema(1, vec![id()]);
        let next = schema(2, vec![Field::required(1, "Id", PrimitiveType::Int32).unwrap()]);
        assert_eq!(
            validate_evolution(&current, &next).unwrap_err().rule(),
            ValidationRule::Naming
        );
    }
}
