//! Table- and schema-level structural rules.

use crate::types::{Schema, Table};

use super::error::ValidationError;
use super::field::{is_valid_table_name, validate_field};

/// Validates a table and each of its fields in declaration order.
///
/// Field id and name uniqueness are enforced when the table is constructed.
pub fn validate_table(table: &Table) -> Result<(), ValidationError> {
    if !is_valid_table_name(table.name()) {
        return Err(ValidationError::InvalidTableName {
            table: table.name().to_string(),
        });
    }
    if table.version() < 1 {
        return Err(ValidationError::InvalidTableVersion {
            table: table.name().to_string(),
            version: table.version(),
        });
    }

    let mut sort_key: Option<&str> = None;
    for field in table.fields() {
        validate_field(table.name(), field)?;
        if field.is_sort_key() {
            if let Some(first) = sort_key {
                return Err(ValidationError::MultipleSortKeys {
                    table: table.name().to_string(),
                    first: first.to_string(),
                    second: field.name().to_string(),
                });
            }
            sort_key = Some(field.name());
        }
    }
    Ok(())
}

/// Validates a whole schema: its name, every table, and every group
/// reference.
///
/// A group reference resolves if the schema contains the named table or the
/// group type already carries a resolved table.
///
/// # Returns
/// The first violated rule, or `Ok(())`.
pub fn validate_schema(schema: &Schema) -> Result<(), ValidationError> {
    if !is_valid_table_name(schema.name()) {
        return Err(ValidationError::InvalidSchemaName {
            schema: schema.name().to_string(),
        });
    }

    for table in schema.tables() {
        validate_table(table)?;
    }

    for (table, field, group) in schema.group_references() {
        let external = field
            .field_type()
            .referenced_group()
            .is_some_and(|g| g.is_resolved());
        if schema.table(group).is_none() && !external {
            return Err(ValidationError::UnresolvedGroup {
                table: table.name().to_string(),
                field: field.name().to_string(),
                group: group.to_string(),
            });
        }
    }

    tracing::debug!(
        "Schema '{}' validated: {} tables",
        schema.name(),
        schema.tables().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Constraints, Field, FieldType, PrimitiveType, SortOrder};
    use crate::validation::ValidationRule;
    use std::sync::Arc;

    fn sorted(id: i16, name: &str) -> Field {
        Field::new(
            id,
            name,
            FieldType::primitive(PrimitiveType::Int64),
            Constraints::required().with_sort(SortOrder::Ascending),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_table_rules() {
        let ok = Table::new("Event", 1, vec![sorted(1, "at")]).unwrap();
        validate_table(&ok).unwrap();

        let bad_name = Table::new("event-log", 1, vec![sorted(1, "at")]).unwrap();
        assert_eq!(
            validate_table(&bad_name).unwrap_err().rule(),
            ValidationRule::Naming
        );

        let bad_version = Table::new("Event", 0, vec![sorted(1, "at")]).unwrap();
        assert!(matches!(
            validate_table(&bad_version),
            Err(ValidationError::InvalidTableVersion { version: 0, .. })
        ));

        let two_keys = Table::new("Event", 1, vec![sorted(1, "at"), sorted(2, "seq")]).unwrap();
        assert_eq!(
            validate_table(&two_keys).unwrap_err(),
            ValidationError::MultipleSortKeys {
                table: "Event".to_string(),
                first: "at".to_string(),
                second: "seq".to_string(),
            }
        );
    }

    #[test]
    fn test_field_errors_surface() {
        let table = Table::new(
            "Event",
            1,
            vec![Field::new(
                3,
                "count",
                FieldType::primitive(PrimitiveType::Int32),
                Constraints::optional(),
                None,
            )
            .unwrap()],
        )
        .unwrap();
        let err = validate_table(&table).unwrap_err();
        assert_eq!(err.table(), Some("Event"));
        assert_eq!(err.rule(), ValidationRule::DefaultValue);
    }

    #[test]
    fn test_group_references() {
        let order = Arc::new(
            Table::new(
                "Order",
                1,
                vec![
                    Field::required(1, "id", PrimitiveType::Int64).unwrap(),
                    Field::required(2, "customer", FieldType::group("Customer")).unwrap(),
                ],
            )
            .unwrap(),
        );
        let dangling = Schema::new("Shop", vec![Arc::clone(&order)]).unwrap();
        assert_eq!(
            validate_schema(&dangling).unwrap_err(),
            ValidationError::UnresolvedGroup {
                table: "Order".to_string(),
                field: "customer".to_string(),
                group: "Customer".to_string(),
            }
        );

        let customer = Arc::new(
            Table::new(
                "Customer",
                1,
                vec![Field::required(1, "name", PrimitiveType::String).unwrap()],
            )
            .unwrap(),
        );
        let complete = Schema::new("Shop", vec![order, Arc::clone(&customer)]).unwrap();
        validate_schema(&complete).unwrap();

        // Resolved outside the schema
        let external = Arc::new(
            Table::new(
                "Invoice",
                1,
                vec![Field::new(
                    1,
                    "lines",
                    FieldType::list(FieldType::resolved_group(customer)).unwrap(),
                    Constraints::optional(),
                    None,
                )
                .unwrap()],
            )
            .unwrap(),
        );
        validate_schema(&Schema::new("Billing", vec![external]).unwrap()).unwrap();
    }

    #[test]
    fn test_schema_name() {
        let schema = Schema::new("my schema", Vec::new()).unwrap();
        assert!(matches!(
            validate_schema(&schema),
            Err(ValidationError::InvalidSchemaName { .. })
        ));
    }
}
