//! Schema evolution over definitions loaded from JSON.

use std::sync::Arc;

use ntest::timeout;

use fieldbuf_core::definition::FieldDefinition;
use fieldbuf_core::validation::ValidationRule;
use fieldbuf_core::{
    validate_evolution, validate_schema, OperatorRegistry, Record, RecordError, SchemaDefinition,
    TypeInterner, ValidationError, Value,
};

use super::helpers::{codec, SHOP_SCHEMA, SIMPLE_SCHEMA};

fn field(
    id: i16,
    name: &str,
    type_name: &str,
    constraints: &[&str],
    default: Option<serde_json::Value>,
) -> FieldDefinition {
    FieldDefinition {
        id,
        name: name.to_string(),
        r#type: type_name.to_string(),
        constraints: constraints.iter().map(|c| c.to_string()).collect(),
        default,
    }
}

#[timeout(1000)]
#[test]
fn test_simple_schema_evolution() -> anyhow::Result<()> {
    let interner = TypeInterner::new();
    let current_def = SchemaDefinition::from_json_str(SIMPLE_SCHEMA)?;
    let current = current_def.build(&interner)?;
    validate_schema(&current)?;

    // Adding an optional field with a default is compatible
    let mut added = current_def.clone();
    added.tables[0].version = 2;
    added.tables[0]
        .fields
        .push(field(3, "count", "int32", &["optional"], Some(serde_json::json!(0))));
    validate_evolution(&current, &added.build(&interner)?)?;

    // Removing `id` is not
    let mut removed = current_def.clone();
    removed.tables[0].version = 2;
    removed.tables[0].fields.retain(|f| f.name != "id");
    let err = validate_evolution(&current, &removed.build(&interner)?).unwrap_err();
    assert_eq!(
        err,
        ValidationError::FieldRemoved {
            table: "t".to_string(),
            field: "id".to_string(),
            id: 1,
        }
    );
    assert_eq!(err.rule(), ValidationRule::Compatibility);
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_nested_schema_evolution() -> anyhow::Result<()> {
    let interner = TypeInterner::new();
    let current_def = SchemaDefinition::from_json_str(SHOP_SCHEMA)?;
    let current = current_def.build(&interner)?;
    validate_schema(&current)?;

    // A new table and a renamed field in the nested group
    let mut next_def = current_def.clone();
    next_def.tables[1].version = 2;
    next_def.tables[1].fields[0].name = "full_name".to_string();
    next_def.tables.push(serde_json::from_value(serde_json::json!({
        "name": "Coupon",
        "version": 1,
        "fields": [
            { "id": 1, "name": "code", "type": "string", "constraints": ["required"] }
        ]
    }))?);
    validate_evolution(&current, &next_def.build(&interner)?)?;

    // Changing the list element type is rejected
    let mut retyped = current_def.clone();
    retyped.tables[0].fields[2].r#type = "list<int32>".to_string();
    assert!(matches!(
        validate_evolution(&current, &retyped.build(&interner)?),
        Err(ValidationError::FieldTypeChanged { ref field, .. }) if field == "items"
    ));

    // Dropping the sort designation is rejected
    let mut unsorted = current_def.clone();
    unsorted.tables[0].fields[0].constraints = vec!["required".to_string()];
    assert!(matches!(
        validate_evolution(&current, &unsorted.build(&interner)?),
        Err(ValidationError::SortKeyChanged { .. })
    ));
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_structural_errors_block_evolution() -> anyhow::Result<()> {
    let interner = TypeInterner::new();
    let current = SchemaDefinition::from_json_str(SIMPLE_SCHEMA)?.build(&interner)?;

    let mut next_def = SchemaDefinition::from_json_str(SIMPLE_SCHEMA)?;
    next_def.tables[0]
        .fields
        .push(field(0, "doubled", "int64", &["derived"], Some(serde_json::json!(1))));
    let next = next_def.build(&interner)?;
    assert_eq!(
        validate_evolution(&current, &next).unwrap_err().rule(),
        ValidationRule::DefaultValue
    );
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_newer_reader_fills_added_defaults() -> anyhow::Result<()> {
    let interner = TypeInterner::new();
    let current_def = SchemaDefinition::from_json_str(SIMPLE_SCHEMA)?;
    let current = current_def.build(&interner)?;

    let mut next_def = current_def.clone();
    next_def.tables[0].version = 2;
    next_def.tables[0]
        .fields
        .push(field(3, "count", "int32", &["optional"], Some(serde_json::json!(0))));
    let next = next_def.build(&interner)?;
    validate_evolution(&current, &next)?;

    let registry = OperatorRegistry::new();
    let old = codec(&registry, &current, "t")?;
    let new = codec(&registry, &next, "t")?;

    let mut written = Record::new(old);
    written.set_by_name("id", 7)?;
    let decoded = Record::from_bytes(Arc::clone(&new), &written.to_bytes()?)?;
    assert_eq!(decoded.get_by_name("id")?, Value::Int32(7));
    assert_eq!(decoded.get_by_name("count")?, Value::Int32(0));
    assert_eq!(decoded.get_by_name("label")?, Value::from("unknown"));

    // And the older reader ignores the added field
    let mut newer = Record::new(new);
    newer.set_by_name("id", 8)?;
    newer.set_by_name("count", 3)?;
    let old = codec(&registry, &current, "t")?;
    let read_back = Record::from_bytes(old, &newer.to_bytes()?)?;
    assert_eq!(read_back.get_by_name("id")?, Value::Int32(8));
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_required_field_stays_required() -> anyhow::Result<()> {
    let interner = TypeInterner::new();
    let current_def = SchemaDefinition::from_json_str(SIMPLE_SCHEMA)?;
    let current = current_def.build(&interner)?;

    let mut next_def = current_def.clone();
    next_def.tables[0].version = 2;
    next_def.tables[0].fields[0].constraints = vec!["optional".to_string()];
    next_def.tables[0].fields[0].default = Some(serde_json::json!(0));
    let next = next_def.build(&interner)?;

    // Data written without `id` by the relaxed version
    let registry = OperatorRegistry::new();
    let mut relaxed = Record::new(codec(&registry, &next, "t")?);
    relaxed.set_by_name("label", "no id")?;
    let bytes = relaxed.to_bytes()?;
    assert!(matches!(
        Record::from_bytes(codec(&registry, &current, "t")?, &bytes),
        Err(RecordError::MissingRequired { ref field, .. }) if field == "id"
    ));

    assert_eq!(
        validate_evolution(&current, &next).unwrap_err(),
        ValidationError::PresenceWidened {
            table: "t".to_string(),
            field: "id".to_string(),
        }
    );
    Ok(())
}
