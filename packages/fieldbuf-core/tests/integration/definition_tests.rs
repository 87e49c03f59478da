//! Loading, building and saving schema definitions.

use std::fs;

use ntest::timeout;
use tempfile::tempdir;

use fieldbuf_core::definition::parse_type;
use fieldbuf_core::{FieldType, ModelError, PrimitiveType, SchemaDefinition, TypeInterner};

use super::helpers::SHOP_SCHEMA;

#[timeout(1000)]
#[test]
fn test_load_and_build_from_file() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("shop.json");
    fs::write(&path, SHOP_SCHEMA)?;

    let definition = SchemaDefinition::load(&path)?;
    let schema = definition.build(&TypeInterner::new())?;
    assert_eq!(schema.name(), "Shop");
    assert_eq!(schema.tables().len(), 2);

    let order = schema
        .table("Order")
        .ok_or_else(|| anyhow::anyhow!("Order missing"))?;
    let customer = order
        .field_by_name("customer")
        .ok_or_else(|| anyhow::anyhow!("customer missing"))?;
    let group = customer
        .field_type()
        .as_group()
        .ok_or_else(|| anyhow::anyhow!("customer is not a group"))?;
    assert!(group.is_resolved());
    assert_eq!(group.name(), "Customer");
    assert_eq!(order.sort_key().map(|f| f.name()), Some("id"));
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_save_and_reload() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let schema = SchemaDefinition::from_json_str(SHOP_SCHEMA)?.build(&TypeInterner::new())?;

    let path = dir.path().join("saved.json");
    schema.to_definition()?.save(&path)?;
    let reloaded = SchemaDefinition::load(&path)?.build(&TypeInterner::new())?;
    assert_eq!(reloaded.to_definition()?, schema.to_definition()?);
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_load_errors() -> anyhow::Result<()> {
    let dir = tempdir()?;
    assert!(matches!(
        SchemaDefinition::load(dir.path().join("missing.json")),
        Err(ModelError::Io(_))
    ));

    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"name\": ")?;
    assert!(matches!(SchemaDefinition::load(&path), Err(ModelError::Parse(_))));

    let dangling = SchemaDefinition::from_json_str(
        r#"{ "name": "S", "tables": [ { "name": "A", "version": 1, "fields": [
            { "id": 1, "name": "b", "type": "B", "constraints": ["required"] }
        ] } ] }"#,
    )?;
    assert!(matches!(
        dangling.build(&TypeInterner::new()),
        Err(ModelError::UnresolvedGroup { .. })
    ));
    // Kept unresolved on request
    assert_eq!(dangling.build_unresolved(&TypeInterner::new())?.tables().len(), 1);
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_type_strings_are_interned() -> anyhow::Result<()> {
    let interner = TypeInterner::new();
    let a = parse_type("list<int64>", &interner)?;
    let b = parse_type(" list<int64> ", &interner)?;
    assert!(std::sync::Arc::ptr_eq(&a, &b));
    assert_eq!(
        a.element(),
        Some(&FieldType::primitive(PrimitiveType::Int64))
    );

    // One entry per distinct type string; the group stays unbound
    let shop = SchemaDefinition::from_json_str(SHOP_SCHEMA)?.build(&interner)?;
    assert_eq!(interner.len(), 7);
    let customer = parse_type("Customer", &interner)?;
    assert!(!customer.as_group().is_some_and(|g| g.is_resolved()));
    let order = shop.table("Order").ok_or_else(|| anyhow::anyhow!("Order missing"))?;
    assert!(order.fields()[1]
        .field_type()
        .as_group()
        .is_some_and(|g| g.is_resolved()));

    assert!(matches!(
        parse_type("list<list<int32>>", &interner),
        Err(ModelError::InvalidCollectionElement { .. })
    ));
    Ok(())
}
