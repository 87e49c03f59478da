//! Shared fixtures for integration tests.

use std::sync::Arc;

use fieldbuf_core::{OperatorRegistry, Schema, SchemaDefinition, TableCodec, TypeInterner};

/// A small schema with a nested group, a list and a sorted key.
pub const SHOP_SCHEMA: &str = r#"{
    "name": "Shop",
    "tables": [
        {
            "name": "Order",
            "version": 1,
            "fields": [
                { "id": 1, "name": "id", "type": "int64", "constraints": ["required", "asc_sorted"] },
                { "id": 2, "name": "customer", "type": "Customer", "constraints": ["required"] },
                { "id": 3, "name": "items", "type": "list<string>", "constraints": ["optional", "large_list"] },
                { "id": 4, "name": "note", "type": "string", "constraints": ["optional"], "default": "" },
                { "id": 5, "name": "total", "type": "double", "constraints": ["optional"], "default": 0.0 }
            ]
        },
        {
            "name": "Customer",
            "version": 1,
            "fields": [
                { "id": 1, "name": "name", "type": "string", "constraints": ["required"] },
                { "id": 2, "name": "vip", "type": "bool", "constraints": ["optional"], "default": false }
            ]
        }
    ]
}"#;

/// Table `t`: `id` int32 required, `label` string optional defaulting to
/// "unknown".
pub const SIMPLE_SCHEMA: &str = r#"{
    "name": "Simple",
    "tables": [
        {
            "name": "t",
            "version": 1,
            "fields": [
                { "id": 1, "name": "id", "type": "int32", "constraints": ["required"] },
                { "id": 2, "name": "label", "type": "string", "constraints": ["optional"], "default": "unknown" }
            ]
        }
    ]
}"#;

pub fn build(text: &str) -> anyhow::Result<Schema> {
    let definition = SchemaDefinition::from_json_str(text)?;
    Ok(definition.build(&TypeInterner::new())?)
}

pub fn codec(registry: &OperatorRegistry, schema: &Schema, table: &str) -> anyhow::Result<Arc<TableCodec>> {
    let table = schema
        .table(table)
        .ok_or_else(|| anyhow::anyhow!("table '{}' not found", table))?;
    Ok(registry.table_codec(table)?)
}
