//! Record encoding and random access through schemas built from definitions.

use std::sync::Arc;
use std::thread;

use ntest::timeout;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use fieldbuf_core::{OperatorRegistry, Record, RecordBuffer, RecordError, Value};

use super::helpers::{build, codec, SHOP_SCHEMA, SIMPLE_SCHEMA};

#[timeout(1000)]
#[test]
fn test_optional_default_read_back() -> anyhow::Result<()> {
    let schema = build(SIMPLE_SCHEMA)?;
    let registry = OperatorRegistry::new();
    let t = codec(&registry, &schema, "t")?;

    let mut record = Record::new(Arc::clone(&t));
    record.set_by_name("id", 7)?;
    let bytes = record.to_bytes()?;

    let decoded = Record::from_bytes(t, &bytes)?;
    assert_eq!(decoded.get_by_name("id")?, Value::Int32(7));
    assert_eq!(decoded.get_by_name("label")?, Value::from("unknown"));

    let label = decoded.table().field_by_name("label").cloned();
    let label = label.ok_or_else(|| anyhow::anyhow!("missing label"))?;
    assert!(!decoded.is_set(&label));
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_required_field_enforced() -> anyhow::Result<()> {
    let schema = build(SIMPLE_SCHEMA)?;
    let registry = OperatorRegistry::new();
    let t = codec(&registry, &schema, "t")?;

    let mut record = Record::new(t);
    record.set_by_name("label", "only a label")?;
    assert!(!record.is_complete());
    assert!(matches!(
        record.to_bytes(),
        Err(RecordError::MissingRequired { ref field, .. }) if field == "id"
    ));
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_list_random_access() -> anyhow::Result<()> {
    let schema = build(SHOP_SCHEMA)?;
    let registry = OperatorRegistry::new();
    let order = codec(&registry, &schema, "Order")?;
    let customer = codec(&registry, &schema, "Customer")?;

    let mut buyer = Record::new(customer);
    buyer.set_by_name("name", "Ada")?;

    let mut record = Record::new(Arc::clone(&order));
    record.set_by_name("id", 42i64)?;
    record.set_by_name("customer", buyer)?;
    let items: Vec<Value> = ["a", "bb", "ccc", "dddd", "eeeee"]
        .into_iter()
        .map(Value::from)
        .collect();
    record.set_by_name("items", items)?;
    let bytes = record.to_bytes()?;

    let decoded = Record::from_bytes(Arc::clone(&order), &bytes)?;
    let items = order
        .table()
        .field_by_name("items")
        .ok_or_else(|| anyhow::anyhow!("missing items"))?;
    assert_eq!(decoded.list_size(items)?, 5);
    assert_eq!(decoded.list_element(items, 3)?, Value::from("dddd"));
    assert!(matches!(
        decoded.list_element(items, 5),
        Err(RecordError::IndexOutOfRange { index: 5, len: 5, .. })
    ));

    // Same answer straight from the buffer
    let buffer = RecordBuffer::copy_from(&bytes)?;
    assert_eq!(order.list_size(&buffer, items)?, Some(5));
    assert_eq!(order.list_element(&buffer, items, 0)?, Some(Value::from("a")));

    let nested = decoded.get_by_name("customer")?;
    let nested = nested
        .as_record()
        .ok_or_else(|| anyhow::anyhow!("customer is not a group"))?;
    assert_eq!(nested.get_by_name("name")?, Value::from("Ada"));
    assert_eq!(nested.get_by_name("vip")?, Value::Bool(false));
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_canonical_bytes_after_edit() -> anyhow::Result<()> {
    let schema = build(SIMPLE_SCHEMA)?;
    let registry = OperatorRegistry::new();
    let t = codec(&registry, &schema, "t")?;

    let mut first = Record::new(Arc::clone(&t));
    first.set_by_name("label", "x")?;
    first.set_by_name("id", 1)?;

    let mut second = Record::new(Arc::clone(&t));
    second.set_by_name("id", 9)?;
    second.set_by_name("label", "x")?;
    let buffer = second.finish()?.clone();

    // Editing a finished record rebuilds it without touching the old buffer
    let mut edited = Record::from_buffer(t, buffer.clone())?;
    edited.set_by_name("id", 1)?;
    assert!(edited.is_dirty());
    assert_eq!(edited.to_bytes()?, first.to_bytes()?);
    assert_eq!(buffer.len(), first.byte_length()?);
    assert_eq!(Record::from_buffer(edited.codec().clone(), buffer)?.get_by_name("id")?, Value::Int32(9));
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_json_round_trip() -> anyhow::Result<()> {
    let schema = build(SHOP_SCHEMA)?;
    let registry = OperatorRegistry::new();
    let order = codec(&registry, &schema, "Order")?;

    let input = json!({
        "id": 5,
        "customer": { "name": "Grace", "vip": true },
        "items": ["pen", "ink"],
        "total": 12.5
    });
    let record = Record::from_json(Arc::clone(&order), &input)?;
    let decoded = Record::from_bytes(order, &record.to_bytes()?)?;
    let output = decoded.to_json()?;

    assert_eq!(output["id"], json!(5));
    assert_eq!(output["customer"]["name"], json!("Grace"));
    assert_eq!(output["items"], json!(["pen", "ink"]));
    assert_eq!(output["total"], json!(12.5));
    assert_eq!(output["note"], json!(""));
    Ok(())
}

#[timeout(3000)]
#[test]
fn test_registry_shared_across_threads() -> anyhow::Result<()> {
    let schema = Arc::new(build(SHOP_SCHEMA)?);
    let registry = Arc::new(OperatorRegistry::new());

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let schema = Arc::clone(&schema);
            let registry = Arc::clone(&registry);
            thread::spawn(move || -> anyhow::Result<Vec<u8>> {
                let customer = codec(&registry, &schema, "Customer")?;
                let mut record = Record::new(customer);
                record.set_by_name("name", format!("worker {}", worker))?;
                Ok(record.to_bytes()?)
            })
        })
        .collect();

    let customer = codec(&registry, &schema, "Customer")?;
    for (worker, handle) in handles.into_iter().enumerate() {
        let bytes = handle
            .join()
            .map_err(|_| anyhow::anyhow!("worker panicked"))??;
        let record = Record::from_bytes(Arc::clone(&customer), &bytes)?;
        assert_eq!(record.get_by_name("name")?, Value::from(format!("worker {}", worker)));
    }

    // Every thread resolved the same cached codec
    assert!(Arc::ptr_eq(&customer, &codec(&registry, &schema, "Customer")?));
    Ok(())
}

#[timeout(3000)]
#[test]
fn test_randomized_orders() -> anyhow::Result<()> {
    let schema = build(SHOP_SCHEMA)?;
    let registry = OperatorRegistry::new();
    let order = codec(&registry, &schema, "Order")?;
    let customer = codec(&registry, &schema, "Customer")?;
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..200 {
        let id: i64 = rng.gen();
        let total = rng.gen_range(-1.0e6..1.0e6);
        let items: Vec<Value> = (0..rng.gen_range(0..40))
            .map(|_| {
                let len = rng.gen_range(0..12);
                Value::from((0..len).map(|_| rng.gen_range('a'..='z')).collect::<String>())
            })
            .collect();

        let mut buyer = Record::new(Arc::clone(&customer));
        buyer.set_by_name("name", "buyer")?;
        buyer.set_by_name("vip", rng.gen_bool(0.5))?;

        let mut record = Record::new(Arc::clone(&order));
        record.set_by_name("id", id)?;
        record.set_by_name("customer", buyer)?;
        record.set_by_name("total", total)?;
        if !items.is_empty() {
            record.set_by_name("items", items.clone())?;
        }

        let decoded = Record::from_bytes(Arc::clone(&order), &record.to_bytes()?)?;
        assert_eq!(decoded.get_by_name("id")?, Value::Int64(id));
        assert_eq!(decoded.get_by_name("total")?, Value::Double(total));
        assert_eq!(decoded.get_by_name("items")?, Value::List(items));
        assert_eq!(decoded, record);
    }
    Ok(())
}

#[timeout(1000)]
#[test]
fn test_nested_table_versions_share_registry() -> anyhow::Result<()> {
    let shapes = |point_fields: &str, version: i16| {
        format!(
            r#"{{ "name": "Draw", "tables": [
                {{ "name": "Shape", "version": {version}, "fields": [
                    {{ "id": 1, "name": "p", "type": "Point", "constraints": ["required"] }}
                ] }},
                {{ "name": "Point", "version": {version}, "fields": [{point_fields}] }}
            ] }}"#
        )
    };
    let x = r#"{ "id": 1, "name": "x", "type": "int32", "constraints": ["required"] }"#;
    let z = r#"{ "id": 2, "name": "z", "type": "int32", "constraints": ["optional"], "default": 0 }"#;
    let v1 = build(&shapes(x, 1))?;
    let v2 = build(&shapes(&format!("{}, {}", x, z), 2))?;

    let registry = OperatorRegistry::new();
    let _ = codec(&registry, &v1, "Shape")?;
    let shape = codec(&registry, &v2, "Shape")?;
    let point = codec(&registry, &v2, "Point")?;

    let mut p = Record::from_json(point, &json!({ "x": 1, "z": 5 }))?;
    p.finish()?;
    let mut record = Record::new(Arc::clone(&shape));
    record.set_by_name("p", p)?;

    let decoded = Record::from_bytes(shape, &record.to_bytes()?)?;
    let nested = decoded.get_by_name("p")?;
    let nested = nested
        .as_record()
        .ok_or_else(|| anyhow::anyhow!("p is not a group"))?;
    assert_eq!(nested.table().version(), 2);
    assert_eq!(nested.get_by_name("z")?, Value::Int32(5));
    Ok(())
}
