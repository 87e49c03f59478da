//! JSON conversion for values and records.
//!
//! Scalars map to JSON booleans, numbers and strings; BINARY maps to an array
//! of byte values; groups map to objects keyed by field name and lists to
//! arrays. Absent optional fields are written with their default.

use std::sync::Arc;

use serde_json::{Map, Number, Value as JsonValue};

use crate::codec::ValueOperator;
use crate::error::RecordError;
use crate::types::{FieldType, PrimitiveType, Value};

use super::layout::TableCodec;
use super::record::Record;

fn json_error(field: &str, message: impl Into<String>) -> RecordError {
    RecordError::Json {
        field: field.to_string(),
        message: message.into(),
    }
}

fn float_to_json(v: f64) -> Result<JsonValue, String> {
    Number::from_f64(v)
        .map(JsonValue::Number)
        .ok_or_else(|| format!("{} is not representable in JSON", v))
}

/// Converts a value to JSON.
pub fn value_to_json(value: &Value) -> Result<JsonValue, RecordError> {
    let json = match value {
        Value::Bool(v) => JsonValue::Bool(*v),
        Value::Byte(v) => JsonValue::from(*v),
        Value::Int16(v) => JsonValue::from(*v),
        Value::Int32(v) => JsonValue::from(*v),
        Value::Int64(v) => JsonValue::from(*v),
        Value::Float(v) => float_to_json(f64::from(*v)).map_err(|m| json_error("float", m))?,
        Value::Double(v) => float_to_json(*v).map_err(|m| json_error("double", m))?,
        Value::String(v) => JsonValue::String(v.clone()),
        Value::Binary(v) => JsonValue::Array(v.iter().map(|b| JsonValue::from(*b)).collect()),
        Value::Group(record) => record.to_json()?,
        Value::List(items) => JsonValue::Array(
            items
                .iter()
                .map(value_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };
    Ok(json)
}

fn integer(json: &JsonValue) -> Result<i64, String> {
    json.as_i64()
        .ok_or_else(|| format!("expected integer, got {}", json))
}

fn narrow<T: TryFrom<i64>>(json: &JsonValue, type_name: &str) -> Result<T, String> {
    let v = integer(json)?;
    T::try_from(v).map_err(|_| format!("{} out of range for {}", v, type_name))
}

/// Converts a JSON scalar to a value of `primitive` type.
pub(crate) fn scalar_from_json(primitive: PrimitiveType, json: &JsonValue) -> Result<Value, String> {
    let value = match primitive {
        PrimitiveType::Bool => Value::Bool(
            json.as_bool()
                .ok_or_else(|| format!("expected boolean, got {}", json))?,
        ),
        PrimitiveType::Byte => Value::Byte(narrow(json, "byte")?),
        PrimitiveType::Int16 => Value::Int16(narrow(json, "int16")?),
        PrimitiveType::Int32 => Value::Int32(narrow(json, "int32")?),
        PrimitiveType::Int64 => Value::Int64(integer(json)?),
        PrimitiveType::Float => Value::Float(
            json.as_f64()
                .ok_or_else(|| format!("expected number, got {}", json))? as f32,
        ),
        PrimitiveType::Double => Value::Double(
            json.as_f64()
                .ok_or_else(|| format!("expected number, got {}", json))?,
        ),
        PrimitiveType::String => Value::String(
            json.as_str()
                .ok_or_else(|| format!("expected string, got {}", json))?
                .to_string(),
        ),
        PrimitiveType::Binary => {
            let items = json
                .as_array()
                .ok_or_else(|| format!("expected byte array, got {}", json))?;
            let bytes = items
                .iter()
                .map(|b| narrow::<u8>(b, "binary byte"))
                .collect::<Result<Vec<_>, _>>()?;
            Value::Binary(bytes)
        }
        other => return Err(format!("type {} has no values", other)),
    };
    Ok(value)
}

/// Converts JSON to a value of the operator's type.
pub fn value_from_json(
    operator: &dyn ValueOperator,
    json: &JsonValue,
    field: &str,
) -> Result<Value, RecordError> {
    match operator.field_type() {
        FieldType::Primitive(p) => scalar_from_json(*p, json).map_err(|m| json_error(field, m)),
        FieldType::Group(_) => {
            let group = operator
                .as_group()
                .ok_or_else(|| json_error(field, "no group codec"))?;
            let record = Record::from_json(Arc::clone(group.codec()), json)?;
            Ok(Value::Group(Box::new(record)))
        }
        FieldType::Collection { .. } => {
            let collection = operator
                .as_collection()
                .ok_or_else(|| json_error(field, "no collection codec"))?;
            let items = json
                .as_array()
                .ok_or_else(|| json_error(field, format!("expected array, got {}", json)))?;
            let element = collection.element();
            items
                .iter()
                .map(|item| value_from_json(element.as_ref(), item, field))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }
    }
}

impl Record {
    /// Builds a record from a JSON object keyed by field name.
    ///
    /// `null` members are treated as absent.
    pub fn from_json(codec: Arc<TableCodec>, json: &JsonValue) -> Result<Record, RecordError> {
        let table = Arc::clone(codec.table());
        let object = json
            .as_object()
            .ok_or_else(|| json_error(table.name(), format!("expected object, got {}", json)))?;

        let mut record = Record::new(Arc::clone(&codec));
        for (name, member) in object {
            let field = table
                .field_by_name(name)
                .ok_or_else(|| RecordError::UnknownField {
                    table: table.name().to_string(),
                    field: name.clone(),
                })?;
            if field.is_derived() {
                return Err(RecordError::DerivedNotWritable {
                    table: table.name().to_string(),
                    field: name.clone(),
                });
            }
            if member.is_null() {
                continue;
            }
            let operator = codec
                .operator(field.id())
                .ok_or_else(|| json_error(name, "field is not stored"))?;
            let value = value_from_json(operator.as_ref(), member, name)?;
            record.set_value(field, value)?;
        }
        Ok(record)
    }

    /// Converts the record to a JSON object keyed by field name.
    ///
    /// Absent optional fields are written with their default; absent groups
    /// and unbound derived fields are omitted.
    pub fn to_json(&self) -> Result<JsonValue, RecordError> {
        let mut object = Map::new();
        for field in self.table().fields() {
            let value = match self.get_value(field) {
                Ok(value) => value,
                Err(RecordError::NoValue { .. }) | Err(RecordError::DerivedNotBound { .. }) => {
                    continue
                }
                Err(e) => return Err(e),
            };
            object.insert(field.name().to_string(), value_to_json(&value)?);
        }
        Ok(JsonValue::Object(object))
    }
}
