//! Operators for primitive types.

use crate::error::CodecError;
use crate::types::{FieldType, PrimitiveType, Value};

use super::bytes::{read_array, slice_at};
use super::{invalid_value, ValueOperator};

/// Operator for BOOL, BYTE, INT16, INT32, INT64, FLOAT and DOUBLE.
///
/// Big-endian two's complement / IEEE-754 at the type's natural width.
#[derive(Debug)]
pub struct FixedWidthOperator {
    field_type: FieldType,
    primitive: PrimitiveType,
    width: usize,
    float_limit: f64,
}

impl FixedWidthOperator {
    /// Creates an operator for a fixed-width primitive.
    ///
    /// # Returns
    /// `Err(CodecError::UnsupportedType)` for STRING, BINARY and sentinels.
    pub fn new(primitive: PrimitiveType, float_limit: f64) -> Result<Self, CodecError> {
        let width = primitive
            .fixed_width()
            .ok_or_else(|| CodecError::UnsupportedType {
                type_name: primitive.name().to_string(),
            })?;
        Ok(Self {
            field_type: FieldType::Primitive(primitive),
            primitive,
            width,
            float_limit,
        })
    }

    fn float_in_range(&self, v: f64) -> bool {
        v.is_finite() && v.abs() <= self.float_limit
    }
}

impl ValueOperator for FixedWidthOperator {
    fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    fn is_valid(&self, value: &Value) -> bool {
        match (self.primitive, value) {
            (PrimitiveType::Bool, Value::Bool(_))
            | (PrimitiveType::Byte, Value::Byte(_))
            | (PrimitiveType::Int16, Value::Int16(_))
            | (PrimitiveType::Int32, Value::Int32(_))
            | (PrimitiveType::Int64, Value::Int64(_)) => true,
            (PrimitiveType::Float, Value::Float(v)) => self.float_in_range(f64::from(*v)),
            (PrimitiveType::Double, Value::Double(v)) => self.float_in_range(*v),
            _ => false,
        }
    }

    fn has_fixed_length(&self) -> bool {
        true
    }

    fn fixed_width(&self) -> Option<usize> {
        Some(self.width)
    }

    fn metadata_width(&self) -> usize {
        0
    }

    fn size_of(&self, _value: &Value) -> Result<usize, CodecError> {
        Ok(self.width)
    }

    fn encode_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), CodecError> {
        if !self.is_valid(value) {
            return Err(invalid_value(&self.field_type, value));
        }
        match value {
            Value::Bool(v) => out.push(u8::from(*v)),
            Value::Byte(v) => out.extend_from_slice(&v.to_be_bytes()),
            Value::Int16(v) => out.extend_from_slice(&v.to_be_bytes()),
            Value::Int32(v) => out.extend_from_slice(&v.to_be_bytes()),
            Value::Int64(v) => out.extend_from_slice(&v.to_be_bytes()),
            Value::Float(v) => out.extend_from_slice(&v.to_bits().to_be_bytes()),
            Value::Double(v) => out.extend_from_slice(&v.to_bits().to_be_bytes()),
            _ => return Err(invalid_value(&self.field_type, value)),
        }
        Ok(())
    }

    fn decode(&self, buf: &[u8], offset: usize, length: usize) -> Result<Value, CodecError> {
        if length != self.width {
            return Err(CodecError::Corrupt(format!(
                "{} expects {} bytes, got {}",
                self.primitive, self.width, length
            )));
        }
        let value = match self.primitive {
            PrimitiveType::Bool => Value::Bool(read_array::<1>(buf, offset)?[0] != 0),
            PrimitiveType::Byte => Value::Byte(i8::from_be_bytes(read_array(buf, offset)?)),
            PrimitiveType::Int16 => Value::Int16(i16::from_be_bytes(read_array(buf, offset)?)),
            PrimitiveType::Int32 => Value::Int32(i32::from_be_bytes(read_array(buf, offset)?)),
            PrimitiveType::Int64 => Value::Int64(i64::from_be_bytes(read_array(buf, offset)?)),
            PrimitiveType::Float => {
                Value::Float(f32::from_bits(u32::from_be_bytes(read_array(buf, offset)?)))
            }
            PrimitiveType::Double => {
                Value::Double(f64::from_bits(u64::from_be_bytes(read_array(buf, offset)?)))
            }
            other => {
                return Err(CodecError::UnsupportedType {
                    type_name: other.name().to_string(),
                })
            }
        };
        Ok(value)
    }
}

/// Operator for STRING: UTF-8 bytes, no terminator, 2-byte length metadata.
#[derive(Debug)]
pub struct StringOperator {
    field_type: FieldType,
}

impl StringOperator {
    pub fn new() -> Self {
        Self {
            field_type: FieldType::Primitive(PrimitiveType::String),
        }
    }
}

impl Default for StringOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueOperator for StringOperator {
    fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    fn is_valid(&self, value: &Value) -> bool {
        matches!(value, Value::String(s) if s.len() <= usize::from(u16::MAX))
    }

    fn has_fixed_length(&self) -> bool {
        false
    }

    fn metadata_width(&self) -> usize {
        2
    }

    fn size_of(&self, value: &Value) -> Result<usize, CodecError> {
        match value {
            Value::String(s) => Ok(s.len()),
            other => Err(invalid_value(&self.field_type, other)),
        }
    }

    fn encode_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), CodecError> {
        match value {
            Value::String(s) if s.len() > usize::from(u16::MAX) => {
                Err(CodecError::LengthOverflow {
                    type_name: "string".to_string(),
                    length: s.len(),
                    max: usize::from(u16::MAX),
                })
            }
            Value::String(s) => {
                out.extend_from_slice(s.as_bytes());
                Ok(())
            }
            other => Err(invalid_value(&self.field_type, other)),
        }
    }

    fn decode(&self, buf: &[u8], offset: usize, length: usize) -> Result<Value, CodecError> {
        let bytes = slice_at(buf, offset, length)?;
        std::str::from_utf8(bytes)
            .map(|s| Value::String(s.to_string()))
            .map_err(|_| CodecError::InvalidUtf8 { offset })
    }
}

/// Operator for BINARY: raw bytes, 4-byte length metadata.
#[derive(Debug)]
pub struct BinaryOperator {
    field_type: FieldType,
}

impl BinaryOperator {
    pub fn new() -> Self {
        Self {
            field_type: FieldType::Primitive(PrimitiveType::Binary),
        }
    }
}

impl Default for BinaryOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueOperator for BinaryOperator {
    fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    fn is_valid(&self, value: &Value) -> bool {
        matches!(value, Value::Binary(b) if b.len() <= u32::MAX as usize)
    }

    fn has_fixed_length(&self) -> bool {
        false
    }

    fn metadata_width(&self) -> usize {
        4
    }

    fn size_of(&self, value: &Value) -> Result<usize, CodecError> {
        match value {
            Value::Binary(b) => Ok(b.len()),
            other => Err(invalid_value(&self.field_type, other)),
        }
    }

    fn encode_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), CodecError> {
        match value {
            Value::Binary(b) if self.is_valid(value) => {
                out.extend_from_slice(b);
                Ok(())
            }
            other => Err(invalid_value(&self.field_type, other)),
        }
    }

    fn decode(&self, buf: &[u8], offset: usize, length: usize) -> Result<Value, CodecError> {
        slice_at(buf, offset, length).map(|b| Value::Binary(b.to_vec()))
    }
}
