//! Group operator: nested records stored as self-contained record buffers.

use std::sync::Arc;

use crate::error::CodecError;
use crate::record::{Record, RecordBuffer, TableCodec};
use crate::types::{FieldType, Value};

use super::bytes::slice_at;
use super::{invalid_value, ValueOperator};

/// Operator for group fields.
///
/// The payload is the nested record's complete buffer; the layout engine
/// stores its length in a 4-byte metadata slot.
#[derive(Debug)]
pub struct GroupOperator {
    field_type: FieldType,
    codec: Arc<TableCodec>,
}

impl GroupOperator {
    pub fn new(field_type: FieldType, codec: Arc<TableCodec>) -> Self {
        Self { field_type, codec }
    }

    /// Codec of the nested table.
    pub fn codec(&self) -> &Arc<TableCodec> {
        &self.codec
    }

    fn record<'a>(&self, value: &'a Value) -> Result<&'a Record, CodecError> {
        match value {
            Value::Group(record) if record.table().name() == self.codec.table().name() => {
                Ok(record)
            }
            other => Err(invalid_value(&self.field_type, other)),
        }
    }

    fn nested_error(&self, err: impl std::fmt::Display) -> CodecError {
        CodecError::NestedRecord {
            table: self.codec.table().name().to_string(),
            message: err.to_string(),
        }
    }
}

impl ValueOperator for GroupOperator {
    fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    fn is_valid(&self, value: &Value) -> bool {
        self.record(value).is_ok_and(Record::is_complete)
    }

    fn has_fixed_length(&self) -> bool {
        false
    }

    fn metadata_width(&self) -> usize {
        4
    }

    fn size_of(&self, value: &Value) -> Result<usize, CodecError> {
        self.record(value)?
            .byte_length()
            .map_err(|e| self.nested_error(e))
    }

    fn encode_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let bytes = self
            .record(value)?
            .to_bytes()
            .map_err(|e| self.nested_error(e))?;
        out.extend_from_slice(&bytes);
        Ok(())
    }

    fn decode(&self, buf: &[u8], offset: usize, length: usize) -> Result<Value, CodecError> {
        let bytes = slice_at(buf, offset, length)?;
        let buffer =
            RecordBuffer::wrap_with_limit(bytes.to_vec(), self.codec.config().max_record_size)?;
        let record = Record::from_buffer(Arc::clone(&self.codec), buffer)
            .map_err(|e| self.nested_error(e))?;
        Ok(Value::Group(Box::new(record)))
    }

    fn as_group(&self) -> Option<&GroupOperator> {
        Some(self)
    }
}
