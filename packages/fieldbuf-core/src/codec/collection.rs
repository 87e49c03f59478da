//! List operator.
//!
//! Payload layout: `u32` element count, then
//! - fixed-width elements packed contiguously, or
//! - for variable-width elements, one `u32` offset per element (relative to
//!   the payload start) followed by each element's metadata and payload.
//!
//! Either way a single element is located without touching the others.

use std::sync::Arc;

use crate::error::CodecError;
use crate::types::{FieldType, Value};

use super::bytes::{read_metadata, read_u32, write_metadata};
use super::{invalid_value, ValueOperator};

const COUNT_WIDTH: usize = 4;
const OFFSET_WIDTH: usize = 4;

/// Operator for collection fields.
#[derive(Debug)]
pub struct CollectionOperator {
    field_type: FieldType,
    element: Arc<dyn ValueOperator>,
    max_elements: usize,
}

impl CollectionOperator {
    pub fn new(
        field_type: FieldType,
        element: Arc<dyn ValueOperator>,
        max_elements: usize,
    ) -> Self {
        Self {
            field_type,
            element,
            max_elements,
        }
    }

    /// Operator of the element type.
    pub fn element(&self) -> &Arc<dyn ValueOperator> {
        &self.element
    }

    /// Reads the element count of an encoded list.
    ///
    /// # Arguments
    /// * `buf` - Buffer holding the encoded list
    /// * `offset` - Absolute offset of the list payload
    /// * `length` - Payload length
    pub fn element_count(
        &self,
        buf: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<usize, CodecError> {
        if length < COUNT_WIDTH {
            return Err(CodecError::Corrupt(format!(
                "list payload of {} bytes has no element count",
                length
            )));
        }
        let count = read_u32(buf, offset)? as usize;
        if count > self.max_elements {
            return Err(CodecError::Corrupt(format!(
                "list element count {} exceeds limit {}",
                count, self.max_elements
            )));
        }
        let index_len = match self.element.fixed_width() {
            Some(width) => count.checked_mul(width),
            None => count.checked_mul(OFFSET_WIDTH),
        }
        .ok_or_else(|| CodecError::Corrupt("list element count overflow".to_string()))?;

        if COUNT_WIDTH + index_len > length {
            return Err(CodecError::Corrupt(format!(
                "list of {} elements does not fit {} bytes",
                count, length
            )));
        }
        Ok(count)
    }

    /// Decodes the element at `index` of an encoded list.
    pub fn element_at(
        &self,
        buf: &[u8],
        offset: usize,
        length: usize,
        index: usize,
    ) -> Result<Value, CodecError> {
        let count = self.element_count(buf, offset, length)?;
        self.decode_element(buf, offset, length, count, index)
    }

    fn decode_element(
        &self,
        buf: &[u8],
        offset: usize,
        length: usize,
        count: usize,
        index: usize,
    ) -> Result<Value, CodecError> {
        if index >= count {
            return Err(CodecError::OutOfBounds {
                offset: index,
                length: 1,
                buffer_len: count,
            });
        }

        if let Some(width) = self.element.fixed_width() {
            let at = offset + COUNT_WIDTH + index * width;
            return self.element.decode(buf, at, width);
        }

        let relative = read_u32(buf, offset + COUNT_WIDTH + index * OFFSET_WIDTH)? as usize;
        let meta_width = self.element.metadata_width();
        let header_end = COUNT_WIDTH + count * OFFSET_WIDTH;
        if relative < header_end || relative + meta_width > length {
            return Err(CodecError::Corrupt(format!(
                "list element {} offset {} outside payload of {} bytes",
                index, relative, length
            )));
        }
        let element_len = read_metadata(buf, offset + relative, meta_width)?;
        if relative + meta_width + element_len > length {
            return Err(CodecError::Corrupt(format!(
                "list element {} of {} bytes overruns payload",
                index, element_len
            )));
        }
        self.element
            .decode(buf, offset + relative + meta_width, element_len)
    }
}

impl ValueOperator for CollectionOperator {
    fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    fn is_valid(&self, value: &Value) -> bool {
        match value {
            Value::List(items) => {
                items.len() <= self.max_elements && items.iter().all(|v| self.element.is_valid(v))
            }
            _ => false,
        }
    }

    fn has_fixed_length(&self) -> bool {
        false
    }

    fn metadata_width(&self) -> usize {
        4
    }

    fn size_of(&self, value: &Value) -> Result<usize, CodecError> {
        let items = match value {
            Value::List(items) => items,
            other => return Err(invalid_value(&self.field_type, other)),
        };
        if let Some(width) = self.element.fixed_width() {
            return Ok(COUNT_WIDTH + items.len() * width);
        }
        let meta_width = self.element.metadata_width();
        let mut size = COUNT_WIDTH + items.len() * OFFSET_WIDTH;
        for item in items {
            size += meta_width + self.element.size_of(item)?;
        }
        Ok(size)
    }

    fn encode_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let items = match value {
            Value::List(items) if items.len() <= self.max_elements => items,
            Value::List(items) => {
                return Err(CodecError::LimitExceeded {
                    what: "list elements",
                    requested: items.len(),
                    limit: self.max_elements,
                })
            }
            other => return Err(invalid_value(&self.field_type, other)),
        };

        let start = out.len();
        out.extend_from_slice(&(items.len() as u32).to_be_bytes());

        if self.element.has_fixed_length() {
            for item in items {
                self.element.encode_into(item, out)?;
            }
            return Ok(());
        }

        // Reserve the offset index, then patch each slot once the element lands
        let index_start = out.len();
        out.resize(index_start + items.len() * OFFSET_WIDTH, 0);
        let meta_width = self.element.metadata_width();
        let type_name = self.element.field_type().to_string();

        for (i, item) in items.iter().enumerate() {
            let relative = (out.len() - start) as u32;
            let slot = index_start + i * OFFSET_WIDTH;
            out[slot..slot + OFFSET_WIDTH].copy_from_slice(&relative.to_be_bytes());

            let len = self.element.size_of(item)?;
            write_metadata(out, meta_width, len, &type_name)?;
            self.element.encode_into(item, out)?;
        }
        Ok(())
    }

    fn decode(&self, buf: &[u8], offset: usize, length: usize) -> Result<Value, CodecError> {
        let count = self.element_count(buf, offset, length)?;
        if let Some(width) = self.element.fixed_width() {
            if COUNT_WIDTH + count * width != length {
                return Err(CodecError::Corrupt(format!(
                    "list of {} x {} bytes has payload of {} bytes",
                    count, width, length
                )));
            }
        }
        let mut items = Vec::with_capacity(count);
        for index in 0..count {
            items.push(self.decode_element(buf, offset, length, count, index)?);
        }
        Ok(Value::List(items))
    }

    fn as_collection(&self) -> Option<&CollectionOperator> {
        Some(self)
    }
}
