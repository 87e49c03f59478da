//! Per-table layout codec: builds and reads record buffers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::codec::{
    read_metadata, slice_at, write_metadata, CollectionOperator, OperatorRegistry, ValueOperator,
};
use crate::config::CodecConfig;
use crate::error::{CodecError, RecordError};
use crate::types::{Field, Table, Value};

use super::buffer::{RecordBuffer, ENTRY_LEN, HEADER_LEN};

/// A stored field and its operator.
#[derive(Debug)]
struct FieldSlot {
    field: Field,
    operator: Arc<dyn ValueOperator>,
}

/// Compiled layout of one table version.
///
/// Holds one operator per stored field, ordered by ascending field id.
/// Shared by every record of the table through `Arc`.
#[derive(Debug)]
pub struct TableCodec {
    table: Arc<Table>,
    config: CodecConfig,
    slots: Vec<FieldSlot>,
    by_id: HashMap<i16, usize>,
}

impl TableCodec {
    /// Compiles the layout of `table`, resolving operators through `registry`.
    ///
    /// # Returns
    /// `Err(CodecError)` if any stored field's type has no operator.
    pub(crate) fn new(table: Arc<Table>, registry: &OperatorRegistry) -> Result<Self, CodecError> {
        let mut stored: Vec<&Field> = table.stored_fields().collect();
        stored.sort_by_key(|f| f.id());

        let mut slots = Vec::with_capacity(stored.len());
        let mut by_id = HashMap::with_capacity(stored.len());
        for field in stored {
            let operator = registry.operator_for(field.field_type())?;
            by_id.insert(field.id(), slots.len());
            slots.push(FieldSlot {
                field: field.clone(),
                operator,
            });
        }

        Ok(Self {
            config: registry.config().clone(),
            table,
            slots,
            by_id,
        })
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Operator of a stored field.
    pub fn operator(&self, field_id: i16) -> Option<&Arc<dyn ValueOperator>> {
        self.slot(field_id).map(|s| &s.operator)
    }

    fn slot(&self, field_id: i16) -> Option<&FieldSlot> {
        self.by_id.get(&field_id).map(|&i| &self.slots[i])
    }

    fn stored_slot(&self, field: &Field) -> Result<&FieldSlot, RecordError> {
        if field.is_derived() && self.table.contains(field) {
            return Err(RecordError::DerivedNotBound {
                table: self.table.name().to_string(),
                field: field.name().to_string(),
            });
        }
        self.slot(field.id())
            .filter(|s| s.field.name() == field.name())
            .ok_or_else(|| self.unknown(field.name()))
    }

    fn unknown(&self, field: impl Into<String>) -> RecordError {
        RecordError::UnknownField {
            table: self.table.name().to_string(),
            field: field.into(),
        }
    }

    /// Checks `values` and pairs each with its slot, ascending by id.
    fn present<'a>(
        &'a self,
        values: &'a BTreeMap<i16, Value>,
    ) -> Result<Vec<(&'a FieldSlot, &'a Value)>, RecordError> {
        if let Some(&id) = values.keys().find(|id| !self.by_id.contains_key(id)) {
            return Err(self.unknown(id.to_string()));
        }

        let mut present = Vec::with_capacity(values.len());
        for slot in &self.slots {
            match values.get(&slot.field.id()) {
                Some(value) => {
                    if !slot.operator.is_valid(value) {
                        return Err(RecordError::ValueRejected {
                            table: self.table.name().to_string(),
                            field: slot.field.name().to_string(),
                            expected: slot.field.field_type().to_string(),
                            got: value.type_name().to_string(),
                        });
                    }
                    present.push((slot, value));
                }
                None if slot.field.is_required() => {
                    return Err(RecordError::MissingRequired {
                        table: self.table.name().to_string(),
                        field: slot.field.name().to_string(),
                    });
                }
                None => {}
            }
        }
        Ok(present)
    }

    fn layout_len(&self, present: &[(&FieldSlot, &Value)]) -> Result<usize, RecordError> {
        let mut total = HEADER_LEN + present.len() * ENTRY_LEN;
        for (slot, value) in present {
            total += slot.operator.metadata_width() + slot.operator.size_of(value)?;
        }
        Ok(total)
    }

    /// Byte length of the buffer `values` would encode to.
    pub fn encoded_len(&self, values: &BTreeMap<i16, Value>) -> Result<usize, RecordError> {
        let present = self.present(values)?;
        self.layout_len(&present)
    }

    /// Encodes stored field values into a canonical record buffer.
    ///
    /// Equal value sets always produce identical bytes: the index is sorted
    /// by id, fixed-width payloads precede variable-width ones, and each
    /// region is written in ascending id order.
    ///
    /// # Arguments
    /// * `values` - Field values keyed by field id; absent optional fields are omitted
    ///
    /// # Returns
    /// `Err(RecordError)` if a required field is missing, a value fails its
    /// operator's check, or the record exceeds the configured size limit.
    pub fn encode(&self, values: &BTreeMap<i16, Value>) -> Result<Vec<u8>, RecordError> {
        let present = self.present(values)?;
        let total = self.layout_len(&present)?;
        if total > self.config.max_record_size {
            return Err(CodecError::LimitExceeded {
                what: "record size",
                requested: total,
                limit: self.config.max_record_size,
            }
            .into());
        }
        let total_prefix = u32::try_from(total).map_err(|_| CodecError::LengthOverflow {
            type_name: self.table.name().to_string(),
            length: total,
            max: u32::MAX as usize,
        })?;

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&total_prefix.to_be_bytes());
        out.extend_from_slice(&self.table.version().to_be_bytes());
        out.extend_from_slice(&(present.len() as u16).to_be_bytes());
        out.resize(HEADER_LEN + present.len() * ENTRY_LEN, 0);

        let mut entries: Vec<(i16, u32)> = Vec::with_capacity(present.len());
        let (fixed, variable): (Vec<_>, Vec<_>) = present
            .iter()
            .partition(|(slot, _)| slot.operator.has_fixed_length());

        for (slot, value) in fixed.into_iter().chain(variable) {
            entries.push((slot.field.id(), out.len() as u32));
            let meta = slot.operator.metadata_width();
            if meta > 0 {
                let len = slot.operator.size_of(value)?;
                write_metadata(&mut out, meta, len, &slot.field.field_type().to_string())?;
            }
            slot.operator.encode_into(value, &mut out)?;
        }

        entries.sort_unstable_by_key(|(id, _)| *id);
        for (i, (id, offset)) in entries.iter().enumerate() {
            let at = HEADER_LEN + i * ENTRY_LEN;
            out[at..at + 2].copy_from_slice(&id.to_be_bytes());
            out[at + 2..at + ENTRY_LEN].copy_from_slice(&offset.to_be_bytes());
        }

        debug_assert_eq!(out.len(), total);
        Ok(out)
    }

    /// Checks that every required field of the table is present in `buffer`.
    pub fn check_buffer(&self, buffer: &RecordBuffer) -> Result<(), RecordError> {
        if buffer.version() != self.table.version() {
            tracing::debug!(
                "Reading '{}' buffer written by version {} with version {}",
                self.table.name(),
                buffer.version(),
                self.table.version()
            );
        }
        for field in self.table.required_fields() {
            if field.is_stored() && !buffer.contains(field.id()) {
                return Err(RecordError::MissingRequired {
                    table: self.table.name().to_string(),
                    field: field.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Payload offset and length of the field stored at `offset`.
    fn span(
        &self,
        buffer: &RecordBuffer,
        slot: &FieldSlot,
        offset: usize,
    ) -> Result<(usize, usize), CodecError> {
        if let Some(width) = slot.operator.fixed_width() {
            slice_at(buffer.as_bytes(), offset, width)?;
            return Ok((offset, width));
        }
        let meta = slot.operator.metadata_width();
        let length = read_metadata(buffer.as_bytes(), offset, meta)?;
        let start = offset + meta;
        if start.checked_add(length).map_or(true, |end| end > buffer.len()) {
            return Err(CodecError::Corrupt(format!(
                "field {} of {} bytes overruns buffer of {} bytes",
                slot.field.name(),
                length,
                buffer.len()
            )));
        }
        Ok((start, length))
    }

    /// Decodes every stored field of `buffer`.
    ///
    /// Entries whose id the table does not know were written by another
    /// version of the table and are skipped.
    pub fn decode_all(&self, buffer: &RecordBuffer) -> Result<BTreeMap<i16, Value>, RecordError> {
        let mut values = BTreeMap::new();
        for i in 0..buffer.entry_count() {
            let (id, offset) = buffer.entry(i);
            let Some(slot) = self.slot(id) else {
                tracing::warn!(
                    "Skipping unknown field id {} in '{}' buffer",
                    id,
                    self.table.name()
                );
                continue;
            };
            let (start, length) = self.span(buffer, slot, offset)?;
            let value = slot.operator.decode(buffer.as_bytes(), start, length)?;
            values.insert(id, value);
        }
        Ok(values)
    }

    /// Decodes one field without touching the others.
    ///
    /// # Returns
    /// `Ok(None)` if the field is not stored in `buffer`.
    pub fn read_field(
        &self,
        buffer: &RecordBuffer,
        field: &Field,
    ) -> Result<Option<Value>, RecordError> {
        let slot = self.stored_slot(field)?;
        let Some(offset) = buffer.locate(field.id()) else {
            return Ok(None);
        };
        let (start, length) = self.span(buffer, slot, offset)?;
        tracing::trace!(
            "Decoding '{}.{}' at offset {} ({} bytes)",
            self.table.name(),
            field.name(),
            start,
            length
        );
        Ok(Some(slot.operator.decode(buffer.as_bytes(), start, length)?))
    }

    /// Raw payload bytes of a stored field.
    pub fn value_span<'a>(
        &self,
        buffer: &'a RecordBuffer,
        field: &Field,
    ) -> Result<Option<&'a [u8]>, RecordError> {
        let slot = self.stored_slot(field)?;
        let Some(offset) = buffer.locate(field.id()) else {
            return Ok(None);
        };
        let (start, length) = self.span(buffer, slot, offset)?;
        Ok(Some(slice_at(buffer.as_bytes(), start, length)?))
    }

    fn collection_span<'a>(
        &'a self,
        buffer: &RecordBuffer,
        field: &Field,
    ) -> Result<Option<(&'a CollectionOperator, usize, usize)>, RecordError> {
        let slot = self.stored_slot(field)?;
        let op = slot
            .operator
            .as_collection()
            .ok_or_else(|| RecordError::NotACollection {
                table: self.table.name().to_string(),
                field: field.name().to_string(),
            })?;
        let Some(offset) = buffer.locate(field.id()) else {
            return Ok(None);
        };
        let (start, length) = self.span(buffer, slot, offset)?;
        Ok(Some((op, start, length)))
    }

    /// Element count of a stored list, read from its header only.
    pub fn list_size(
        &self,
        buffer: &RecordBuffer,
        field: &Field,
    ) -> Result<Option<usize>, RecordError> {
        match self.collection_span(buffer, field)? {
            Some((op, start, length)) => Ok(Some(op.element_count(buffer.as_bytes(), start, length)?)),
            None => Ok(None),
        }
    }

    /// Decodes one element of a stored list without decoding the others.
    pub fn list_element(
        &self,
        buffer: &RecordBuffer,
        field: &Field,
        index: usize,
    ) -> Result<Option<Value>, RecordError> {
        let Some((op, start, length)) = self.collection_span(buffer, field)? else {
            return Ok(None);
        };
        let bytes = buffer.as_bytes();
        let len = op.element_count(bytes, start, length)?;
        if index >= len {
            return Err(RecordError::IndexOutOfRange {
                field: field.name().to_string(),
                index,
                len,
            });
        }
        Ok(Some(op.element_at(bytes, start, length, index)?))
    }
}
