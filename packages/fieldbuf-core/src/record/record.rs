//! Record: typed field access over a record buffer.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::RecordError;
use crate::types::{Field, SortOrder, Table, Value};

use super::buffer::RecordBuffer;
use super::layout::TableCodec;

/// Computation bound to a derived field.
pub type DerivedFn = Arc<dyn Fn(&Record) -> Result<Value, RecordError> + Send + Sync>;

/// A single record of one table.
///
/// Reads go straight to the backing buffer through its field index. Writes
/// are staged and applied by [`Record::finish`], which rebuilds the buffer
/// copy-on-write; clones sharing the previous buffer are unaffected.
#[derive(Clone)]
pub struct Record {
    codec: Arc<TableCodec>,
    buffer: Option<RecordBuffer>,
    pending: BTreeMap<i16, Value>,
    cleared: BTreeSet<i16>,
    derived: HashMap<String, DerivedFn>,
}

impl Record {
    /// Creates an empty record.
    pub fn new(codec: Arc<TableCodec>) -> Self {
        Self {
            codec,
            buffer: None,
            pending: BTreeMap::new(),
            cleared: BTreeSet::new(),
            derived: HashMap::new(),
        }
    }

    /// Wraps a copy of external bytes.
    pub fn from_bytes(codec: Arc<TableCodec>, bytes: &[u8]) -> Result<Self, RecordError> {
        let buffer = RecordBuffer::wrap_with_limit(bytes.to_vec(), codec.config().max_record_size)?;
        Self::from_buffer(codec, buffer)
    }

    /// Wraps an existing buffer.
    ///
    /// # Returns
    /// `Err(RecordError::MissingRequired)` if a required field is not stored.
    pub fn from_buffer(codec: Arc<TableCodec>, buffer: RecordBuffer) -> Result<Self, RecordError> {
        codec.check_buffer(&buffer)?;
        let mut record = Self::new(codec);
        record.buffer = Some(buffer);
        Ok(record)
    }

    pub fn table(&self) -> &Arc<Table> {
        self.codec.table()
    }

    pub fn codec(&self) -> &Arc<TableCodec> {
        &self.codec
    }

    /// Backing buffer as of the last [`Record::finish`], if any.
    pub fn buffer(&self) -> Option<&RecordBuffer> {
        self.buffer.as_ref()
    }

    /// Returns `true` if staged changes are not yet in the buffer.
    pub fn is_dirty(&self) -> bool {
        self.buffer.is_none() || !self.pending.is_empty() || !self.cleared.is_empty()
    }

    fn unknown(&self, name: &str) -> RecordError {
        RecordError::UnknownField {
            table: self.table().name().to_string(),
            field: name.to_string(),
        }
    }

    fn error_fields(&self, field: &Field) -> (String, String) {
        (self.table().name().to_string(), field.name().to_string())
    }

    /// The table's own definition of `field`.
    fn resolve<'t>(table: &'t Table, field: &Field) -> Option<&'t Field> {
        table
            .field_by_name(field.name())
            .filter(|f| f.id() == field.id())
    }

    fn lookup(&self, field: &Field) -> Result<Field, RecordError> {
        Self::resolve(self.table(), field)
            .cloned()
            .ok_or_else(|| self.unknown(field.name()))
    }

    fn lookup_name(&self, name: &str) -> Result<Field, RecordError> {
        self.table()
            .field_by_name(name)
            .cloned()
            .ok_or_else(|| self.unknown(name))
    }

    /// Stages a value for `field`.
    ///
    /// # Returns
    /// `Err(RecordError)` if the field is not part of this table, is derived,
    /// or the value fails the field type's validity check.
    pub fn set_value(&mut self, field: &Field, value: impl Into<Value>) -> Result<(), RecordError> {
        let field = self.lookup(field)?;
        let value = value.into();
        let (table, name) = self.error_fields(&field);
        if field.is_derived() {
            return Err(RecordError::DerivedNotWritable { table, field: name });
        }
        let operator = self
            .codec
            .operator(field.id())
            .ok_or_else(|| self.unknown(field.name()))?;
        if !operator.is_valid(&value) {
            return Err(RecordError::ValueRejected {
                table,
                field: name,
                expected: field.field_type().to_string(),
                got: value.type_name().to_string(),
            });
        }
        self.cleared.remove(&field.id());
        self.pending.insert(field.id(), value);
        Ok(())
    }

    pub fn set_by_name(&mut self, name: &str, value: impl Into<Value>) -> Result<(), RecordError> {
        let field = self.lookup_name(name)?;
        self.set_value(&field, value)
    }

    /// Removes the value of an optional field; reads then yield its default.
    pub fn clear_value(&mut self, field: &Field) -> Result<(), RecordError> {
        let field = self.lookup(field)?;
        let (table, name) = self.error_fields(&field);
        if field.is_derived() {
            return Err(RecordError::DerivedNotWritable { table, field: name });
        }
        if field.is_required() {
            return Err(RecordError::NotOptional { table, field: name });
        }
        self.pending.remove(&field.id());
        if self.buffer.as_ref().is_some_and(|b| b.contains(field.id())) {
            self.cleared.insert(field.id());
        }
        Ok(())
    }

    /// Returns `true` if the field holds an explicitly set or stored value.
    pub fn is_set(&self, field: &Field) -> bool {
        if self.pending.contains_key(&field.id()) {
            return Self::resolve(self.table(), field).is_some();
        }
        !self.cleared.contains(&field.id())
            && Self::resolve(self.table(), field).is_some()
            && self.buffer.as_ref().is_some_and(|b| b.contains(field.id()))
    }

    /// Returns `true` if every required stored field is set.
    pub fn is_complete(&self) -> bool {
        self.table()
            .required_fields()
            .filter(|f| f.is_stored())
            .all(|f| self.is_set(f))
    }

    /// Stored or staged value of a resolved field, without defaults.
    fn stored_value(&self, field: &Field) -> Result<Option<Value>, RecordError> {
        if let Some(value) = self.pending.get(&field.id()) {
            return Ok(Some(value.clone()));
        }
        if self.cleared.contains(&field.id()) {
            return Ok(None);
        }
        match &self.buffer {
            Some(buffer) => self.codec.read_field(buffer, field),
            None => Ok(None),
        }
    }

    /// Value of `field`, decoding only that field.
    ///
    /// Absent optional fields yield their effective default. Derived fields
    /// run their bound computation.
    pub fn get_value(&self, field: &Field) -> Result<Value, RecordError> {
        let field = Self::resolve(self.table(), field).ok_or_else(|| self.unknown(field.name()))?;
        if field.is_derived() {
            let compute = self.derived.get(field.name()).ok_or_else(|| {
                let (table, name) = self.error_fields(field);
                RecordError::DerivedNotBound { table, field: name }
            })?;
            return compute(self);
        }
        if let Some(value) = self.stored_value(field)? {
            return Ok(value);
        }
        let (table, name) = self.error_fields(field);
        if field.is_required() {
            return Err(RecordError::MissingRequired { table, field: name });
        }
        field
            .effective_default()
            .ok_or(RecordError::NoValue { table, field: name })
    }

    pub fn get_by_name(&self, name: &str) -> Result<Value, RecordError> {
        let field = self.lookup_name(name)?;
        self.get_value(&field)
    }

    /// Explicitly set or stored value of a stored field, without defaults.
    pub fn try_get(&self, field: &Field) -> Result<Option<Value>, RecordError> {
        let field = Self::resolve(self.table(), field).ok_or_else(|| self.unknown(field.name()))?;
        if field.is_derived() {
            return Ok(None);
        }
        self.stored_value(field)
    }

    /// Every stored field value currently set, keyed by field id.
    pub fn values(&self) -> Result<BTreeMap<i16, Value>, RecordError> {
        let mut values = match &self.buffer {
            Some(buffer) => self.codec.decode_all(buffer)?,
            None => BTreeMap::new(),
        };
        for id in &self.cleared {
            values.remove(id);
        }
        for (id, value) in &self.pending {
            values.insert(*id, value.clone());
        }
        Ok(values)
    }

    /// Length of the record's encoded form.
    pub fn byte_length(&self) -> Result<usize, RecordError> {
        match &self.buffer {
            Some(buffer) if !self.is_dirty() => Ok(buffer.len()),
            _ => self.codec.encoded_len(&self.values()?),
        }
    }

    /// Encoded form of the record, including staged changes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        match &self.buffer {
            Some(buffer) if !self.is_dirty() => Ok(buffer.to_vec()),
            _ => self.codec.encode(&self.values()?),
        }
    }

    /// Applies staged changes by building a fresh buffer.
    ///
    /// # Returns
    /// The new buffer, or `Err(RecordError)` if a required field is missing
    /// or the record exceeds the size limit; the record is unchanged on error.
    pub fn finish(&mut self) -> Result<&RecordBuffer, RecordError> {
        let buffer = match (&self.buffer, self.is_dirty()) {
            (Some(buffer), false) => buffer.clone(),
            _ => {
                let bytes = self.codec.encode(&self.values()?)?;
                let buffer =
                    RecordBuffer::wrap_with_limit(bytes, self.codec.config().max_record_size)?;
                tracing::debug!(
                    "Rebuilt '{}' record buffer: {} bytes, {} fields",
                    self.table().name(),
                    buffer.len(),
                    buffer.entry_count()
                );
                buffer
            }
        };
        self.pending.clear();
        self.cleared.clear();
        Ok(&*self.buffer.insert(buffer))
    }

    fn collection_field(&self, field: &Field) -> Result<Field, RecordError> {
        let field = self.lookup(field)?;
        if !field.field_type().is_collection() {
            let (table, name) = self.error_fields(&field);
            return Err(RecordError::NotACollection { table, field: name });
        }
        Ok(field)
    }

    fn staged_list<'a>(&'a self, field: &Field) -> Option<&'a [Value]> {
        self.pending.get(&field.id()).and_then(Value::as_list)
    }

    fn reads_buffer(&self, field: &Field) -> Option<&RecordBuffer> {
        if self.pending.contains_key(&field.id()) || self.cleared.contains(&field.id()) {
            return None;
        }
        self.buffer.as_ref()
    }

    /// Element count of a list field, read without decoding the elements.
    pub fn list_size(&self, field: &Field) -> Result<usize, RecordError> {
        let field = self.collection_field(field)?;
        if let Some(items) = self.staged_list(&field) {
            return Ok(items.len());
        }
        if let Some(buffer) = self.reads_buffer(&field) {
            if let Some(size) = self.codec.list_size(buffer, &field)? {
                return Ok(size);
            }
        }
        match self.get_value(&field)? {
            Value::List(items) => Ok(items.len()),
            _ => Ok(0),
        }
    }

    /// One element of a list field, decoded without touching the others.
    pub fn list_element(&self, field: &Field, index: usize) -> Result<Value, RecordError> {
        let field = self.collection_field(field)?;
        let out_of_range = |len| RecordError::IndexOutOfRange {
            field: field.name().to_string(),
            index,
            len,
        };
        if let Some(items) = self.staged_list(&field) {
            return items.get(index).cloned().ok_or_else(|| out_of_range(items.len()));
        }
        if let Some(buffer) = self.reads_buffer(&field) {
            if let Some(value) = self.codec.list_element(buffer, &field, index)? {
                return Ok(value);
            }
        }
        match self.get_value(&field)? {
            Value::List(items) => items.get(index).cloned().ok_or_else(|| out_of_range(items.len())),
            _ => Err(out_of_range(0)),
        }
    }

    /// Binds the computation of a derived field.
    pub fn bind_derived<F>(&mut self, field: &Field, compute: F) -> Result<(), RecordError>
    where
        F: Fn(&Record) -> Result<Value, RecordError> + Send + Sync + 'static,
    {
        let field = self.lookup(field)?;
        if !field.is_derived() {
            let (table, name) = self.error_fields(&field);
            return Err(RecordError::NotDerived { table, field: name });
        }
        self.derived.insert(field.name().to_string(), Arc::new(compute));
        Ok(())
    }

    /// Orders two records of the same table by the table's sort key.
    pub fn cmp_by_sort_key(&self, other: &Record) -> Result<Ordering, RecordError> {
        if self.table().name() != other.table().name() {
            return Err(RecordError::TableMismatch {
                expected: self.table().name().to_string(),
                got: other.table().name().to_string(),
            });
        }
        let key = self.table().sort_key().ok_or_else(|| RecordError::NoSortKey {
            table: self.table().name().to_string(),
        })?;
        let ours = self.get_value(key)?;
        let theirs = other.get_value(key)?;
        let ordering = ours.compare(&theirs).unwrap_or(Ordering::Equal);
        Ok(match key.constraints().sort_order() {
            Some(SortOrder::Descending) => ordering.reverse(),
            _ => ordering,
        })
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        if self.table().name() != other.table().name() {
            return false;
        }
        matches!((self.values(), other.values()), (Ok(a), Ok(b)) if a == b)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("table", &self.table().name())
            .field("buffer", &self.buffer)
            .field("pending", &self.pending)
            .field("cleared", &self.cleared)
            .field("derived", &self.derived.keys().collect::<Vec<_>>())
            .finish()
    }
}
