//! Table definition: a named, versioned, ordered set of fields.

use std::collections::HashMap;

use super::error::ModelError;
use super::field::{Field, DERIVED_FIELD_ID};

/// Table definition.
///
/// Fields keep declaration order. Field ids need not be contiguous.
#[derive(Debug, Clone)]
pub struct Table {
    /// Table name
    name: String,
    /// Table version
    version: i16,
    /// Field definitions in declaration order
    fields: Vec<Field>,
    /// Stored field id -> index into `fields`
    by_id: HashMap<i16, usize>,
    /// Field name -> index into `fields`
    by_name: HashMap<String, usize>,
}

impl Table {
    /// Creates a new table with the given name, version and fields.
    ///
    /// # Arguments
    /// * `name` - Table name
    /// * `version` - Table version
    /// * `fields` - Field definitions in declaration order
    ///
    /// # Returns
    /// `Err(ModelError)` if two fields share a name, or two non-derived
    /// fields share an id.
    pub fn new(
        name: impl Into<String>,
        version: i16,
        fields: Vec<Field>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyTableName);
        }

        let mut by_id: HashMap<i16, usize> = HashMap::with_capacity(fields.len());
        let mut by_name = HashMap::with_capacity(fields.len());

        for (index, field) in fields.iter().enumerate() {
            if by_name.insert(field.name().to_string(), index).is_some() {
                return Err(ModelError::DuplicateFieldName {
                    table: name,
                    field: field.name().to_string(),
                });
            }

            // Derived fields all share the reserved sentinel id
            if field.id() == DERIVED_FIELD_ID {
                continue;
            }
            if let Some(previous) = by_id.insert(field.id(), index) {
                return Err(ModelError::DuplicateFieldId {
                    table: name,
                    id: field.id(),
                    first: fields[previous].name().to_string(),
                    second: field.name().to_string(),
                });
            }
        }

        Ok(Self {
            name,
            version,
            fields,
            by_id,
            by_name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> i16 {
        self.version
    }

    /// Field definitions in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by its (non-sentinel) id.
    pub fn field_by_id(&self, id: i16) -> Option<&Field> {
        self.by_id.get(&id).map(|&i| &self.fields[i])
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// Returns `true` if `field` is this table's field with the same id and name.
    pub fn contains(&self, field: &Field) -> bool {
        self.field_by_name(field.name())
            .is_some_and(|f| f.id() == field.id())
    }

    /// The first field carrying a sort order.
    pub fn sort_key(&self) -> Option<&Field> {
        self.fields.iter().find(|f| f.is_sort_key())
    }

    /// Fields that are physically stored (not derived), in declaration order.
    pub fn stored_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_stored())
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_required())
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version && self.fields == other.fields
    }
}
