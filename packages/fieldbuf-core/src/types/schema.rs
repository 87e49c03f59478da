//! Schema: a named, ordered collection of tables.

use std::collections::HashMap;
use std::sync::Arc;

use super::error::ModelError;
use super::field::Field;
use super::table::Table;

/// Schema definition.
///
/// Immutable once built and freely shareable. Group references are not
/// checked here; dangling references are reported by schema validation.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    tables: Vec<Arc<Table>>,
    by_name: HashMap<String, usize>,
}

impl Schema {
    /// Creates a schema from tables in declaration order.
    ///
    /// Group references are not resolved here: a schema naming a table it
    /// does not contain is accepted and reported by
    /// [`validate_schema`](crate::validation::validate_schema) as
    /// `UnresolvedGroup`. [`SchemaDefinition::build`](crate::SchemaDefinition::build)
    /// rejects dangling references while building.
    ///
    /// # Returns
    /// `Err(ModelError::DuplicateTable)` if two tables share a name.
    pub fn new(name: impl Into<String>, tables: Vec<Arc<Table>>) -> Result<Self, ModelError> {
        let name = name.into();
        let mut by_name = HashMap::with_capacity(tables.len());
        for (index, table) in tables.iter().enumerate() {
            if by_name.insert(table.name().to_string(), index).is_some() {
                return Err(ModelError::DuplicateTable {
                    schema: name,
                    table: table.name().to_string(),
                });
            }
        }
        Ok(Self {
            name,
            tables,
            by_name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tables in declaration order.
    pub fn tables(&self) -> &[Arc<Table>] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Arc<Table>> {
        self.by_name.get(name).map(|&i| &self.tables[i])
    }

    /// Walks every `(table, field)` pair in declaration order.
    ///
    /// Downstream generators fold over this sequence instead of receiving
    /// visitor callbacks.
    pub fn traverse(&self) -> impl Iterator<Item = (&Table, &Field)> + '_ {
        self.tables
            .iter()
            .flat_map(|table| table.fields().iter().map(move |field| (table.as_ref(), field)))
    }

    /// Every field whose type references a group, with the referenced table name.
    pub fn group_references(&self) -> impl Iterator<Item = (&Table, &Field, &str)> + '_ {
        self.traverse().filter_map(|(table, field)| {
            field
                .field_type()
                .referenced_group()
                .map(|group| (table, field, group.name()))
        })
    }
}
