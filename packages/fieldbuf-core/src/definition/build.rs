//! Conversion between schema definitions and the schema model.

use std::collections::HashMap;
use std::sync::Arc;

use crate::record::{scalar_from_json, value_to_json};
use crate::types::{
    Constraints, Field, FieldType, ModelError, PrimitiveType, Schema, Table, TypeInterner,
};

use super::file::{FieldDefinition, SchemaDefinition, TableDefinition};

/// Parses a type string: a primitive name, `list<element>`, or a table name.
///
/// Group types are returned unresolved.
pub fn parse_type(text: &str, interner: &TypeInterner) -> Result<Arc<FieldType>, ModelError> {
    let text = text.trim();
    if let Some(inner) = text
        .strip_prefix("list<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        let element = parse_type(inner, interner)?;
        return interner.list(FieldType::clone(&element));
    }
    if let Some(primitive) = PrimitiveType::from_name(text) {
        return Ok(interner.primitive(primitive));
    }

    let is_identifier = text
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !is_identifier || text == "null" || text == "unknown" {
        return Err(ModelError::UnknownType {
            type_name: text.to_string(),
        });
    }
    Ok(interner.group(text))
}

enum Visit {
    InProgress,
    Done(Arc<Table>),
}

/// Builds tables in group dependency order.
struct Builder<'a> {
    definitions: HashMap<&'a str, &'a TableDefinition>,
    visits: HashMap<&'a str, Visit>,
    interner: &'a TypeInterner,
    strict: bool,
}

impl<'a> Builder<'a> {
    fn table(&mut self, definition: &'a TableDefinition) -> Result<Arc<Table>, ModelError> {
        match self.visits.get(definition.name.as_str()) {
            Some(Visit::Done(table)) => return Ok(Arc::clone(table)),
            Some(Visit::InProgress) => {
                return Err(ModelError::CyclicGroup {
                    table: definition.name.clone(),
                })
            }
            None => {}
        }
        self.visits
            .insert(definition.name.as_str(), Visit::InProgress);

        let mut fields = Vec::with_capacity(definition.fields.len());
        for field in &definition.fields {
            fields.push(self.field(definition, field)?);
        }
        let table = Arc::new(Table::new(&definition.name, definition.version, fields)?);

        self.visits
            .insert(definition.name.as_str(), Visit::Done(Arc::clone(&table)));
        Ok(table)
    }

    fn field(
        &mut self,
        table: &TableDefinition,
        definition: &FieldDefinition,
    ) -> Result<Field, ModelError> {
        let parsed = parse_type(&definition.r#type, self.interner)?;
        let field_type = self.resolve(table, definition, &parsed)?;
        let constraints = Constraints::from_names(definition.constraints.iter().map(String::as_str))?;

        let default = match (&definition.default, field_type.as_primitive()) {
            (None, _) => None,
            (Some(json), Some(primitive)) => Some(scalar_from_json(primitive, json).map_err(
                |message| ModelError::InvalidDefault {
                    field: definition.name.clone(),
                    message,
                },
            )?),
            (Some(_), None) => {
                return Err(ModelError::InvalidDefault {
                    field: definition.name.clone(),
                    message: format!("type {} takes no default", field_type),
                })
            }
        };

        Field::new(
            definition.id,
            &definition.name,
            field_type,
            constraints,
            default,
        )
    }

    /// Binds group references to their built tables.
    fn resolve(
        &mut self,
        table: &TableDefinition,
        field: &FieldDefinition,
        parsed: &FieldType,
    ) -> Result<FieldType, ModelError> {
        match parsed {
            FieldType::Primitive(_) => Ok(parsed.clone()),
            FieldType::Collection { element, .. } => {
                FieldType::list(self.resolve(table, field, element)?)
            }
            FieldType::Group(group) => match self.definitions.get(group.name()).copied() {
                Some(target) => Ok(FieldType::resolved_group(self.table(target)?)),
                None if self.strict => Err(ModelError::UnresolvedGroup {
                    table: table.name.clone(),
                    field: field.name.clone(),
                    group: group.name().to_string(),
                }),
                None => Ok(parsed.clone()),
            },
        }
    }
}

impl SchemaDefinition {
    /// Builds the schema model, resolving every group reference.
    ///
    /// # Returns
    /// `Err(ModelError)` for unknown types or constraints, malformed fields
    /// or tables, dangling group references and group reference cycles.
    pub fn build(&self, interner: &TypeInterner) -> Result<Schema, ModelError> {
        self.build_with(interner, true)
    }

    /// Builds the schema model, keeping references to unknown tables as
    /// unresolved groups so validation can report them.
    pub fn build_unresolved(&self, interner: &TypeInterner) -> Result<Schema, ModelError> {
        self.build_with(interner, false)
    }

    fn build_with(&self, interner: &TypeInterner, strict: bool) -> Result<Schema, ModelError> {
        let mut definitions = HashMap::with_capacity(self.tables.len());
        for table in &self.tables {
            if definitions.insert(table.name.as_str(), table).is_some() {
                return Err(ModelError::DuplicateTable {
                    schema: self.name.clone(),
                    table: table.name.clone(),
                });
            }
        }

        let mut builder = Builder {
            definitions,
            visits: HashMap::new(),
            interner,
            strict,
        };
        let tables = self
            .tables
            .iter()
            .map(|t| builder.table(t))
            .collect::<Result<Vec<_>, _>>()?;

        let schema = Schema::new(&self.name, tables)?;
        tracing::debug!(
            "Built schema '{}' with {} tables",
            schema.name(),
            schema.tables().len()
        );
        Ok(schema)
    }

    /// Reflects a schema model back into its definition.
    pub fn from_schema(schema: &Schema) -> Result<Self, ModelError> {
        let tables = schema
            .tables()
            .iter()
            .map(|table| -> Result<TableDefinition, ModelError> {
                let fields = table
                    .fields()
                    .iter()
                    .map(field_definition)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TableDefinition {
                    name: table.name().to_string(),
                    version: table.version(),
                    fields,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: schema.name().to_string(),
            tables,
        })
    }
}

fn field_definition(field: &Field) -> Result<FieldDefinition, ModelError> {
    let default = field
        .default_value()
        .map(value_to_json)
        .transpose()
        .map_err(|e| ModelError::InvalidDefault {
            field: field.name().to_string(),
            message: e.to_string(),
        })?;
    Ok(FieldDefinition {
        id: field.id(),
        name: field.name().to_string(),
        r#type: field.field_type().to_string(),
        constraints: field
            .constraints()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        default,
    })
}

impl Schema {
    /// Reflects this schema into its textual definition.
    pub fn to_definition(&self) -> Result<SchemaDefinition, ModelError> {
        SchemaDefinition::from_schema(self)
    }
}
