//! Schema definition file format.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::ModelError;

/// Textual schema definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    /// Schema name
    pub name: String,
    /// Table definitions in declaration order
    #[serde(default)]
    pub tables: Vec<TableDefinition>,
}

/// Table definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name, also the type name of groups referencing it
    pub name: String,
    /// Table version
    pub version: i16,
    /// Field definitions in declaration order
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// Field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Permanent field id
    pub id: i16,
    /// Field name
    pub name: String,
    /// Primitive name, `list<element>`, or a table name
    pub r#type: String,
    /// Constraint names such as `required` or `asc_sorted`
    #[serde(default)]
    pub constraints: Vec<String>,
    /// Default value literal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl SchemaDefinition {
    /// Loads a definition from a JSON file.
    ///
    /// # Arguments
    /// * `path` - Path to the definition file
    ///
    /// # Returns
    /// `Err(ModelError::Io)` if the file cannot be read, `Err(ModelError::Parse)`
    /// if it is not a valid definition.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ModelError::Io(format!("{}: {}", path.display(), e)))?;
        let definition = Self::from_json_str(&text)?;
        tracing::debug!(
            "Loaded schema definition '{}' from {}",
            definition.name,
            path.display()
        );
        Ok(definition)
    }

    /// Writes the definition as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let text = self.to_json_string()?;
        fs::write(path, text).map_err(|e| ModelError::Io(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json_str(text: &str) -> Result<Self, ModelError> {
        serde_json::from_str(text).map_err(|e| ModelError::Parse(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String, ModelError> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::Parse(e.to_string()))
    }

    /// Table definition by name.
    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.name == name)
    }
}
