//! Field definition within a table.

use super::constraints::Constraints;
use super::error::ModelError;
use super::field_type::FieldType;
use super::primitive::PrimitiveType;
use super::value::Value;

/// Reserved field id shared by all derived fields.
pub const DERIVED_FIELD_ID: i16 = 0;

/// One typed, identified column of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Stable id; the only cross-version key of the field
    id: i16,
    /// Field name
    name: String,
    /// Declared type
    field_type: FieldType,
    /// Constraint set
    constraints: Constraints,
    /// Schema-declared default for optional scalar fields
    default_value: Option<Value>,
}

impl Field {
    /// Creates a new field.
    ///
    /// # Arguments
    /// * `id` - Field id; `0` is reserved for derived fields
    /// * `name` - Field name
    /// * `field_type` - Declared type
    /// * `constraints` - Constraint set
    /// * `default_value` - Optional scalar default
    ///
    /// # Returns
    /// `Err(ModelError)` for negative ids, empty names, sentinel types and
    /// non-scalar defaults. Remaining invariants are checked by validation.
    pub fn new(
        id: i16,
        name: impl Into<String>,
        field_type: FieldType,
        constraints: Constraints,
        default_value: Option<Value>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyFieldName);
        }
        if id < 0 {
            return Err(ModelError::NegativeFieldId { field: name, id });
        }
        if let Some(p) = field_type.as_primitive() {
            if p.is_sentinel() {
                return Err(ModelError::UnsupportedType {
                    field: name,
                    type_name: p.name().to_string(),
                });
            }
        }
        if let Some(value) = &default_value {
            if !value.is_scalar() {
                return Err(ModelError::NonScalarDefault {
                    field: name,
                    got: value.type_name().to_string(),
                });
            }
        }

        Ok(Self {
            id,
            name,
            field_type,
            constraints,
            default_value,
        })
    }

    /// Shorthand for a required field without default.
    pub fn required(
        id: i16,
        name: impl Into<String>,
        field_type: impl Into<FieldType>,
    ) -> Result<Self, ModelError> {
        Self::new(id, name, field_type.into(), Constraints::required(), None)
    }

    /// Shorthand for an optional field with a default.
    pub fn optional(
        id: i16,
        name: impl Into<String>,
        field_type: impl Into<FieldType>,
        default_value: impl Into<Value>,
    ) -> Result<Self, ModelError> {
        Self::new(
            id,
            name,
            field_type.into(),
            Constraints::optional(),
            Some(default_value.into()),
        )
    }

    pub fn id(&self) -> i16 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Schema-declared default, if any.
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.constraints.is_required()
    }

    pub fn is_optional(&self) -> bool {
        self.constraints.is_optional()
    }

    pub fn is_derived(&self) -> bool {
        self.constraints.is_derived()
    }

    pub fn is_sort_key(&self) -> bool {
        self.constraints.is_sort_key()
    }

    /// Returns `true` if the field is physically stored in record buffers.
    pub fn is_stored(&self) -> bool {
        !self.constraints.is_derived()
    }

    /// Returns `true` if the field must declare a default value: optional,
    /// stored, primitive and not binary.
    pub fn requires_default(&self) -> bool {
        self.is_optional()
            && self.is_stored()
            && matches!(self.field_type.as_primitive(), Some(p) if p != PrimitiveType::Binary)
    }

    /// Value read for an optional field that is absent from a record.
    ///
    /// The declared default, or the natural empty value for binary and list
    /// fields. Groups have no implicit default.
    pub fn effective_default(&self) -> Option<Value> {
        if let Some(value) = &self.default_value {
            return Some(value.clone());
        }
        match &self.field_type {
            FieldType::Primitive(PrimitiveType::Binary) => Some(Value::Binary(Vec::new())),
            FieldType::Collection { .. } => Some(Value::List(Vec::new())),
            _ => None,
        }
    }
}
