//! Field types: primitives, groups (nested tables) and collections.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::error::ModelError;
use super::primitive::PrimitiveType;
use super::table::Table;

/// Type id shared by all group types. Groups are told apart by name.
pub const GROUP_TYPE_ID: i32 = 100;

/// Multiplier applied to the collection kind id when forming a collection type id.
pub const COLLECTION_ID_FACTOR: i32 = 1000;

/// Collection kinds. `Set` is reserved and has no codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    List,
}

impl CollectionKind {
    pub const fn id(self) -> i32 {
        match self {
            CollectionKind::List => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            CollectionKind::List => "list",
        }
    }
}

/// A nested-record type.
///
/// Identity is the table name only. The resolved table is metadata used by
/// the codec to encode and decode nested records.
#[derive(Debug, Clone)]
pub struct GroupType {
    name: String,
    table: Option<Arc<Table>>,
}

impl GroupType {
    /// Creates an unresolved group reference.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
        }
    }

    /// Creates a group type bound to its table.
    pub fn resolved(table: Arc<Table>) -> Self {
        Self {
            name: table.name().to_string(),
            table: Some(table),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the resolved table, if any.
    pub fn table(&self) -> Option<&Arc<Table>> {
        self.table.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.table.is_some()
    }
}

impl PartialEq for GroupType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for GroupType {}

impl Hash for GroupType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// The type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Primitive(PrimitiveType),
    Group(GroupType),
    Collection {
        kind: CollectionKind,
        element: Arc<FieldType>,
    },
}

impl FieldType {
    pub fn primitive(primitive: PrimitiveType) -> Self {
        FieldType::Primitive(primitive)
    }

    /// Unresolved group reference by table name.
    pub fn group(name: impl Into<String>) -> Self {
        FieldType::Group(GroupType::new(name))
    }

    /// Group type bound to `table`.
    pub fn resolved_group(table: Arc<Table>) -> Self {
        FieldType::Group(GroupType::resolved(table))
    }

    /// Creates a list type.
    ///
    /// # Arguments
    /// * `element` - Element type; must be a concrete primitive or a group
    ///
    /// # Returns
    /// `Err(ModelError::InvalidCollectionElement)` for nested collections and
    /// sentinel primitives.
    pub fn list(element: FieldType) -> Result<Self, ModelError> {
        match &element {
            FieldType::Collection { .. } => Err(ModelError::InvalidCollectionElement {
                element: element.to_string(),
            }),
            FieldType::Primitive(p) if p.is_sentinel() => {
                Err(ModelError::InvalidCollectionElement {
                    element: element.to_string(),
                })
            }
            _ => Ok(FieldType::Collection {
                kind: CollectionKind::List,
                element: Arc::new(element),
            }),
        }
    }

    /// Structural type id: the primitive id, [`GROUP_TYPE_ID`] for groups, and
    /// `kind.id * 1000 + element.id` for collections.
    pub fn type_id(&self) -> i32 {
        match self {
            FieldType::Primitive(p) => p.id(),
            FieldType::Group(_) => GROUP_TYPE_ID,
            FieldType::Collection { kind, element } => {
                kind.id() * COLLECTION_ID_FACTOR + element.type_id()
            }
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            FieldType::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupType> {
        match self {
            FieldType::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, FieldType::Primitive(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self, FieldType::Group(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, FieldType::Collection { .. })
    }

    /// Element type of a collection.
    pub fn element(&self) -> Option<&FieldType> {
        match self {
            FieldType::Collection { element, .. } => Some(element),
            _ => None,
        }
    }

    /// The group referenced by a group or list-of-group type.
    pub fn referenced_group(&self) -> Option<&GroupType> {
        match self {
            FieldType::Group(g) => Some(g),
            FieldType::Collection { element, .. } => element.referenced_group(),
            FieldType::Primitive(_) => None,
        }
    }

    /// Payload width for fixed-width primitives.
    pub fn fixed_width(&self) -> Option<usize> {
        self.as_primitive().and_then(PrimitiveType::fixed_width)
    }

    /// Header bytes the layout engine reserves to recover the payload length.
    pub fn metadata_width(&self) -> usize {
        match self {
            FieldType::Primitive(PrimitiveType::String) => 2,
            FieldType::Primitive(p) if p.fixed_width().is_some() => 0,
            _ => 4,
        }
    }
}

impl From<PrimitiveType> for FieldType {
    fn from(primitive: PrimitiveType) -> Self {
        FieldType::Primitive(primitive)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Primitive(p) => write!(f, "{}", p),
            FieldType::Group(g) => f.write_str(g.name()),
            FieldType::Collection { kind, element } => write!(f, "{}<{}>", kind.name(), element),
        }
    }
}
