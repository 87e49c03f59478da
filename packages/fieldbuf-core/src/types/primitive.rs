//! Primitive value types and their stable wire ids.

use std::fmt;

/// Primitive value types.
///
/// Every non-sentinel type has a stable id in `[1, 999]`. Ids are part of the
/// persisted format and must never be reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    /// Sentinel for "no type" (id 0)
    Null,
    Bool,
    Byte,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    String,
    Binary,
    /// Sentinel for an unrecognized type (id -1)
    Unknown,
}

impl PrimitiveType {
    /// All concrete (non-sentinel) primitive types in id order.
    pub const ALL: [PrimitiveType; 9] = [
        PrimitiveType::Bool,
        PrimitiveType::Byte,
        PrimitiveType::Int16,
        PrimitiveType::Int32,
        PrimitiveType::Int64,
        PrimitiveType::Float,
        PrimitiveType::Double,
        PrimitiveType::String,
        PrimitiveType::Binary,
    ];

    /// Returns the stable type id.
    pub const fn id(self) -> i32 {
        match self {
            PrimitiveType::Null => 0,
            PrimitiveType::Bool => 1,
            PrimitiveType::Byte => 2,
            PrimitiveType::Int16 => 3,
            PrimitiveType::Int32 => 4,
            PrimitiveType::Int64 => 5,
            PrimitiveType::Float => 6,
            PrimitiveType::Double => 7,
            PrimitiveType::String => 8,
            PrimitiveType::Binary => 9,
            PrimitiveType::Unknown => -1,
        }
    }

    /// Looks up a primitive type by its stable id.
    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(PrimitiveType::Null),
            -1 => Some(PrimitiveType::Unknown),
            _ => Self::ALL.iter().copied().find(|p| p.id() == id),
        }
    }

    /// Returns the lowercase name used in schema definitions.
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveType::Null => "null",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::String => "string",
            PrimitiveType::Binary => "binary",
            PrimitiveType::Unknown => "unknown",
        }
    }

    /// Looks up a concrete primitive type by name. Sentinels are not matched.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Payload width in bytes for fixed-width types, `None` for STRING,
    /// BINARY and the sentinels.
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            PrimitiveType::Bool | PrimitiveType::Byte => Some(1),
            PrimitiveType::Int16 => Some(2),
            PrimitiveType::Int32 | PrimitiveType::Float => Some(4),
            PrimitiveType::Int64 | PrimitiveType::Double => Some(8),
            PrimitiveType::String
            | PrimitiveType::Binary
            | PrimitiveType::Null
            | PrimitiveType::Unknown => None,
        }
    }

    /// Returns `true` for `Null` and `Unknown`.
    pub const fn is_sentinel(self) -> bool {
        matches!(self, PrimitiveType::Null | PrimitiveType::Unknown)
    }

    /// Returns `true` for the floating point types.
    pub const fn is_floating(self) -> bool {
        matches!(self, PrimitiveType::Float | PrimitiveType::Double)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
