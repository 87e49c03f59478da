//! Value codecs: one operator per field type and a memoizing factory.
//!
//! Operators and per-table codecs are cached in [`OperatorRegistry`] using
//! `ArcSwap` copy-on-write maps: reads are lock-free, inserts are
//! first-writer-wins.

mod bytes;
mod collection;
mod group;
mod primitive;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::record::TableCodec;
use crate::types::{FieldType, PrimitiveType, Table, Value};

pub use collection::CollectionOperator;
pub use group::GroupOperator;
pub use primitive::{BinaryOperator, FixedWidthOperator, StringOperator};

pub(crate) use bytes::{read_i16, read_metadata, read_u16, read_u32, slice_at, write_metadata};

/// Encode/decode/validate contract for one field type.
pub trait ValueOperator: fmt::Debug + Send + Sync {
    /// The type this operator handles.
    fn field_type(&self) -> &FieldType;

    /// Type and range check. Encoding an invalid value fails.
    fn is_valid(&self, value: &Value) -> bool;

    /// `true` for all primitives except STRING and BINARY.
    fn has_fixed_length(&self) -> bool;

    /// Payload width of fixed-length types.
    fn fixed_width(&self) -> Option<usize> {
        None
    }

    /// Header bytes the layout engine reserves to recover the payload length.
    fn metadata_width(&self) -> usize;

    /// Number of payload bytes `value` occupies.
    fn size_of(&self, value: &Value) -> Result<usize, CodecError>;

    /// Appends the canonical payload of `value` to `out`.
    fn encode_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), CodecError>;

    /// Decodes a payload of `length` bytes at absolute `offset` in `buf`.
    fn decode(&self, buf: &[u8], offset: usize, length: usize) -> Result<Value, CodecError>;

    /// Canonical payload of `value`.
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(self.size_of(value)?);
        self.encode_into(value, &mut out)?;
        Ok(out)
    }

    fn as_collection(&self) -> Option<&CollectionOperator> {
        None
    }

    fn as_group(&self) -> Option<&GroupOperator> {
        None
    }
}

pub(crate) fn invalid_value(expected: &FieldType, got: &Value) -> CodecError {
    CodecError::InvalidValue {
        expected: expected.to_string(),
        got: got.type_name().to_string(),
    }
}

/// Field type plus the version of the table it nests, if any.
type OperatorKey = (FieldType, Option<i16>);

type OperatorMap = HashMap<OperatorKey, Arc<dyn ValueOperator>>;
type CodecMap = HashMap<(String, i16), Arc<TableCodec>>;

/// Memoizing operator factory.
///
/// Owned by the call context. Operators are keyed by structural type
/// identity; types nesting a group also by the group table's version, like
/// table codecs, which are keyed by table name and version. Several versions
/// of one table can share a registry.
pub struct OperatorRegistry {
    config: CodecConfig,
    operators: ArcSwap<OperatorMap>,
    codecs: ArcSwap<CodecMap>,
}

impl OperatorRegistry {
    /// Creates a registry with default limits.
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            config,
            operators: ArcSwap::from_pointee(HashMap::new()),
            codecs: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Returns the operator for `field_type`, creating it on first use.
    ///
    /// # Returns
    /// `Err(CodecError)` for sentinel primitives and unresolved groups.
    pub fn operator_for(&self, field_type: &FieldType) -> Result<Arc<dyn ValueOperator>, CodecError> {
        let key = operator_key(field_type);
        if let Some(op) = self.operators.load().get(&key) {
            return Ok(Arc::clone(op));
        }

        // Built outside any lock: nested types recurse into the registry
        let created = self.create_operator(field_type)?;
        self.operators.rcu(|current| {
            if current.contains_key(&key) {
                return Arc::clone(current);
            }
            let mut next = HashMap::clone(current);
            next.insert(key.clone(), Arc::clone(&created));
            Arc::new(next)
        });
        tracing::debug!("Cached value operator for type '{}'", field_type);

        Ok(self.operators.load().get(&key).cloned().unwrap_or(created))
    }

    /// Returns the compiled layout codec for `table`, creating it on first use.
    pub fn table_codec(&self, table: &Arc<Table>) -> Result<Arc<TableCodec>, CodecError> {
        let key = (table.name().to_string(), table.version());
        if let Some(codec) = self.codecs.load().get(&key) {
            return Ok(Arc::clone(codec));
        }

        let created = Arc::new(TableCodec::new(Arc::clone(table), self)?);
        self.codecs.rcu(|current| {
            if current.contains_key(&key) {
                return Arc::clone(current);
            }
            let mut next = HashMap::clone(current);
            next.insert(key.clone(), Arc::clone(&created));
            Arc::new(next)
        });
        tracing::debug!(
            "Cached table codec for '{}' version {}",
            table.name(),
            table.version()
        );

        Ok(self.codecs.load().get(&key).cloned().unwrap_or(created))
    }

    /// Number of cached operators.
    pub fn operator_count(&self) -> usize {
        self.operators.load().len()
    }

    fn create_operator(&self, field_type: &FieldType) -> Result<Arc<dyn ValueOperator>, CodecError> {
        let op: Arc<dyn ValueOperator> = match field_type {
            FieldType::Primitive(p) => primitive_operator(*p, &self.config)?,
            FieldType::Group(group) => {
                let table = group.table().ok_or_else(|| CodecError::UnresolvedGroup {
                    group: group.name().to_string(),
                })?;
                let codec = self.table_codec(table)?;
                Arc::new(GroupOperator::new(field_type.clone(), codec))
            }
            FieldType::Collection { element, .. } => {
                let element = self.operator_for(element)?;
                Arc::new(CollectionOperator::new(
                    field_type.clone(),
                    element,
                    self.config.max_list_elements,
                ))
            }
        };
        Ok(op)
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("config", &self.config)
            .field("operators", &self.operators.load().len())
            .field("codecs", &self.codecs.load().len())
            .finish()
    }
}

fn operator_key(field_type: &FieldType) -> OperatorKey {
    let version = field_type
        .referenced_group()
        .and_then(|g| g.table())
        .map(|t| t.version());
    (field_type.clone(), version)
}

/// Creates a standalone operator for a primitive type.
pub fn primitive_operator(
    primitive: PrimitiveType,
    config: &CodecConfig,
) -> Result<Arc<dyn ValueOperator>, CodecError> {
    let op: Arc<dyn ValueOperator> = match primitive {
        PrimitiveType::String => Arc::new(StringOperator::new()),
        PrimitiveType::Binary => Arc::new(BinaryOperator::new()),
        other => Arc::new(FixedWidthOperator::new(other, config.float_magnitude_limit)?),
    };
    Ok(op)
}
