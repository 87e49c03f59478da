use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::error::ModelError;
use super::field_type::FieldType;
use super::primitive::PrimitiveType;

/// Interning registry for field types.
///
/// Owned by the call context (one per process, schema build or test) rather
/// than held in a global. Lookups are idempotent: interning structurally
/// equal types yields the same `Arc`. Schema definitions parse their type
/// strings through it; group references stay unresolved here and are bound
/// to tables by each schema build.
#[derive(Debug, Default)]
pub struct TypeInterner {
    types: RwLock<HashMap<FieldType, Arc<FieldType>>>,
}

impl TypeInterner {
    /// Creates a new empty interner.
    pub fn new() -> Self {
        Self {
            types: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the canonical instance for `field_type`, inserting it if absent.
    ///
    /// Group types are interned by name in unresolved form: binding a group
    /// to a table version belongs to a schema build, not to the interner.
    pub fn intern(&self, field_type: FieldType) -> Arc<FieldType> {
        let field_type = detach(field_type);
        {
            let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = types.get(&field_type) {
                return Arc::clone(existing);
            }
        }

        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            types
                .entry(field_type.clone())
                .or_insert_with(|| Arc::new(field_type)),
        )
    }

    pub fn primitive(&self, primitive: PrimitiveType) -> Arc<FieldType> {
        self.intern(FieldType::Primitive(primitive))
    }

    pub fn group(&self, name: &str) -> Arc<FieldType> {
        self.intern(FieldType::group(name))
    }

    /// Interns a list type over `element`.
    pub fn list(&self, element: FieldType) -> Result<Arc<FieldType>, ModelError> {
        Ok(self.intern(FieldType::list(element)?))
    }

    /// Number of distinct interned types.
    pub fn len(&self) -> usize {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Strips table bindings from group references.
fn detach(field_type: FieldType) -> FieldType {
    match field_type {
        FieldType::Group(group) if group.is_resolved() => FieldType::group(group.name()),
        FieldType::Collection { kind, element } if element.referenced_group().is_some() => {
            FieldType::Collection {
                kind,
                element: Arc::new(detach(FieldType::clone(&element))),
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, Table};

    #[test]
    fn test_intern_is_idempotent() {
        let interner = TypeInterner::new();
        let a = interner.primitive(PrimitiveType::Int32);
        let b = interner.intern(FieldType::primitive(PrimitiveType::Int32));
        assert!(Arc::ptr_eq(&a, &b));

        let l1 = interner
            .list(FieldType::primitive(PrimitiveType::String))
            .unwrap();
        let l2 = interner
            .list(FieldType::primitive(PrimitiveType::String))
            .unwrap();
        assert!(Arc::ptr_eq(&l1, &l2));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_groups_interned_unresolved() {
        let interner = TypeInterner::new();
        let table = Arc::new(
            Table::new(
                "Address",
                1,
                vec![Field::required(1, "zip", PrimitiveType::Int32).unwrap()],
            )
            .unwrap(),
        );
        let resolved = interner.intern(FieldType::resolved_group(Arc::clone(&table)));
        assert!(!resolved.as_group().unwrap().is_resolved());
        assert!(Arc::ptr_eq(&resolved, &interner.group("Address")));

        let list = interner
            .list(FieldType::resolved_group(table))
            .unwrap();
        assert!(!list.referenced_group().unwrap().is_resolved());
        assert!(Arc::ptr_eq(
            &list,
            &interner.list(FieldType::group("Address")).unwrap()
        ));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_concurrent_interning() {
        let interner = Arc::new(TypeInterner::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let interner = Arc::clone(&interner);
                std::thread::spawn(move || {
                    PrimitiveType::ALL
                        .iter()
                        .map(|p| interner.primitive(*p))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let results: Vec<Vec<Arc<FieldType>>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        for other in &results[1..] {
            for (a, b) in results[0].iter().zip(other) {
                assert!(Arc::ptr_eq(a, b));
            }
        }
        assert_eq!(interner.len(), PrimitiveType::ALL.len());
    }
}
