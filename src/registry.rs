//! The model graph: a hierarchical, type-tagged registry keyed by path.
//!
//! Every node records the [`TypeDescriptor`] it was registered with. Reads go
//! through a [`ModelReference`], and the registry checks the reference's type
//! against the node's before handing anything out, then downcasts through
//! `Any` so a descriptor collision between two Rust types still surfaces as a
//! `TypeMismatch` rather than a bad cast.
//!
//! Nodes live in a persistent `im::OrdMap`, so [`ModelRegistry::snapshot`] is
//! a cheap structural clone that concurrent readers can own outright.
//!
//! # Registration rules
//! | Condition                          | Error            |
//! |------------------------------------|------------------|
//! | path is the root                   | `InvalidArgument`|
//! | parent (other than root) is absent | `MissingParent`  |
//! | path already holds a node          | `DuplicatePath`  |

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use im::OrdMap;

use crate::errors::{ModelError, Result};
use crate::path::ModelPath;
use crate::reference::{ModelReference, UntypedReference};
use crate::types::TypeDescriptor;

// ============================================================================
// MODEL NODE
// ============================================================================

#[derive(Clone)]
struct NodeValue {
    rust_type: &'static str,
    data: Arc<dyn Any + Send + Sync>,
}

/// A single element of the model graph.
///
/// A node registered from code carries a value. A node declared from a
/// manifest carries only its type.
#[derive(Clone)]
pub struct ModelNode {
    descriptor: TypeDescriptor,
    value: Option<NodeValue>,
}

impl ModelNode {
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn is_bound(&self) -> bool {
        self.value.is_some()
    }

    /// The Rust type name of the stored value, if any.
    pub fn rust_type(&self) -> Option<&'static str> {
        self.value.as_ref().map(|v| v.rust_type)
    }
}

impl fmt::Debug for ModelNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelNode")
            .field("descriptor", &self.descriptor.to_string())
            .field("rust_type", &self.rust_type())
            .finish()
    }
}

// ============================================================================
// MODEL REGISTRY
// ============================================================================

#[derive(Clone, Default)]
pub struct ModelRegistry {
    nodes: OrdMap<ModelPath, ModelNode>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` at the reference's path under the reference's type.
    pub fn register<T: Any + Send + Sync>(
        &mut self,
        reference: &ModelReference<T>,
        value: T,
    ) -> Result<()> {
        let node = ModelNode {
            descriptor: reference.ty().descriptor().clone(),
            value: Some(NodeValue {
                rust_type: std::any::type_name::<T>(),
                data: Arc::new(value),
            }),
        };
        self.insert(reference.path(), node)
    }

    /// Declares a typed node with no value.
    pub fn declare(&mut self, reference: &UntypedReference) -> Result<()> {
        let node = ModelNode {
            descriptor: reference.descriptor().clone(),
            value: None,
        };
        self.insert(reference.path(), node)
    }

    fn insert(&mut self, path: &ModelPath, node: ModelNode) -> Result<()> {
        if path.is_root() {
            return Err(ModelError::invalid_argument(
                "the root path cannot hold a model element",
            ));
        }
        if let Some(existing) = self.nodes.get(path) {
            return Err(ModelError::DuplicatePath {
                path: path.clone(),
                existing: format!("an element of type {}", existing.descriptor),
            });
        }
        if let Some(parent) = path.parent() {
            if !parent.is_root() && !self.nodes.contains_key(&parent) {
                return Err(ModelError::MissingParent {
                    path: path.clone(),
                    parent,
                });
            }
        }
        tracing::debug!(path = %path, ty = %node.descriptor, bound = node.is_bound(), "registered model element");
        self.nodes.insert(path.clone(), node);
        Ok(())
    }

    /// Looks up the node at `path` and checks it has exactly `expected`.
    fn node_for(&self, path: &ModelPath, expected: &TypeDescriptor) -> Result<&ModelNode> {
        let node = self
            .nodes
            .get(path)
            .ok_or_else(|| ModelError::NotFound { path: path.clone() })?;
        if &node.descriptor != expected {
            tracing::trace!(path = %path, expected = %expected, actual = %node.descriptor, "type mismatch");
            return Err(ModelError::TypeMismatch {
                path: path.clone(),
                expected: expected.to_string(),
                actual: node.descriptor.to_string(),
            });
        }
        Ok(node)
    }

    fn bound_value<T>(&self, reference: &ModelReference<T>) -> Result<&NodeValue> {
        let node = self.node_for(reference.path(), reference.ty().descriptor())?;
        node.value.as_ref().ok_or_else(|| ModelError::Unbound {
            reference: reference.to_string(),
        })
    }

    /// Reads the value addressed by `reference`.
    pub fn get<T: Any>(&self, reference: &ModelReference<T>) -> Result<&T> {
        let value = self.bound_value(reference)?;
        (*value.data)
            .downcast_ref::<T>()
            .ok_or_else(|| ModelError::TypeMismatch {
                path: reference.path().clone(),
                expected: std::any::type_name::<T>().to_string(),
                actual: value.rust_type.to_string(),
            })
    }

    /// Like [`ModelRegistry::get`], returning shared ownership of the value.
    pub fn get_shared<T: Any + Send + Sync>(&self, reference: &ModelReference<T>) -> Result<Arc<T>> {
        let value = self.bound_value(reference)?;
        Arc::clone(&value.data)
            .downcast::<T>()
            .map_err(|_| ModelError::TypeMismatch {
                path: reference.path().clone(),
                expected: std::any::type_name::<T>().to_string(),
                actual: value.rust_type.to_string(),
            })
    }

    /// Resolves a reference by exact type.
    pub fn resolve(&self, reference: &UntypedReference) -> Result<&ModelNode> {
        self.node_for(reference.path(), reference.descriptor())
    }

    /// Resolves a reference, accepting any node whose type is assignable to
    /// the requested one (`Vec` accepts `Vec<String>`, `?` accepts anything).
    pub fn resolve_assignable(&self, reference: &UntypedReference) -> Result<&ModelNode> {
        let path = reference.path();
        let node = self
            .nodes
            .get(path)
            .ok_or_else(|| ModelError::NotFound { path: path.clone() })?;
        if !reference.descriptor().is_assignable_from(&node.descriptor) {
            return Err(ModelError::TypeMismatch {
                path: path.clone(),
                expected: format!("a type assignable to {}", reference.descriptor()),
                actual: node.descriptor.to_string(),
            });
        }
        Ok(node)
    }

    /// True if a node exists at the reference's path with exactly its type.
    pub fn contains(&self, reference: &UntypedReference) -> bool {
        self.nodes
            .get(reference.path())
            .is_some_and(|node| &node.descriptor == reference.descriptor())
    }

    pub fn contains_path(&self, path: &ModelPath) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn find(&self, path: &ModelPath) -> Option<&ModelNode> {
        self.nodes.get(path)
    }

    /// Direct children of `path`, in path order.
    pub fn children<'a>(
        &'a self,
        path: &'a ModelPath,
    ) -> impl Iterator<Item = (&'a ModelPath, &'a ModelNode)> + 'a {
        self.subtree(path)
            .filter(move |(candidate, _)| candidate.is_direct_child_of(path))
    }

    // Descendants are contiguous after `path` in segment order.
    fn subtree<'a>(
        &'a self,
        path: &'a ModelPath,
    ) -> impl Iterator<Item = (&'a ModelPath, &'a ModelNode)> + 'a {
        self.nodes
            .range(path.clone()..)
            .skip_while(move |(candidate, _)| *candidate == path)
            .take_while(move |(candidate, _)| candidate.is_descendant_of(path))
    }

    /// Removes the node at `path` together with everything below it.
    /// Returns the number of nodes removed.
    pub fn remove(&mut self, path: &ModelPath) -> Result<usize> {
        if !self.nodes.contains_key(path) {
            return Err(ModelError::NotFound { path: path.clone() });
        }
        let mut doomed: Vec<ModelPath> = self.subtree(path).map(|(p, _)| p.clone()).collect();
        doomed.push(path.clone());
        for p in &doomed {
            self.nodes.remove(p);
        }
        tracing::debug!(path = %path, removed = doomed.len(), "removed model subtree");
        Ok(doomed.len())
    }

    /// Every node as a reference, in path order.
    pub fn references(&self) -> impl Iterator<Item = UntypedReference> + '_ {
        self.nodes
            .iter()
            .map(|(path, node)| UntypedReference::new(path.clone(), node.descriptor.clone()))
    }

    /// A cheap, independent copy of the current graph.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.nodes
                    .iter()
                    .map(|(path, node)| (path.to_string(), node.descriptor.to_string())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::types::{ModelType, RawType};

    fn reference<T: crate::types::Reified>(path: &str) -> ModelReference<T> {
        ModelReference::of(path).unwrap()
    }

    fn untyped(path: &str, ty: &str) -> UntypedReference {
        UntypedReference::parse(path, ty).unwrap()
    }

    #[test]
    fn register_then_get() {
        let mut registry = ModelRegistry::new();
        let tasks = reference::<Vec<String>>("tasks");
        registry.register(&tasks, vec!["compile".to_string()]).unwrap();
        assert_eq!(registry.get(&tasks).unwrap(), &vec!["compile".to_string()]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn get_checks_type_at_the_boundary() {
        let mut registry = ModelRegistry::new();
        registry.register(&reference::<String>("name"), "app".to_string()).unwrap();

        let err = registry.get(&reference::<i32>("name")).unwrap_err();
        match err {
            ModelError::TypeMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, "i32");
                assert_eq!(actual, "String");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            registry.get(&reference::<String>("missing")).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn descriptor_collision_is_caught_by_downcast() {
        let mut registry = ModelRegistry::new();
        let as_u8 = ModelReference::of_raw("value", RawType::<u8>::named("Number").unwrap()).unwrap();
        let as_u16 = ModelReference::of_raw("value", RawType::<u16>::named("Number").unwrap()).unwrap();
        registry.register(&as_u8, 7u8).unwrap();

        assert_eq!(registry.get(&as_u8).unwrap(), &7);
        let err = registry.get(&as_u16).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(err.to_string().contains("u8"), "{err}");
        assert_eq!(registry.get_shared(&as_u16).unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn raw_and_parameterized_are_distinct_keys() {
        let mut registry = ModelRegistry::new();
        let full = reference::<Vec<String>>("items");
        registry.register(&full, vec![]).unwrap();

        let raw = ModelReference::of_raw("items", RawType::<Vec<String>>::of()).unwrap();
        assert_eq!(registry.get(&raw).unwrap_err().kind(), ErrorKind::TypeMismatch);
        assert!(registry.resolve_assignable(&raw.erase()).is_ok());
        assert!(!registry.contains(&raw.erase()));
        assert!(registry.contains(&full.erase()));
    }

    #[test]
    fn registration_rules() {
        let mut registry = ModelRegistry::new();
        let root = ModelReference::new(ModelPath::root(), ModelType::<String>::of());
        assert_eq!(
            registry.register(&root, String::new()).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );

        let orphan = reference::<String>("tasks.compile");
        match registry.register(&orphan, String::new()).unwrap_err() {
            ModelError::MissingParent { parent, .. } => assert_eq!(parent.to_string(), "tasks"),
            other => panic!("unexpected error: {other:?}"),
        }

        registry.declare(&untyped("tasks", "Tasks")).unwrap();
        registry.register(&orphan, "javac".to_string()).unwrap();
        assert_eq!(
            registry.register(&orphan, String::new()).unwrap_err().kind(),
            ErrorKind::DuplicatePath
        );
        assert_eq!(registry.get(&orphan).unwrap(), "javac");
    }

    #[test]
    fn declared_nodes_are_unbound() {
        let mut registry = ModelRegistry::new();
        registry.declare(&untyped("name", "String")).unwrap();
        let err = registry.get(&reference::<String>("name")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unbound);
        assert!(registry.resolve(&untyped("name", "String")).is_ok());
        assert!(!registry.find(&ModelPath::parse("name").unwrap()).unwrap().is_bound());
    }

    #[test]
    fn children_are_direct_and_ordered() {
        let mut registry = ModelRegistry::new();
        for (path, ty) in [
            ("a", "A"),
            ("a.y", "Y"),
            ("a.x", "X"),
            ("a.x.deep", "D"),
            ("a-b", "AB"),
            ("b", "B"),
        ] {
            registry.declare(&untyped(path, ty)).unwrap();
        }
        let a = ModelPath::parse("a").unwrap();
        let children: Vec<String> = registry.children(&a).map(|(p, _)| p.to_string()).collect();
        assert_eq!(children, ["a.x", "a.y"]);

        let root = ModelPath::root();
        let top: Vec<String> = registry.children(&root).map(|(p, _)| p.to_string()).collect();
        assert_eq!(top, ["a", "a-b", "b"]);
    }

    #[test]
    fn remove_prunes_subtree() {
        let mut registry = ModelRegistry::new();
        for path in ["a", "a.x", "a.x.deep", "b"] {
            registry.declare(&untyped(path, "Node")).unwrap();
        }
        assert_eq!(registry.remove(&ModelPath::parse("a").unwrap()).unwrap(), 3);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.remove(&ModelPath::parse("a").unwrap()).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn snapshot_is_independent() {
        let mut registry = ModelRegistry::new();
        registry.register(&reference::<i32>("count"), 1).unwrap();
        let snapshot = registry.snapshot();
        registry.register(&reference::<i32>("other"), 2).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(*snapshot.get_shared(&reference::<i32>("count")).unwrap(), 1);
    }

    #[test]
    fn references_lists_every_node() {
        let mut registry = ModelRegistry::new();
        registry.declare(&untyped("b", "B")).unwrap();
        registry.declare(&untyped("a", "Vec<A>")).unwrap();
        let refs: Vec<UntypedReference> = registry.references().collect();
        assert_eq!(refs, vec![untyped("a", "Vec<A>"), untyped("b", "B")]);
    }
}
