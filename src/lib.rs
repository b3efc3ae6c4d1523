//! Typed references into hierarchical, type-tagged model graphs.
//!
//! A [`ModelReference<T>`] pairs a [`ModelPath`] (where a value lives) with a
//! [`ModelType<T>`] (what type it must have). The [`ModelRegistry`] uses
//! references as keys and validates every read against them.
//!
//! ```rust
//! use modelgraph::{ModelReference, ModelRegistry};
//!
//! let mut registry = ModelRegistry::new();
//! let tasks = ModelReference::<Vec<String>>::of("tasks").unwrap();
//! registry.register(&tasks, vec!["compile".to_string()]).unwrap();
//!
//! assert_eq!(registry.get(&tasks).unwrap().len(), 1);
//! assert!(registry.get(&ModelReference::<String>::of("tasks").unwrap()).is_err());
//! ```

pub use crate::errors::{ErrorKind, ModelError, Result};
pub use crate::path::ModelPath;
pub use crate::reference::{ModelReference, ReferenceSpec, UntypedReference};
pub use crate::registry::{ModelNode, ModelRegistry};
pub use crate::types::{ModelType, RawType, Reified, TypeDescriptor};

pub mod cli;
pub mod errors;
pub mod manifest;
pub mod path;
pub mod reference;
pub mod registry;
pub mod types;
