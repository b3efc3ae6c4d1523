//! Typed references into the model graph.
//!
//! A [`ModelReference<T>`] names *where* a value lives ([`ModelPath`]) and
//! *what* type it must have there ([`ModelType<T>`]). It is an immutable value
//! object: two references are equal exactly when both their paths and their
//! types are equal, and hashing agrees with equality, so references can be
//! used directly as map keys and cached across registry operations.
//!
//! Equality only exists between references of the same kind. A
//! `ModelReference<String>` cannot be compared with a `ModelReference<i32>`
//! or with an [`UntypedReference`]; the compiler rejects it, even where the
//! printed forms would coincide.
//!
//! [`ReferenceSpec`] is the serialized form used by manifests. It is the only
//! place a field can be absent, and conversion rejects that with
//! `InvalidArgument` before any parsing happens.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::errors::{ModelError, Result};
use crate::path::ModelPath;
use crate::types::{ModelType, RawType, Reified, TypeDescriptor};

// ============================================================================
// TYPED REFERENCE
// ============================================================================

#[derive(Serialize)]
#[serde(bound(serialize = ""))]
pub struct ModelReference<T> {
    path: ModelPath,
    #[serde(rename = "type")]
    ty: ModelType<T>,
}

impl<T> ModelReference<T> {
    pub fn new(path: ModelPath, ty: ModelType<T>) -> Self {
        Self { path, ty }
    }

    /// Parses `path_text` and pairs it with `ty`. Path errors are returned
    /// as produced by [`ModelPath::parse`].
    pub fn parse(path_text: &str, ty: ModelType<T>) -> Result<Self> {
        let path = ModelPath::parse(path_text)?;
        Ok(Self::new(path, ty))
    }

    /// For callers holding only a raw type token. The resulting type has no
    /// generic arguments; use [`ModelReference::new`] with a full
    /// [`ModelType`] to address `Vec<String>` rather than `Vec`.
    pub fn of_raw(path_text: &str, raw: RawType<T>) -> Result<Self> {
        Self::parse(path_text, ModelType::of_raw(raw))
    }

    /// Builds a reference from parts that may be missing, failing with
    /// `InvalidArgument` if either is.
    pub fn try_from_parts(path: Option<ModelPath>, ty: Option<ModelType<T>>) -> Result<Self> {
        let path = path.ok_or_else(|| ModelError::invalid_argument("reference path is required"))?;
        let ty = ty.ok_or_else(|| {
            ModelError::invalid_argument(format!("reference type is required for path '{path}'"))
        })?;
        Ok(Self::new(path, ty))
    }

    pub fn path(&self) -> &ModelPath {
        &self.path
    }

    pub fn ty(&self) -> &ModelType<T> {
        &self.ty
    }

    pub fn into_parts(self) -> (ModelPath, ModelType<T>) {
        (self.path, self.ty)
    }

    /// The same key without its Rust type marker.
    pub fn erase(&self) -> UntypedReference {
        UntypedReference::new(self.path.clone(), self.ty.descriptor().clone())
    }
}

impl<T: Reified> ModelReference<T> {
    /// A reference to the fully parameterized type of `T` at `path_text`.
    pub fn of(path_text: &str) -> Result<Self> {
        Self::parse(path_text, ModelType::of())
    }

    /// Converts a manifest entry, checking that its declared type describes
    /// `T` (fully or in raw form).
    pub fn from_spec(spec: ReferenceSpec) -> Result<Self> {
        let untyped = UntypedReference::try_from(spec)?;
        let (path, descriptor) = untyped.into_parts();
        match ModelType::try_from_descriptor(descriptor) {
            Ok(ty) => Ok(Self::new(path, ty)),
            Err(actual) => Err(ModelError::TypeMismatch {
                path,
                expected: T::descriptor().to_string(),
                actual: actual.to_string(),
            }),
        }
    }
}

impl<T> Clone for ModelReference<T> {
    fn clone(&self) -> Self {
        Self::new(self.path.clone(), self.ty.clone())
    }
}

impl<T> PartialEq for ModelReference<T> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.ty == other.ty
    }
}

impl<T> Eq for ModelReference<T> {}

impl<T> Hash for ModelReference<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.ty.hash(state);
    }
}

impl<T> fmt::Debug for ModelReference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelReference")
            .field("path", &self.path)
            .field("type", &self.ty)
            .finish()
    }
}

/// Diagnostic rendering only; not meant to be parsed back.
impl<T> fmt::Display for ModelReference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelReference{{path={}, type={}}}", self.path, self.ty)
    }
}

// ============================================================================
// UNTYPED REFERENCE
// ============================================================================

/// A reference without a Rust type marker, for heterogeneous collections of
/// keys and for references read from manifests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UntypedReference {
    path: ModelPath,
    #[serde(rename = "type")]
    descriptor: TypeDescriptor,
}

impl UntypedReference {
    pub fn new(path: ModelPath, descriptor: TypeDescriptor) -> Self {
        Self { path, descriptor }
    }

    pub fn parse(path_text: &str, type_text: &str) -> Result<Self> {
        let path = ModelPath::parse(path_text)?;
        let descriptor = TypeDescriptor::parse(type_text)?;
        Ok(Self::new(path, descriptor))
    }

    pub fn path(&self) -> &ModelPath {
        &self.path
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn into_parts(self) -> (ModelPath, TypeDescriptor) {
        (self.path, self.descriptor)
    }
}

impl fmt::Display for UntypedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UntypedReference{{path={}, type={}}}",
            self.path, self.descriptor
        )
    }
}

impl<T> From<ModelReference<T>> for UntypedReference {
    fn from(reference: ModelReference<T>) -> Self {
        let (path, ty) = reference.into_parts();
        Self::new(path, ty.into_descriptor())
    }
}

// ============================================================================
// SERIALIZED FORM
// ============================================================================

/// A reference as written in a manifest. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceSpec {
    pub path: Option<String>,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
}

impl ReferenceSpec {
    pub fn new(path: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            type_name: Some(type_name.into()),
        }
    }
}

impl TryFrom<ReferenceSpec> for UntypedReference {
    type Error = ModelError;

    fn try_from(spec: ReferenceSpec) -> Result<Self> {
        let path_text = spec
            .path
            .ok_or_else(|| ModelError::invalid_argument("reference path is required"))?;
        let type_text = spec.type_name.ok_or_else(|| {
            ModelError::invalid_argument(format!(
                "reference type is required for path '{path_text}'"
            ))
        })?;
        Self::parse(&path_text, &type_text)
    }
}

impl From<&UntypedReference> for ReferenceSpec {
    fn from(reference: &UntypedReference) -> Self {
        Self::new(String::from(reference.path.clone()), reference.descriptor.to_string())
    }
}
