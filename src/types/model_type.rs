use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Serialize, Serializer};

use super::{RawType, Reified, TypeDescriptor};

/// A [`TypeDescriptor`] tagged with the Rust type it stands for.
///
/// `T` is a compile-time marker only; equality, hashing and rendering look
/// at the descriptor alone. The marker is `PhantomData<fn() -> T>`, so a
/// `ModelType<T>` is `Send + Sync` whatever `T` is.
pub struct ModelType<T> {
    descriptor: TypeDescriptor,
    marker: PhantomData<fn() -> T>,
}

impl<T: Reified> ModelType<T> {
    /// The fully parameterized type of `T`.
    pub fn of() -> Self {
        Self::new_unchecked(T::descriptor())
    }

    /// Accepts `descriptor` when it describes `T` fully or in raw form, and
    /// hands it back otherwise.
    pub fn try_from_descriptor(descriptor: TypeDescriptor) -> Result<Self, TypeDescriptor> {
        let expected = T::descriptor();
        if descriptor == expected || descriptor == expected.raw_type() {
            Ok(Self::new_unchecked(descriptor))
        } else {
            Err(descriptor)
        }
    }
}

impl<T> ModelType<T> {
    /// The raw (unparameterized) type named by `raw`.
    pub fn of_raw(raw: RawType<T>) -> Self {
        Self::new_unchecked(raw.descriptor())
    }

    fn new_unchecked(descriptor: TypeDescriptor) -> Self {
        Self {
            descriptor,
            marker: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn into_descriptor(self) -> TypeDescriptor {
        self.descriptor
    }

    pub fn is_assignable_from<U>(&self, other: &ModelType<U>) -> bool {
        self.descriptor.is_assignable_from(&other.descriptor)
    }
}

impl<T> Clone for ModelType<T> {
    fn clone(&self) -> Self {
        Self::new_unchecked(self.descriptor.clone())
    }
}

impl<T> PartialEq for ModelType<T> {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor == other.descriptor
    }
}

impl<T> Eq for ModelType<T> {}

impl<T> Hash for ModelType<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.descriptor.hash(state);
    }
}

impl<T> fmt::Debug for ModelType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelType({})", self.descriptor)
    }
}

impl<T> fmt::Display for ModelType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptor)
    }
}

impl<T> Serialize for ModelType<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.descriptor.serialize(serializer)
    }
}
