//! Bridges Rust types to [`TypeDescriptor`]s.
//!
//! [`Reified`] produces the full descriptor of a type, generic arguments
//! included. [`RawType`] is the weaker token for callers that only know the
//! type constructor.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use super::{is_type_name, validate_type_name, TypeDescriptor};
use crate::errors::Result;
use crate::path::ModelPath;

/// A Rust type with a known, fully parameterized descriptor.
///
/// Implement it for your own types with [`impl_reified!`](crate::impl_reified).
pub trait Reified: 'static {
    fn descriptor() -> TypeDescriptor;
}

/// Implements [`Reified`] for nominal types without type parameters.
///
/// Names are checked at compile time against the type-name grammar
/// ([`is_type_name`](crate::types::is_type_name)), so an explicit name must
/// be a constant string.
///
/// ```rust
/// use modelgraph::impl_reified;
/// use modelgraph::types::{Reified, TypeDescriptor};
///
/// struct Task;
/// struct Artifact;
/// impl_reified!(Task, Artifact => "build::Artifact");
///
/// assert_eq!(Task::descriptor(), TypeDescriptor::raw("Task").unwrap());
/// assert_eq!(Artifact::descriptor().to_string(), "build::Artifact");
/// ```
///
/// ```compile_fail
/// struct Task;
/// modelgraph::impl_reified!(Task => "not a type");
/// ```
#[macro_export]
macro_rules! impl_reified {
    () => {};
    ($ty:ident => $name:expr $(, $($rest:tt)*)?) => {
        impl $crate::types::Reified for $ty {
            fn descriptor() -> $crate::types::TypeDescriptor {
                const NAME: &str = $crate::types::__private::checked_name($name);
                $crate::types::__private::raw(NAME)
            }
        }
        $($crate::impl_reified!($($rest)*);)?
    };
    ($ty:ident $(, $($rest:tt)*)?) => {
        $crate::impl_reified!($ty => stringify!($ty) $(, $($rest)*)?);
    };
}

#[doc(hidden)]
pub mod __private {
    use crate::types::{is_type_name, TypeDescriptor};

    pub const fn checked_name(name: &'static str) -> &'static str {
        assert!(is_type_name(name), "impl_reified!: not a valid type name");
        name
    }

    /// Only called with names that went through `checked_name` in a const.
    pub fn raw(name: &'static str) -> TypeDescriptor {
        TypeDescriptor::named_unchecked(name.to_string(), Vec::new())
    }
}

macro_rules! reified_primitives {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reified for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::named_unchecked(stringify!($ty).to_string(), Vec::new())
                }
            }
        )*
    };
}

reified_primitives!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
);

impl Reified for () {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::named_unchecked("()".to_string(), Vec::new())
    }
}

impl Reified for ModelPath {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::named_unchecked("ModelPath".to_string(), Vec::new())
    }
}

macro_rules! reified_containers {
    ($($name:literal => $ty:ident<$($param:ident),+>),* $(,)?) => {
        $(
            impl<$($param: Reified),+> Reified for $ty<$($param),+> {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::named_unchecked($name.to_string(), vec![$($param::descriptor()),+])
                }
            }
        )*
    };
}

reified_containers!(
    "Vec" => Vec<T>,
    "Option" => Option<T>,
    "Box" => Box<T>,
    "Rc" => Rc<T>,
    "Arc" => Arc<T>,
    "HashSet" => HashSet<T>,
    "BTreeSet" => BTreeSet<T>,
    "HashMap" => HashMap<K, V>,
    "BTreeMap" => BTreeMap<K, V>,
);

/// An unparameterized type token.
///
/// A raw token names only the type constructor: `RawType::<Vec<String>>::of()`
/// and `RawType::<Vec<u8>>::of()` both name `Vec`.
pub struct RawType<T> {
    name: Cow<'static, str>,
    marker: PhantomData<fn() -> T>,
}

impl<T> RawType<T> {
    /// Derives the name from `std::any::type_name`, without module path or
    /// generic arguments. Types with no nominal name get a placeholder:
    /// tuples are `Tuple`, arrays `Array`, slices `Slice`, function pointers
    /// `Fn`. References and trait objects use the referenced type's name.
    pub fn of() -> Self {
        Self::unchecked(raw_name(std::any::type_name::<T>()).into())
    }

    /// A token with an explicit name. Fails with `InvalidType` unless `name`
    /// is a valid type name.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Result<Self> {
        let name = name.into();
        validate_type_name(&name)?;
        Ok(Self::unchecked(name))
    }

    fn unchecked(name: Cow<'static, str>) -> Self {
        Self {
            name,
            marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> TypeDescriptor {
        TypeDescriptor::named_unchecked(self.name.clone().into_owned(), Vec::new())
    }
}

fn raw_name(type_name: &str) -> String {
    let mut rest = type_name.trim();
    loop {
        let stripped = if let Some(r) = rest.strip_prefix('&') {
            r
        } else if let Some(r) = rest.strip_prefix("mut ") {
            r
        } else if let Some(r) = rest.strip_prefix("*const ") {
            r
        } else if let Some(r) = rest.strip_prefix("*mut ") {
            r
        } else if let Some(r) = rest.strip_prefix("dyn ") {
            r
        } else if rest.starts_with('\'') {
            // lifetime
            rest.split_once(' ').map_or("", |(_, r)| r)
        } else {
            break;
        };
        rest = stripped.trim_start();
    }
    if rest == "()" {
        return rest.to_string();
    }

    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == ':'))
        .unwrap_or(rest.len());
    let name = rest[..end]
        .rsplit("::")
        .find(|segment| !segment.is_empty())
        .unwrap_or("");
    let is_fn_pointer = name == "fn" && rest[end..].starts_with('(');
    if is_type_name(name) && !is_fn_pointer {
        return name.to_string();
    }

    let placeholder = match rest.chars().next() {
        Some('(') => "Tuple",
        Some('[') if rest.contains(';') => "Array",
        Some('[') => "Slice",
        _ if is_fn_pointer || rest.starts_with("unsafe ") || rest.starts_with("extern ") => "Fn",
        _ => "Unnamed",
    };
    placeholder.to_string()
}

impl<T> Clone for RawType<T> {
    fn clone(&self) -> Self {
        Self::unchecked(self.name.clone())
    }
}

impl<T> PartialEq for RawType<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for RawType<T> {}

impl<T> Hash for RawType<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<T> fmt::Debug for RawType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawType").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containers_carry_arguments() {
        assert_eq!(
            Vec::<Option<String>>::descriptor().to_string(),
            "Vec<Option<String>>"
        );
        assert_eq!(
            HashMap::<String, Vec<u8>>::descriptor().to_string(),
            "HashMap<String, Vec<u8>>"
        );
        assert_eq!(<()>::descriptor().to_string(), "()");
    }

    #[test]
    fn reified_output_reparses() {
        let descriptor = BTreeMap::<ModelPath, Arc<Vec<()>>>::descriptor();
        assert_eq!(
            TypeDescriptor::parse(&descriptor.to_string()).unwrap(),
            descriptor
        );
    }

    #[test]
    fn raw_type_strips_path_and_arguments() {
        assert_eq!(RawType::<Vec<String>>::of().name(), "Vec");
        assert_eq!(RawType::<String>::of().name(), "String");
        assert_eq!(RawType::<i64>::of().name(), "i64");
        assert_eq!(
            RawType::<HashMap<String, i32>>::of().descriptor(),
            HashMap::<String, i32>::descriptor().raw_type()
        );
    }

    #[test]
    fn named_raw_type() {
        let raw = RawType::<u8>::named("Byte").unwrap();
        assert_eq!(raw.descriptor(), TypeDescriptor::raw("Byte").unwrap());
        assert_eq!(raw.clone(), raw);
        assert!(RawType::<u8>::named("a b").is_err());
        assert!(RawType::<u8>::named("Vec<u8>").is_err());
    }

    #[test]
    fn unnamed_types_get_parseable_names() {
        assert_eq!(RawType::<(u8, u8)>::of().name(), "Tuple");
        assert_eq!(RawType::<()>::of().name(), "()");
        assert_eq!(RawType::<&'static str>::of().name(), "str");
        assert_eq!(RawType::<&mut Vec<u8>>::of().name(), "Vec");
        assert_eq!(RawType::<[u8; 4]>::of().name(), "Array");
        assert_eq!(RawType::<&[u8]>::of().name(), "Slice");
        assert_eq!(RawType::<fn(u8) -> u8>::of().name(), "Fn");
        assert_eq!(RawType::<Box<dyn fmt::Debug>>::of().name(), "Box");
        assert_eq!(raw_name("dyn core::fmt::Debug + Send"), "Debug");
        assert_eq!(raw_name("*const u8"), "u8");

        for name in [
            RawType::<(u8, u8)>::of().descriptor(),
            RawType::<&'static str>::of().descriptor(),
            RawType::<fn()>::of().descriptor(),
        ] {
            assert_eq!(TypeDescriptor::parse(&name.to_string()).unwrap(), name);
        }
    }

    struct Task;
    struct Artifact;
    impl_reified!(Task, Artifact => "build::Artifact");

    #[test]
    fn impl_reified_macro() {
        assert_eq!(Task::descriptor(), TypeDescriptor::raw("Task").unwrap());
        assert_eq!(Artifact::descriptor().to_string(), "build::Artifact");
        assert_eq!(
            Vec::<Task>::descriptor(),
            TypeDescriptor::parse("Vec<Task>").unwrap()
        );
    }
}
