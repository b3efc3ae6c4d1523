//! Reified type descriptors.
//!
//! - [`TypeDescriptor`]: the untyped type tree, with parsing and
//!   assignability.
//! - [`Reified`]: maps a Rust type to its full descriptor.
//! - [`RawType`]: a raw, unparameterized type token.
//! - [`ModelType`]: a descriptor tagged with the Rust type it stands for.

mod descriptor;
mod model_type;
mod reified;

pub use descriptor::{is_type_name, validate_type_name, TypeDescriptor, MAX_NESTING};
pub use model_type::ModelType;
pub use reified::{RawType, Reified};

#[doc(hidden)]
pub use reified::__private;
