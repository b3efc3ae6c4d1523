//! Modelgraph error handling.
//!
//! Every fallible operation in the crate returns [`ModelError`]. Errors are
//! `miette` diagnostics so the CLI can render them with codes, help text and,
//! for type-parse failures, a labeled span pointing at the offending input.
//!
//! Errors raised by a collaborator (path parsing, type parsing) propagate
//! unchanged through the reference constructors that delegate to them.

use std::path::PathBuf;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::path::ModelPath;

/// Crate-wide result alias.
pub type Result<T, E = ModelError> = std::result::Result<T, E>;

/// Type-safe classification of [`ModelError`] variants, for tests and
/// callers that branch on the failure without matching fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidPath,
    InvalidType,
    NotFound,
    TypeMismatch,
    Unbound,
    DuplicatePath,
    MissingParent,
    Io,
    Manifest,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::InvalidPath => "InvalidPath",
            ErrorKind::InvalidType => "InvalidType",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::Unbound => "Unbound",
            ErrorKind::DuplicatePath => "DuplicatePath",
            ErrorKind::MissingParent => "MissingParent",
            ErrorKind::Io => "Io",
            ErrorKind::Manifest => "Manifest",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unified error type for all modelgraph failure modes.
#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    /// A required argument was absent. Always an input or programming error.
    #[error("Invalid argument: {message}")]
    #[diagnostic(code(modelgraph::invalid_argument))]
    InvalidArgument { message: String },

    #[error("Invalid model path '{path}': {reason}")]
    #[diagnostic(
        code(modelgraph::invalid_path),
        help("segments are separated by '.', start with an ASCII letter or '_', and contain only letters, digits, '_' or '-'")
    )]
    InvalidPath { path: String, reason: String },

    #[error("Invalid type '{text}': {reason}")]
    #[diagnostic(
        code(modelgraph::invalid_type),
        help("types look like `Name` or `Name<Arg, ...>`; use `?` for any type")
    )]
    InvalidType {
        #[source_code]
        text: String,
        reason: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("No model element at path '{path}'")]
    #[diagnostic(code(modelgraph::not_found))]
    NotFound { path: ModelPath },

    #[error("Type mismatch at '{path}': expected {expected}, found {actual}")]
    #[diagnostic(code(modelgraph::type_mismatch))]
    TypeMismatch {
        path: ModelPath,
        expected: String,
        actual: String,
    },

    #[error("Model element {reference} is declared but has no value")]
    #[diagnostic(
        code(modelgraph::unbound),
        help("declared elements carry a type only; register a value before reading it")
    )]
    Unbound { reference: String },

    #[error("Cannot register at '{path}': already occupied by {existing}")]
    #[diagnostic(code(modelgraph::duplicate_path))]
    DuplicatePath { path: ModelPath, existing: String },

    #[error("Cannot register '{path}': parent '{parent}' does not exist")]
    #[diagnostic(
        code(modelgraph::missing_parent),
        help("register parent elements before their children")
    )]
    MissingParent { path: ModelPath, parent: ModelPath },

    #[error("I/O failure on '{}'", .path.display())]
    #[diagnostic(code(modelgraph::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed manifest '{name}': {message}")]
    #[diagnostic(code(modelgraph::manifest))]
    Manifest { name: String, message: String },
}

impl ModelError {
    /// Returns the type-safe classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            ModelError::InvalidPath { .. } => ErrorKind::InvalidPath,
            ModelError::InvalidType { .. } => ErrorKind::InvalidType,
            ModelError::NotFound { .. } => ErrorKind::NotFound,
            ModelError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            ModelError::Unbound { .. } => ErrorKind::Unbound,
            ModelError::DuplicatePath { .. } => ErrorKind::DuplicatePath,
            ModelError::MissingParent { .. } => ErrorKind::MissingParent,
            ModelError::Io { .. } => ErrorKind::Io,
            ModelError::Manifest { .. } => ErrorKind::Manifest,
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        ModelError::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_type(
        text: impl Into<String>,
        reason: impl Into<String>,
        span: impl Into<SourceSpan>,
    ) -> Self {
        ModelError::InvalidType {
            text: text.into(),
            reason: reason.into(),
            span: span.into(),
        }
    }
}

/// Prints a `ModelError` with full miette diagnostics to stderr.
pub fn print_error(error: ModelError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}
