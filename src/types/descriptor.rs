//! The untyped, reified type tree.
//!
//! A [`TypeDescriptor`] carries the complete structure of a type, nested
//! generic arguments included, as plain data. Nothing here depends on the
//! host language's generics; two descriptors are equal exactly when their
//! trees are equal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ModelError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeDescriptor {
    /// A nominal type, possibly applied to type arguments.
    Named {
        name: String,
        arguments: Vec<TypeDescriptor>,
    },
    /// Any type. Renders as `?`.
    Wildcard,
}

impl TypeDescriptor {
    /// An unparameterized type. Fails with `InvalidType` unless `name` is a
    /// valid type name (see [`is_type_name`]).
    pub fn raw(name: impl Into<String>) -> Result<Self> {
        Self::parameterized(name, Vec::new())
    }

    pub fn parameterized(name: impl Into<String>, arguments: Vec<TypeDescriptor>) -> Result<Self> {
        let name = name.into();
        validate_type_name(&name)?;
        Ok(Self::named_unchecked(name, arguments))
    }

    pub(crate) fn named_unchecked(name: String, arguments: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Named { name, arguments }
    }

    pub fn wildcard() -> Self {
        TypeDescriptor::Wildcard
    }

    /// Parses the textual form produced by `Display`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = Parser {
            text,
            pos: 0,
            depth: 0,
        };
        let descriptor = parser.parse_type()?;
        parser.skip_whitespace();
        if let Some(ch) = parser.peek() {
            return Err(parser.error_at(
                format!("unexpected trailing input starting at '{ch}'"),
                parser.pos,
                text.len(),
            ));
        }
        Ok(descriptor)
    }

    /// The nominal name, or `None` for a wildcard.
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeDescriptor::Named { name, .. } => Some(name),
            TypeDescriptor::Wildcard => None,
        }
    }

    pub fn arguments(&self) -> &[TypeDescriptor] {
        match self {
            TypeDescriptor::Named { arguments, .. } => arguments,
            TypeDescriptor::Wildcard => &[],
        }
    }

    pub fn is_parameterized(&self) -> bool {
        !self.arguments().is_empty()
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, TypeDescriptor::Wildcard)
    }

    /// This descriptor with its type arguments erased.
    pub fn raw_type(&self) -> Self {
        match self {
            TypeDescriptor::Named { name, .. } => Self::named_unchecked(name.clone(), Vec::new()),
            TypeDescriptor::Wildcard => TypeDescriptor::Wildcard,
        }
    }

    /// Whether a value described by `other` may be used where `self` is
    /// expected.
    ///
    /// A wildcard accepts anything. A raw descriptor accepts any
    /// parameterization of the same name. Otherwise names and argument
    /// counts must match and arguments are checked recursively.
    pub fn is_assignable_from(&self, other: &TypeDescriptor) -> bool {
        match (self, other) {
            (TypeDescriptor::Wildcard, _) => true,
            (TypeDescriptor::Named { .. }, TypeDescriptor::Wildcard) => false,
            (
                TypeDescriptor::Named { name, arguments },
                TypeDescriptor::Named {
                    name: other_name,
                    arguments: other_arguments,
                },
            ) => {
                if name != other_name {
                    return false;
                }
                if arguments.is_empty() {
                    return true;
                }
                arguments.len() == other_arguments.len()
                    && arguments
                        .iter()
                        .zip(other_arguments)
                        .all(|(expected, actual)| expected.is_assignable_from(actual))
            }
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Wildcard => f.write_str("?"),
            TypeDescriptor::Named { name, arguments } => {
                f.write_str(name)?;
                if arguments.is_empty() {
                    return Ok(());
                }
                f.write_str("<")?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                f.write_str(">")
            }
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TypeDescriptor {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TypeDescriptor> for String {
    fn from(descriptor: TypeDescriptor) -> Self {
        descriptor.to_string()
    }
}

// ============================================================================
// TYPE NAMES
// ============================================================================

/// Type arguments may nest at most this deep in parsed text.
pub const MAX_NESTING: usize = 128;

const fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

const fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Whether `name` can stand as a nominal type: `()`, or segments of ASCII
/// letters, digits and `_` (not starting with a digit) joined by `::`.
pub const fn is_type_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.len() == 2 && bytes[0] == b'(' && bytes[1] == b')' {
        return true;
    }
    if bytes.is_empty() {
        return false;
    }
    let mut i = 0;
    let mut segment_start = true;
    while i < bytes.len() {
        let b = bytes[i];
        if segment_start {
            if !is_ident_start(b) {
                return false;
            }
            segment_start = false;
            i += 1;
        } else if is_ident_continue(b) {
            i += 1;
        } else if b == b':' && i + 2 < bytes.len() && bytes[i + 1] == b':' {
            segment_start = true;
            i += 2;
        } else {
            return false;
        }
    }
    true
}

pub fn validate_type_name(name: &str) -> Result<()> {
    if is_type_name(name) {
        return Ok(());
    }
    Err(ModelError::invalid_type(
        name,
        "not a valid type name",
        0..name.len(),
    ))
}

// ============================================================================
// PARSER: type := '?' | '()' | ident ('<' type (',' type)* '>')?
// ============================================================================

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self, ch: char) {
        self.pos += ch.len_utf8();
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.bump(ch);
        }
    }

    fn error_at(&self, reason: String, start: usize, end: usize) -> ModelError {
        ModelError::invalid_type(self.text, reason, start..end)
    }

    fn unexpected(&self, expected: &str) -> ModelError {
        match self.peek() {
            Some(ch) => self.error_at(
                format!("expected {expected}, found '{ch}'"),
                self.pos,
                self.pos + ch.len_utf8(),
            ),
            None => self.error_at(
                format!("expected {expected}, found end of input"),
                self.pos,
                self.pos,
            ),
        }
    }

    fn parse_type(&mut self) -> Result<TypeDescriptor> {
        self.skip_whitespace();
        match self.peek() {
            Some('?') => {
                self.bump('?');
                Ok(TypeDescriptor::Wildcard)
            }
            Some('(') => {
                self.bump('(');
                self.skip_whitespace();
                if self.peek() != Some(')') {
                    return Err(self.unexpected("')'"));
                }
                self.bump(')');
                Ok(TypeDescriptor::named_unchecked("()".to_string(), Vec::new()))
            }
            _ => {
                let name = self.parse_ident()?;
                self.skip_whitespace();
                if self.peek() != Some('<') {
                    return Ok(TypeDescriptor::named_unchecked(name, Vec::new()));
                }
                if self.depth == MAX_NESTING {
                    return Err(self.error_at(
                        format!("type arguments nested deeper than {MAX_NESTING} levels"),
                        self.pos,
                        self.pos + 1,
                    ));
                }
                self.bump('<');
                self.depth += 1;
                let arguments = self.parse_arguments()?;
                self.depth -= 1;
                Ok(TypeDescriptor::named_unchecked(name, arguments))
            }
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<TypeDescriptor>> {
        let mut arguments = Vec::new();
        loop {
            arguments.push(self.parse_type()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.bump(','),
                Some('>') => {
                    self.bump('>');
                    return Ok(arguments);
                }
                _ => return Err(self.unexpected("',' or '>'")),
            }
        }
    }

    /// ident := segment ('::' segment)*, segment := [A-Za-z_][A-Za-z0-9_]*
    fn parse_ident(&mut self) -> Result<String> {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(ch) if ch.is_ascii() && is_ident_start(ch as u8) => self.bump(ch),
                _ => return Err(self.unexpected("a type name")),
            }
            while let Some(ch) = self.peek() {
                if !(ch.is_ascii() && is_ident_continue(ch as u8)) {
                    break;
                }
                self.bump(ch);
            }
            if !self.text[self.pos..].starts_with("::") {
                break;
            }
            self.pos += 2;
        }
        Ok(self.text[start..self.pos].to_string())
    }
}
