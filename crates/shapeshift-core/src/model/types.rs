//! Declared types for members, methods and collection elements
//!
//! A [`TypeRef`] is the static shape of a member as declared on its class.
//! Named types are resolved against the [`TypeRegistry`](super::TypeRegistry),
//! which decides whether a name refers to a class or an enum.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Built-in scalar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    String,
    DateTime,
    Uuid,
}

impl ScalarKind {
    /// All kinds in declaration order
    pub const ALL: [ScalarKind; 16] = [
        ScalarKind::Bool,
        ScalarKind::Char,
        ScalarKind::I8,
        ScalarKind::I16,
        ScalarKind::I32,
        ScalarKind::I64,
        ScalarKind::U8,
        ScalarKind::U16,
        ScalarKind::U32,
        ScalarKind::U64,
        ScalarKind::F32,
        ScalarKind::F64,
        ScalarKind::Decimal,
        ScalarKind::String,
        ScalarKind::DateTime,
        ScalarKind::Uuid,
    ];

    /// Canonical text name, as accepted by [`TypeRef::from_str`]
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Char => "char",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Decimal => "decimal",
            ScalarKind::String => "string",
            ScalarKind::DateTime => "datetime",
            ScalarKind::Uuid => "uuid",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" | "boolean" => ScalarKind::Bool,
            "char" => ScalarKind::Char,
            "i8" | "sbyte" => ScalarKind::I8,
            "i16" | "short" => ScalarKind::I16,
            "i32" | "int" => ScalarKind::I32,
            "i64" | "long" => ScalarKind::I64,
            "u8" | "byte" => ScalarKind::U8,
            "u16" | "ushort" => ScalarKind::U16,
            "u32" | "uint" => ScalarKind::U32,
            "u64" | "ulong" => ScalarKind::U64,
            "f32" | "float" => ScalarKind::F32,
            "f64" | "double" => ScalarKind::F64,
            "decimal" => ScalarKind::Decimal,
            "string" => ScalarKind::String,
            "datetime" => ScalarKind::DateTime,
            "uuid" | "guid" => ScalarKind::Uuid,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ScalarKind::I8
                | ScalarKind::I16
                | ScalarKind::I32
                | ScalarKind::I64
                | ScalarKind::U8
                | ScalarKind::U16
                | ScalarKind::U32
                | ScalarKind::U64
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || matches!(self, ScalarKind::F32 | ScalarKind::F64 | ScalarKind::Decimal)
    }

    /// Whether a plain (non-optional) member of this kind may hold null
    pub fn is_nullable(self) -> bool {
        self == ScalarKind::String
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shapes a collection member can be declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionShape {
    /// Fixed-size array, sized to the element count when built
    Array,
    /// Growable list
    List,
    /// Read-only sequence interface
    Iterable,
    /// Collection interface (count + add)
    Collection,
    /// Indexed list interface
    IndexedList,
    /// Legacy untyped collection, elements are `any`
    Bag,
}

impl CollectionShape {
    pub fn name(self) -> &'static str {
        match self {
            CollectionShape::Array => "Array",
            CollectionShape::List => "List",
            CollectionShape::Iterable => "Iterable",
            CollectionShape::Collection => "Collection",
            CollectionShape::IndexedList => "IndexedList",
            CollectionShape::Bag => "Bag",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        let shape = match name {
            "Array" => CollectionShape::Array,
            "List" | "Vec" => CollectionShape::List,
            "Iterable" | "Enumerable" => CollectionShape::Iterable,
            "Collection" => CollectionShape::Collection,
            "IndexedList" => CollectionShape::IndexedList,
            "Bag" => CollectionShape::Bag,
            _ => return None,
        };
        Some(shape)
    }

    /// Interface shapes are satisfied by the growable list representation
    pub fn is_interface(self) -> bool {
        matches!(
            self,
            CollectionShape::Iterable | CollectionShape::Collection | CollectionShape::IndexedList
        )
    }
}

/// How the mapper treats a declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Scalar,
    Collection,
    Class,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Scalar => write!(f, "scalar"),
            Classification::Collection => write!(f, "collection"),
            Classification::Class => write!(f, "class"),
        }
    }
}

/// A declared type
///
/// Serializes as its text form, e.g. `"List<Person>"` or `"uuid?"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TypeRef {
    /// Dynamically typed slot
    Any,
    /// Built-in scalar
    Scalar(ScalarKind),
    /// Registered class or enum
    Named(String),
    /// Nullable wrapper around a scalar or enum
    Optional(Box<TypeRef>),
    /// Collection of elements
    Collection {
        shape: CollectionShape,
        element: Box<TypeRef>,
    },
}

impl TypeRef {
    pub fn scalar(kind: ScalarKind) -> Self {
        TypeRef::Scalar(kind)
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn optional(inner: TypeRef) -> Self {
        match inner {
            already @ TypeRef::Optional(_) => already,
            inner => TypeRef::Optional(Box::new(inner)),
        }
    }

    pub fn collection(shape: CollectionShape, element: TypeRef) -> Self {
        let element = if shape == CollectionShape::Bag { TypeRef::Any } else { element };
        TypeRef::Collection {
            shape,
            element: Box::new(element),
        }
    }

    pub fn list(element: TypeRef) -> Self {
        Self::collection(CollectionShape::List, element)
    }

    pub fn array(element: TypeRef) -> Self {
        Self::collection(CollectionShape::Array, element)
    }

    pub fn bag() -> Self {
        Self::collection(CollectionShape::Bag, TypeRef::Any)
    }

    /// The type with any optional wrapper removed
    pub fn strip_optional(&self) -> &TypeRef {
        match self {
            TypeRef::Optional(inner) => inner.strip_optional(),
            other => other,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeRef::Optional(_))
    }

    /// Element type of a collection
    pub fn element(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Collection { element, .. } => Some(element),
            _ => None,
        }
    }

    pub fn shape(&self) -> Option<CollectionShape> {
        match self {
            TypeRef::Collection { shape, .. } => Some(*shape),
            _ => None,
        }
    }

    /// Scalar kind after stripping optional wrapping
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self.strip_optional() {
            TypeRef::Scalar(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Type name after stripping optional wrapping
    pub fn name(&self) -> Option<&str> {
        match self.strip_optional() {
            TypeRef::Named(name) => Some(name),
            _ => None,
        }
    }
}

// Ordered by text form so listings are stable
impl PartialOrd for TypeRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

impl From<ScalarKind> for TypeRef {
    fn from(kind: ScalarKind) -> Self {
        TypeRef::Scalar(kind)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Any => write!(f, "any"),
            TypeRef::Scalar(kind) => write!(f, "{}", kind),
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::Optional(inner) => write!(f, "{}?", inner),
            TypeRef::Collection { shape: CollectionShape::Bag, .. } => write!(f, "Bag"),
            TypeRef::Collection { shape, element } => write!(f, "{}<{}>", shape.name(), element),
        }
    }
}

impl From<TypeRef> for String {
    fn from(ty: TypeRef) -> Self {
        ty.to_string()
    }
}

impl TryFrom<String> for TypeRef {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl FromStr for TypeRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = TypeParser { input: s, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_whitespace();
        if parser.pos != s.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(ty)
    }
}

/// Recursive-descent parser for the text form of [`TypeRef`]
///
/// ```text
/// type := ident [ '<' type '>' ] { '?' | '[]' }
/// ```
struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn parse_type(&mut self) -> Result<TypeRef> {
        self.skip_whitespace();
        let ident = self.ident()?;
        self.skip_whitespace();

        let mut ty = if self.eat('<') {
            let shape = CollectionShape::from_name(ident)
                .ok_or_else(|| self.error(&format!("'{}' is not a collection shape", ident)))?;
            let element = self.parse_type()?;
            self.skip_whitespace();
            if !self.eat('>') {
                return Err(self.error("expected '>'"));
            }
            TypeRef::collection(shape, element)
        } else if ident == "any" {
            TypeRef::Any
        } else if ident == "Bag" {
            TypeRef::bag()
        } else if let Some(kind) = ScalarKind::from_name(ident) {
            TypeRef::Scalar(kind)
        } else {
            TypeRef::Named(ident.to_string())
        };

        loop {
            self.skip_whitespace();
            if self.eat('?') {
                ty = TypeRef::optional(ty);
            } else if self.rest().starts_with("[]") {
                self.pos += 2;
                ty = TypeRef::array(ty);
            } else {
                break;
            }
        }
        Ok(ty)
    }

    fn ident(&mut self) -> Result<&'a str> {
        let start = self.pos;
        for (offset, ch) in self.rest().char_indices() {
            let valid = if offset == 0 {
                ch.is_alphabetic() || ch == '_'
            } else {
                ch.is_alphanumeric() || ch == '_' || ch == '.'
            };
            if !valid {
                break;
            }
            self.pos = start + offset + ch.len_utf8();
        }
        if self.pos == start {
            return Err(self.error("expected a type name"));
        }
        Ok(&self.input[start..self.pos])
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.rest().starts_with(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn error(&self, message: &str) -> Error {
        Error::format(
            self.input.to_string(),
            format!("type reference ({} at position {})", message, self.pos),
        )
    }
}
