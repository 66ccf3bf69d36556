//! Scalar converter resolution
//!
//! [`resolve`] decides, once per member at compile time, how a source
//! scalar becomes a destination scalar. The returned [`ScalarConverter`] is
//! stored in the plan and reused for every call.
//!
//! # Examples
//!
//! ```
//! use shapeshift_core::convert::{resolve, Resolution};
//! use shapeshift_core::model::{TypeRegistry, TypeRef, ScalarKind};
//! use shapeshift_core::Value;
//!
//! let registry = TypeRegistry::new();
//! let to_text = resolve(
//!     &TypeRef::scalar(ScalarKind::I32),
//!     &TypeRef::scalar(ScalarKind::String),
//!     &registry,
//! );
//!
//! if let Resolution::Convert(converter) = to_text {
//!     assert_eq!(converter.convert(&Value::I32(42)).unwrap(), Value::from("42"));
//! }
//! ```
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod built_in;

#[cfg(test)]
mod tests;

pub use built_in::{convert_enum, convert_scalar};
pub(crate) use built_in::narrow;

use crate::model::{ScalarKind, TypeRef, TypeRegistry};
use crate::value::Value;
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;

type ConvertFn = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// A resolved scalar conversion
#[derive(Clone)]
pub struct ScalarConverter {
    source: TypeRef,
    target: TypeRef,
    func: ConvertFn,
}

impl ScalarConverter {
    fn new<F>(source: &TypeRef, target: &TypeRef, func: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            source: source.clone(),
            target: target.clone(),
            func: Arc::new(func),
        }
    }

    pub fn convert(&self, value: &Value) -> Result<Value> {
        (self.func)(value)
    }

    pub fn source(&self) -> &TypeRef {
        &self.source
    }

    pub fn target(&self) -> &TypeRef {
        &self.target
    }
}

impl fmt::Debug for ScalarConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScalarConverter({} -> {})", self.source, self.target)
    }
}

impl fmt::Display for ScalarConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Outcome of converter resolution
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Same type after stripping optional wrappers
    Identity,
    Convert(ScalarConverter),
    /// No converter exists; any failure is deferred to execution
    Unsupported,
}

impl Resolution {
    pub fn converter(self) -> Option<ScalarConverter> {
        match self {
            Resolution::Convert(converter) => Some(converter),
            _ => None,
        }
    }
}

/// Resolve the conversion from `source` to `dest`
pub fn resolve(source: &TypeRef, dest: &TypeRef, registry: &TypeRegistry) -> Resolution {
    let src = source.strip_optional();
    let dst = dest.strip_optional();

    if src == dst {
        return Resolution::Identity;
    }

    let src_enum = registry.is_enum(src);
    let dst_enum = registry.is_enum(dst);

    match (src, dst) {
        (_, TypeRef::Any) => Resolution::Identity,
        (TypeRef::Scalar(from), TypeRef::Scalar(to)) if !supports(*from, *to) => Resolution::Unsupported,
        (TypeRef::Scalar(_) | TypeRef::Any, TypeRef::Scalar(to)) => scalar_converter(src, dst, *to),
        (TypeRef::Named(_), TypeRef::Scalar(to)) if src_enum && (to.is_numeric() || *to == ScalarKind::String) => {
            scalar_converter(src, dst, *to)
        }
        (TypeRef::Scalar(from), TypeRef::Named(name))
            if dst_enum && (from.is_integer() || *from == ScalarKind::String) =>
        {
            enum_converter(src, dst, name, registry)
        }
        (TypeRef::Named(_) | TypeRef::Any, TypeRef::Named(name)) if dst_enum && (src_enum || *src == TypeRef::Any) => {
            enum_converter(src, dst, name, registry)
        }
        _ => Resolution::Unsupported,
    }
}

/// Convert a value of any runtime type to `dest`
///
/// Values already satisfying `dest` pass through unchanged.
pub fn convert_to(value: Value, dest: &TypeRef, registry: &TypeRegistry) -> Result<Value> {
    if value.is_null() || registry.accepts(dest, &value) {
        return Ok(value);
    }
    match resolve(&registry.type_of(&value), dest, registry) {
        Resolution::Convert(converter) => converter.convert(&value),
        _ => Err(Error::conversion(value.type_name(), dest.to_string(), value.to_string())),
    }
}

/// Static support table for scalar-to-scalar conversions
pub fn supports(from: ScalarKind, to: ScalarKind) -> bool {
    let numeric = |k: ScalarKind| k.is_numeric() || k == ScalarKind::Bool;
    match (from, to) {
        _ if from == to => true,
        (_, ScalarKind::String) | (ScalarKind::String, _) => true,
        (a, b) if numeric(a) && numeric(b) => true,
        (ScalarKind::Char, k) | (k, ScalarKind::Char) => k.is_integer(),
        _ => false,
    }
}

fn scalar_converter(src: &TypeRef, dst: &TypeRef, to: ScalarKind) -> Resolution {
    Resolution::Convert(ScalarConverter::new(src, dst, move |value| {
        convert_scalar(value, to)
    }))
}

fn enum_converter(src: &TypeRef, dst: &TypeRef, name: &str, registry: &TypeRegistry) -> Resolution {
    match registry.find_enum(name) {
        Some(descriptor) => Resolution::Convert(ScalarConverter::new(src, dst, move |value| {
            convert_enum(value, &descriptor)
        })),
        None => Resolution::Unsupported,
    }
}
