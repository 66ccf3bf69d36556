//! Eager execution of compiled plans
//!
//! # Module Organization
//!
//! - [`graph`] - Class-to-class adaptation, rule by rule
//! - [`collection`] - Element-wise adaptation of sequences
//! - [`depth`] - Recursion counters for depth-limited pairs
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod collection;
pub mod depth;
pub mod graph;


pub use collection::CollectionMapper;
pub use depth::DepthTracker;
pub use graph::GraphMapper;

use crate::plan::{Adapter, PlanCompiler};
use crate::value::Value;
use crate::{Error, Result};

/// Outcome of adapting one value
#[derive(Debug, Clone, PartialEq)]
pub enum Adapted {
    Value(Value),
    /// Dropped by a depth limit; the owning member is left untouched
    Truncated,
}

impl Adapted {
    /// The adapted value, with truncation read as null
    pub fn into_value(self) -> Value {
        match self {
            Adapted::Value(value) => value,
            Adapted::Truncated => Value::Null,
        }
    }
}

/// Run a top-level adapter on `value`
pub fn adapt_value(compiler: &PlanCompiler, adapter: &Adapter, value: &Value, depth: DepthTracker) -> Result<Adapted> {
    match adapter {
        Adapter::Object(plan) => match value {
            Value::Null => Ok(Adapted::Value(Value::Null)),
            Value::Object(source) => GraphMapper::new(compiler).adapt(plan, source, None, true, depth),
            other => Err(Error::conversion(
                other.type_name(),
                plan.key.dest.to_string(),
                other.to_string(),
            )),
        },
        Adapter::Collection(plan) => CollectionMapper::new(compiler).adapt(plan, value, depth),
        Adapter::Scalar { dest, converter } => {
            let value = match converter {
                Some(converter) => converter.convert(value)?,
                None => value.clone(),
            };
            if !compiler.registry().accepts(dest, &value) {
                return Err(Error::conversion(value.type_name(), dest.to_string(), value.to_string()));
            }
            Ok(Adapted::Value(value))
        }
    }
}
