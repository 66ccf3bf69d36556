//! Collection mapper
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::depth::DepthTracker;
use super::graph::GraphMapper;
use super::{adapt_value, Adapted};
use crate::model::collection_value;
use crate::plan::{CollectionPlan, ElementRule, PlanCompiler};
use crate::value::Value;
use crate::{Error, Result};

/// Adapts sequences element by element, preserving order
pub struct CollectionMapper<'c> {
    compiler: &'c PlanCompiler,
}

impl<'c> CollectionMapper<'c> {
    pub fn new(compiler: &'c PlanCompiler) -> Self {
        Self { compiler }
    }

    /// Build the destination collection
    ///
    /// When any element is truncated by a depth limit the whole collection
    /// is reported as truncated.
    pub fn adapt(&self, plan: &CollectionPlan, source: &Value, depth: DepthTracker) -> Result<Adapted> {
        if source.is_null() {
            return Ok(Adapted::Value(Value::Null));
        }
        let items = source
            .elements()
            .ok_or_else(|| Error::conversion(source.type_name(), plan.dest.to_string(), source.to_string()))?;

        let mut adapted = Vec::with_capacity(items.len());
        for item in items {
            match self.element(&plan.element, item, &depth)? {
                Adapted::Value(value) => adapted.push(value),
                Adapted::Truncated => return Ok(Adapted::Truncated),
            }
        }
        Ok(Adapted::Value(collection_value(plan.shape, adapted)))
    }

    fn element(&self, rule: &ElementRule, item: &Value, depth: &DepthTracker) -> Result<Adapted> {
        if item.is_null() {
            return Ok(Adapted::Value(Value::Null));
        }
        match rule {
            ElementRule::Identity => Ok(Adapted::Value(item.clone())),
            ElementRule::Scalar { converter } => Ok(Adapted::Value(converter.convert(item)?)),
            ElementRule::Object(plan) => match item {
                Value::Object(obj) => {
                    let plan = plan.resolve(self.compiler)?;
                    GraphMapper::new(self.compiler).adapt(&plan, obj, None, true, depth.clone())
                }
                other => Err(Error::conversion(
                    other.type_name(),
                    plan.key().dest.to_string(),
                    other.to_string(),
                )),
            },
            ElementRule::Collection(inner) => self.adapt(inner, item, depth.clone()),
            ElementRule::Dynamic { dest } => {
                let runtime = self.compiler.registry().type_of(item);
                let adapter = self.compiler.adapter(&runtime, dest)?;
                adapt_value(self.compiler, &adapter, item, depth.clone())
            }
        }
    }
}
