//! Object graph mapper
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::collection::CollectionMapper;
use super::depth::DepthTracker;
use super::Adapted;
use crate::config::MemberResolver;
use crate::convert::{self, ScalarConverter};
use crate::plan::{MappingPlan, MappingRule, PlanCompiler, RuleKind};
use crate::projection::Evaluator;
use crate::value::{ObjectRef, Value};
use crate::{Error, Result};

/// Executes mapping plans against instances
///
/// The first failing rule aborts the whole adaptation.
pub struct GraphMapper<'c> {
    compiler: &'c PlanCompiler,
}

impl<'c> GraphMapper<'c> {
    pub fn new(compiler: &'c PlanCompiler) -> Self {
        Self { compiler }
    }

    /// Adapt `source` with `plan`
    ///
    /// With `existing`, members are written into that instance instead of a
    /// fresh one. Null source members are skipped when the destination is new
    /// or the pair ignores nulls; otherwise they reset the member to its zero.
    pub fn adapt(
        &self,
        plan: &MappingPlan,
        source: &ObjectRef,
        existing: Option<ObjectRef>,
        treat_as_new: bool,
        mut depth: DepthTracker,
    ) -> Result<Adapted> {
        if let Some(limit) = plan.options.max_depth {
            if !depth.enter(plan.depth_key, limit) {
                log::trace!("{} truncated at depth {}", plan.key, limit);
                return Ok(Adapted::Truncated);
            }
        }

        let dest = match existing {
            Some(dest) => dest,
            None => self.compiler.registry().create_instance(plan.dest.name())?,
        };
        let ignore_nulls = treat_as_new || plan.options.ignore_null_values == Some(true);

        for rule in &plan.rules {
            self.apply(rule, source, &dest, ignore_nulls, &depth)?;
        }
        Ok(Adapted::Value(Value::Object(dest)))
    }

    fn apply(
        &self,
        rule: &MappingRule,
        source: &ObjectRef,
        dest: &ObjectRef,
        ignore_nulls: bool,
        depth: &DepthTracker,
    ) -> Result<()> {
        match &rule.kind {
            RuleKind::DirectScalar { getter, converter } => {
                let value = getter.get(source)?;
                self.write_scalar(rule, dest, value, converter.as_ref(), ignore_nulls)
            }
            RuleKind::FlattenMethod { method, converter } => {
                let value = method.call(source)?;
                rule.setter.set(dest, converted(value, converter.as_ref())?)
            }
            RuleKind::FlattenPath { chain, converter } => {
                let mut current = Value::Object(source.clone());
                for hop in chain {
                    current = match current {
                        Value::Object(obj) => hop.get(&obj)?,
                        _ => Value::Null,
                    };
                    if current.is_null() {
                        break;
                    }
                }
                self.write_scalar(rule, dest, current, converter.as_ref(), ignore_nulls)
            }
            RuleKind::NestedAdapter { getter, plan } => match getter.get(source)? {
                Value::Null => self.write_null(rule, dest, ignore_nulls),
                Value::Object(child) => {
                    let plan = plan.resolve(self.compiler)?;
                    match self.adapt(&plan, &child, None, true, depth.clone())? {
                        Adapted::Value(value) => rule.setter.set(dest, value),
                        Adapted::Truncated => Ok(()),
                    }
                }
                other => Err(Error::conversion(
                    other.type_name(),
                    rule.dest_type.to_string(),
                    other.to_string(),
                )),
            },
            RuleKind::CollectionAdapter { getter, plan } => {
                let value = getter.get(source)?;
                if value.is_null() {
                    return self.write_null(rule, dest, ignore_nulls);
                }
                match CollectionMapper::new(self.compiler).adapt(plan, &value, depth.clone())? {
                    Adapted::Value(value) => rule.setter.set(dest, value),
                    Adapted::Truncated => {
                        log::trace!("{} omitted: an element reached the depth limit", rule.member);
                        Ok(())
                    }
                }
            }
            RuleKind::CustomResolver { resolver } => {
                let value = match resolver {
                    MemberResolver::Function(resolve) => resolve(source)?,
                    MemberResolver::Expression(lambda) => {
                        Evaluator::new(self.compiler.registry()).apply(lambda, Value::Object(source.clone()))?
                    }
                };
                let value = convert::convert_to(value, &rule.dest_type, self.compiler.registry())?;
                rule.setter.set(dest, value)
            }
        }
    }

    fn write_scalar(
        &self,
        rule: &MappingRule,
        dest: &ObjectRef,
        value: Value,
        converter: Option<&ScalarConverter>,
        ignore_nulls: bool,
    ) -> Result<()> {
        if value.is_null() {
            return self.write_null(rule, dest, ignore_nulls);
        }
        rule.setter.set(dest, converted(value, converter)?)
    }

    fn write_null(&self, rule: &MappingRule, dest: &ObjectRef, ignore_nulls: bool) -> Result<()> {
        if ignore_nulls {
            return Ok(());
        }
        rule.setter.set(dest, rule.zero.clone())
    }
}

fn converted(value: Value, converter: Option<&ScalarConverter>) -> Result<Value> {
    match converter {
        Some(converter) => converter.convert(&value),
        None => Ok(value),
    }
}
