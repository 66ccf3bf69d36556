//! Mapping plan types
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::PlanCompiler;
use crate::config::{MemberResolver, PairKey};
use crate::convert::ScalarConverter;
use crate::model::{Accessor, ClassDescriptor, CollectionShape, MethodDescriptor, TypeRef};
use crate::value::Value;
use crate::Result;
use serde::Serialize;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, OnceLock};

/// How one destination member is produced
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Same-named scalar, optionally converted; also used for alias copies
    DirectScalar {
        getter: Arc<Accessor>,
        converter: Option<ScalarConverter>,
    },
    /// `Get<Member>()` on the source
    FlattenMethod {
        method: Arc<MethodDescriptor>,
        converter: Option<ScalarConverter>,
    },
    /// Chain of nested source members
    FlattenPath {
        chain: Vec<Arc<Accessor>>,
        converter: Option<ScalarConverter>,
    },
    /// Recursive adaptation through the child pair's plan
    NestedAdapter { getter: Arc<Accessor>, plan: PlanRef },
    /// Element-wise adaptation of a collection
    CollectionAdapter {
        getter: Arc<Accessor>,
        plan: Arc<CollectionPlan>,
    },
    /// Configured resolver, called unconditionally
    CustomResolver { resolver: MemberResolver },
}

impl RuleKind {
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::DirectScalar { .. } => "direct",
            RuleKind::FlattenMethod { .. } => "flatten_method",
            RuleKind::FlattenPath { .. } => "flatten_path",
            RuleKind::NestedAdapter { .. } => "nested",
            RuleKind::CollectionAdapter { .. } => "collection",
            RuleKind::CustomResolver { .. } => "custom",
        }
    }
}

/// Rule for one writable destination member
#[derive(Debug, Clone)]
pub struct MappingRule {
    pub member: String,
    pub dest_type: TypeRef,
    pub setter: Arc<Accessor>,
    /// Written when a null source meets a populated destination
    pub zero: Value,
    pub kind: RuleKind,
}

impl MappingRule {
    fn detail(&self) -> String {
        let converted = |base: String, converter: &Option<ScalarConverter>| match converter {
            Some(c) => format!("{} ({})", base, c),
            None => base,
        };
        match &self.kind {
            RuleKind::DirectScalar { getter, converter } => converted(getter.name().to_string(), converter),
            RuleKind::FlattenMethod { method, converter } => converted(format!("{}()", method.name), converter),
            RuleKind::FlattenPath { chain, converter } => converted(
                chain.iter().map(|a| a.name()).collect::<Vec<_>>().join("."),
                converter,
            ),
            RuleKind::NestedAdapter { plan, .. } => plan.key().to_string(),
            RuleKind::CollectionAdapter { plan, .. } => plan.to_string(),
            RuleKind::CustomResolver { resolver } => match resolver {
                MemberResolver::Function(_) => "closure".to_string(),
                MemberResolver::Expression(lambda) => lambda.to_string(),
            },
        }
    }
}

/// Options captured when the plan was built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanOptions {
    pub max_depth: Option<NonZeroUsize>,
    pub ignore_null_values: Option<bool>,
}

/// Immutable member-by-member plan for a class pair
#[derive(Debug)]
pub struct MappingPlan {
    pub key: PairKey,
    pub source: Arc<ClassDescriptor>,
    pub dest: Arc<ClassDescriptor>,
    /// In destination declaration order
    pub rules: Vec<MappingRule>,
    pub options: PlanOptions,
    /// Pair fingerprint used by the depth tracker
    pub depth_key: u64,
}

impl MappingPlan {
    pub fn rule(&self, member: &str) -> Option<&MappingRule> {
        self.rules.iter().find(|r| r.member == member)
    }

    pub fn describe(&self) -> PlanDescription {
        PlanDescription {
            source: self.key.source.to_string(),
            dest: self.key.dest.to_string(),
            max_depth: self.options.max_depth.map(NonZeroUsize::get),
            ignore_null_values: self.options.ignore_null_values,
            rules: self
                .rules
                .iter()
                .map(|rule| RuleDescription {
                    member: rule.member.clone(),
                    rule: rule.kind.name().to_string(),
                    detail: rule.detail(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for MappingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.key)?;
        for rule in &self.rules {
            writeln!(f, "  {:<16} {:<14} {}", rule.member, rule.kind.name(), rule.detail())?;
        }
        Ok(())
    }
}

/// Reference to a class-pair plan, resolved on first use
///
/// Plans refer to their children by key so that self and mutual type
/// recursion never re-expands at compile time.
pub struct PlanRef {
    key: PairKey,
    resolved: OnceLock<Arc<MappingPlan>>,
}

impl PlanRef {
    pub(crate) fn new(key: PairKey) -> Self {
        Self {
            key,
            resolved: OnceLock::new(),
        }
    }

    pub fn key(&self) -> &PairKey {
        &self.key
    }

    pub fn resolve(&self, compiler: &PlanCompiler) -> Result<Arc<MappingPlan>> {
        if let Some(plan) = self.resolved.get() {
            return Ok(Arc::clone(plan));
        }
        let plan = compiler.compile_or_get(&self.key.source, &self.key.dest)?;
        Ok(Arc::clone(self.resolved.get_or_init(|| plan)))
    }
}

impl Clone for PlanRef {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            resolved: self.resolved.clone(),
        }
    }
}

impl fmt::Debug for PlanRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlanRef({})", self.key)
    }
}

/// Per-element strategy of a collection plan
#[derive(Debug, Clone)]
pub enum ElementRule {
    /// Copy elements as they are
    Identity,
    Scalar { converter: ScalarConverter },
    /// Untyped source: dispatch on each element's runtime type
    Dynamic { dest: TypeRef },
    Object(PlanRef),
    Collection(Box<CollectionPlan>),
}

/// Plan for adapting a sequence into a destination collection
#[derive(Debug, Clone)]
pub struct CollectionPlan {
    pub source: TypeRef,
    pub dest: TypeRef,
    pub shape: CollectionShape,
    pub element: ElementRule,
}

impl fmt::Display for CollectionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.dest)
    }
}

/// Compiled top-level adapter for any type pair
#[derive(Debug, Clone)]
pub enum Adapter {
    Object(Arc<MappingPlan>),
    Collection(Arc<CollectionPlan>),
    Scalar {
        dest: TypeRef,
        converter: Option<ScalarConverter>,
    },
}

/// Serializable summary of a plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanDescription {
    pub source: String,
    pub dest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_null_values: Option<bool>,
    pub rules: Vec<RuleDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleDescription {
    pub member: String,
    pub rule: String,
    pub detail: String,
}
