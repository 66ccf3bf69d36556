//! Mapping plan compiler
//!
//! Turns a (source, destination) class pair into an immutable
//! [`MappingPlan`]: one rule per writable destination member, resolved once
//! and cached for the life of the compiler. Nested class pairs are referenced
//! through [`PlanRef`] so recursive type graphs compile in a single pass.
//!
//! # Module Organization
//!
//! - [`types`] - Plans, rules and their descriptions
//! - [`flatten`] - Method and member-path flattening
//!
//! # Concurrency
//!
//! Lookups take a read lock only. Compilation is serialized by a single
//! compile lock; everything a compile produces is published together once it
//! has fully succeeded, so a failed compile leaves no partial state behind.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod flatten;
pub mod types;


pub use types::{
    Adapter, CollectionPlan, ElementRule, MappingPlan, MappingRule, PlanDescription, PlanOptions, PlanRef,
    RuleDescription, RuleKind,
};

use crate::config::{ConfigRegistry, MemberResolver, PairKey};
use crate::convert::{self, Resolution};
use crate::model::{AccessorCompiler, ClassDescriptor, Classification, MemberDescriptor, TypeRef, TypeRegistry};
use crate::projection::rewrite;
use crate::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Compiles and caches mapping plans and top-level adapters
pub struct PlanCompiler {
    registry: Arc<TypeRegistry>,
    configs: Arc<ConfigRegistry>,
    accessors: AccessorCompiler,
    plans: RwLock<HashMap<PairKey, Arc<MappingPlan>>>,
    adapters: RwLock<HashMap<PairKey, Arc<Adapter>>>,
    compile_lock: Mutex<()>,
}

/// Work of one compile: plans built so far and pairs still to build
#[derive(Default)]
struct Session {
    built: HashMap<PairKey, Arc<MappingPlan>>,
    queue: VecDeque<PairKey>,
    queued: HashSet<PairKey>,
}

impl Session {
    /// Reference a class pair, scheduling it unless already known
    fn request(&mut self, compiler: &PlanCompiler, key: PairKey) -> PlanRef {
        let known = self.built.contains_key(&key)
            || self.queued.contains(&key)
            || compiler.plans.read().contains_key(&key);
        if !known {
            self.queued.insert(key.clone());
            self.queue.push_back(key.clone());
        }
        PlanRef::new(key)
    }
}

impl PlanCompiler {
    pub fn new(registry: Arc<TypeRegistry>, configs: Arc<ConfigRegistry>) -> Self {
        let accessors = AccessorCompiler::new(Arc::clone(&registry));
        Self {
            registry,
            configs,
            accessors,
            plans: RwLock::new(HashMap::new()),
            adapters: RwLock::new(HashMap::new()),
            compile_lock: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn accessors(&self) -> &AccessorCompiler {
        &self.accessors
    }

    /// Cached plan for a pair, if it has been compiled
    pub fn cached_plan(&self, key: &PairKey) -> Option<Arc<MappingPlan>> {
        self.plans.read().get(key).cloned()
    }

    pub fn plan_count(&self) -> usize {
        self.plans.read().len()
    }

    /// Plan for a class pair, compiled on first request
    pub fn compile_or_get(&self, source: &TypeRef, dest: &TypeRef) -> Result<Arc<MappingPlan>> {
        let key = PairKey::new(source.strip_optional().clone(), dest.strip_optional().clone());
        if let Some(plan) = self.cached_plan(&key) {
            return Ok(plan);
        }

        let _guard = self.compile_lock.lock();
        if let Some(plan) = self.cached_plan(&key) {
            return Ok(plan);
        }

        let span = tracing::debug_span!("compile_plan", pair = %key);
        let _enter = span.enter();

        self.run_session(|this, session| {
            session.request(this, key.clone());
            Ok(())
        })?;
        self.cached_plan(&key)
            .ok_or_else(|| anyhow::anyhow!("plan for {} missing after compile", key).into())
    }

    /// Adapter for any type pair, compiled on first request
    pub fn adapter(&self, source: &TypeRef, dest: &TypeRef) -> Result<Arc<Adapter>> {
        let key = PairKey::new(source.clone(), dest.clone());
        if let Some(adapter) = self.adapters.read().get(&key).cloned() {
            return Ok(adapter);
        }

        let adapter = match self.registry.classify(dest)? {
            Classification::Class => Adapter::Object(self.compile_or_get(source, dest)?),
            Classification::Collection => {
                let _guard = self.compile_lock.lock();
                if let Some(adapter) = self.adapters.read().get(&key).cloned() {
                    return Ok(adapter);
                }

                let span = tracing::debug_span!("compile_adapter", pair = %key);
                let _enter = span.enter();

                let force_new = self.configs.settings().force_new_instance_for_identical_types;
                let plan = self.run_session(|this, session| {
                    this.collection_plan(source, dest, force_new, session, &key)
                })?;
                Adapter::Collection(Arc::new(plan))
            }
            Classification::Scalar => Adapter::Scalar {
                dest: dest.clone(),
                converter: self.scalar_converter(source, dest, &key),
            },
        };

        let adapter = Arc::new(adapter);
        let mut adapters = self.adapters.write();
        Ok(Arc::clone(adapters.entry(key).or_insert(adapter)))
    }

    /// Run `start`, then build every class plan it scheduled; caller holds
    /// the compile lock
    fn run_session<T>(&self, start: impl FnOnce(&Self, &mut Session) -> Result<T>) -> Result<T> {
        let mut session = Session::default();
        let result = start(self, &mut session)?;

        while let Some(key) = session.queue.pop_front() {
            let plan = self.build_plan(&key, &mut session)?;
            log::debug!("Compiled plan {} with {} rules", key, plan.rules.len());
            session.built.insert(key, Arc::new(plan));
        }

        let mut plans = self.plans.write();
        for (key, plan) in session.built {
            plans.entry(key).or_insert(plan);
        }
        Ok(result)
    }

    fn class_of(&self, ty: &TypeRef, key: &PairKey) -> Result<Arc<ClassDescriptor>> {
        if let TypeRef::Named(name) = ty {
            if self.registry.classify(ty)? == Classification::Class {
                return self.registry.class(name);
            }
        }
        Err(Error::configuration(
            format!("{} is not a class type", ty),
            Some(key.to_string()),
        ))
    }

    fn build_plan(&self, key: &PairKey, session: &mut Session) -> Result<MappingPlan> {
        let source = self.class_of(&key.source, key)?;
        let dest = self.class_of(&key.dest, key)?;
        if !dest.is_constructible() {
            return Err(Error::configuration(
                format!("{} has no zero-argument constructor", dest.name()),
                Some(key.to_string()),
            ));
        }

        let config = self.configs.get(key).unwrap_or_default();
        config.check_against(&dest, key)?;
        for resolver in config.resolvers.values() {
            if let MemberResolver::Expression(lambda) = resolver {
                rewrite::validate_lambda(lambda, &key.source, &self.registry).map_err(|e| match e {
                    Error::Configuration { message, pair: None } => Error::Configuration {
                        message,
                        pair: Some(key.to_string()),
                    },
                    other => other,
                })?;
            }
        }

        let force_new = config
            .force_new_instance
            .unwrap_or(self.configs.settings().force_new_instance_for_identical_types);

        let mut rules = Vec::new();
        for member in dest.members().iter().filter(|m| m.writable) {
            if config.is_ignored(&member.name) {
                log::debug!("{}: {} ignored", key, member.name);
                continue;
            }

            let kind = if let Some(resolver) = config.resolver(&member.name) {
                Some(RuleKind::CustomResolver {
                    resolver: resolver.clone(),
                })
            } else if let Some(source_member) = source.member(&member.name).filter(|m| m.readable) {
                self.same_name_rule(&source, source_member, member, force_new, session, key)?
            } else {
                self.flatten_rule(&source, member)?
            };

            match kind {
                Some(kind) => rules.push(MappingRule {
                    member: member.name.clone(),
                    dest_type: member.ty.clone(),
                    setter: self.accessors.accessor(dest.name(), &member.name)?,
                    zero: self.registry.zero_value(&member.ty),
                    kind,
                }),
                None => log::debug!("{}: no source for {}", key, member.name),
            }
        }

        Ok(MappingPlan {
            key: key.clone(),
            source,
            dest,
            rules,
            options: PlanOptions {
                max_depth: config.max_depth,
                ignore_null_values: config.ignore_null_values,
            },
            depth_key: key.fingerprint(),
        })
    }

    fn same_name_rule(
        &self,
        source: &ClassDescriptor,
        source_member: &MemberDescriptor,
        member: &MemberDescriptor,
        force_new: bool,
        session: &mut Session,
        key: &PairKey,
    ) -> Result<Option<RuleKind>> {
        let getter = self.accessors.accessor(source.name(), &source_member.name)?;
        let source_class = self.registry.classify(&source_member.ty)?;

        let kind = match self.registry.classify(&member.ty)? {
            Classification::Scalar => {
                let converter = if source_class == Classification::Scalar {
                    self.scalar_converter(&source_member.ty, &member.ty, key)
                } else {
                    None
                };
                Some(RuleKind::DirectScalar { getter, converter })
            }
            Classification::Collection if source_class == Classification::Collection => {
                let plan = self.collection_plan(&source_member.ty, &member.ty, force_new, session, key)?;
                Some(RuleKind::CollectionAdapter {
                    getter,
                    plan: Arc::new(plan),
                })
            }
            Classification::Class if source_class == Classification::Class => {
                let source_ty = source_member.ty.strip_optional();
                let dest_ty = member.ty.strip_optional();
                if source_ty == dest_ty && !force_new {
                    Some(RuleKind::DirectScalar {
                        getter,
                        converter: None,
                    })
                } else {
                    let child = PairKey::new(source_ty.clone(), dest_ty.clone());
                    Some(RuleKind::NestedAdapter {
                        getter,
                        plan: session.request(self, child),
                    })
                }
            }
            _ => {
                log::warn!(
                    "{}: {} has incompatible shapes ({} -> {}), skipped",
                    key,
                    member.name,
                    source_member.ty,
                    member.ty
                );
                None
            }
        };
        Ok(kind)
    }

    fn flatten_rule(&self, source: &ClassDescriptor, member: &MemberDescriptor) -> Result<Option<RuleKind>> {
        if let Some(method) = flatten::find_method(source, &member.name) {
            let converter = convert::resolve(&method.returns, &member.ty, &self.registry).converter();
            return Ok(Some(RuleKind::FlattenMethod { method, converter }));
        }

        let Some(path) = flatten::find_path(&self.registry, source, &member.name)? else {
            return Ok(None);
        };
        let chain = path
            .iter()
            .map(|hop| self.accessors.accessor(&hop.class, &hop.member))
            .collect::<Result<Vec<_>>>()?;
        let converter = path
            .last()
            .and_then(|leaf| convert::resolve(&leaf.ty, &member.ty, &self.registry).converter());
        Ok(Some(RuleKind::FlattenPath { chain, converter }))
    }

    fn scalar_converter(&self, source: &TypeRef, dest: &TypeRef, key: &PairKey) -> Option<convert::ScalarConverter> {
        match convert::resolve(source, dest, &self.registry) {
            Resolution::Identity => None,
            Resolution::Convert(converter) => Some(converter),
            Resolution::Unsupported => {
                log::debug!("{}: no converter {} -> {}, writes are checked at run time", key, source, dest);
                None
            }
        }
    }

    fn collection_plan(
        &self,
        source: &TypeRef,
        dest: &TypeRef,
        force_new: bool,
        session: &mut Session,
        key: &PairKey,
    ) -> Result<CollectionPlan> {
        let (source, dest) = (source.strip_optional(), dest.strip_optional());
        let (Some(source_elem), Some(dest_elem), Some(shape)) = (source.element(), dest.element(), dest.shape()) else {
            return Err(Error::configuration(
                format!("cannot adapt {} into {}", source, dest),
                Some(key.to_string()),
            ));
        };

        Ok(CollectionPlan {
            source: source.clone(),
            dest: dest.clone(),
            shape,
            element: self.element_rule(source_elem, dest_elem, force_new, session, key)?,
        })
    }

    fn element_rule(
        &self,
        source: &TypeRef,
        dest: &TypeRef,
        force_new: bool,
        session: &mut Session,
        key: &PairKey,
    ) -> Result<ElementRule> {
        if *dest == TypeRef::Any {
            return Ok(ElementRule::Identity);
        }
        if *source == TypeRef::Any {
            return Ok(ElementRule::Dynamic { dest: dest.clone() });
        }

        let source_class = self.registry.classify(source)?;
        let rule = match self.registry.classify(dest)? {
            Classification::Scalar if source_class == Classification::Scalar => {
                match self.scalar_converter(source, dest, key) {
                    Some(converter) => ElementRule::Scalar { converter },
                    None => ElementRule::Identity,
                }
            }
            Classification::Class if source_class == Classification::Class => {
                let (source, dest) = (source.strip_optional(), dest.strip_optional());
                if source == dest && !force_new {
                    ElementRule::Identity
                } else {
                    ElementRule::Object(session.request(self, PairKey::new(source.clone(), dest.clone())))
                }
            }
            Classification::Collection if source_class == Classification::Collection => {
                ElementRule::Collection(Box::new(self.collection_plan(source, dest, force_new, session, key)?))
            }
            _ => {
                log::warn!("{}: elements {} cannot become {}, copied as is", key, source, dest);
                ElementRule::Identity
            }
        };
        Ok(rule)
    }
}
