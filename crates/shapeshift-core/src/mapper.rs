//! Public mapping facade
//!
//! [`Mapper`] ties the type registry, pair configuration, plan compiler and
//! projection compiler together. A process-wide instance is available from
//! [`Mapper::global`]; independent instances can be created for isolation.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::config::{ConfigRegistry, MapperSettings, PairConfigurator, PairKey};
use crate::engine::{self, DepthTracker, GraphMapper};
use crate::model::{TypeRef, TypeRegistry};
use crate::plan::{MappingPlan, PlanCompiler};
use crate::projection::{InMemoryQuery, Lambda, ProjectionCompiler, QuerySource};
use crate::value::{ObjectRef, Value};
use crate::Result;
use std::sync::{Arc, OnceLock};

/// Object graph mapper
pub struct Mapper {
    registry: Arc<TypeRegistry>,
    configs: Arc<ConfigRegistry>,
    plans: PlanCompiler,
    projections: ProjectionCompiler,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper {
    pub fn new() -> Self {
        Self::with_registry(Arc::new(TypeRegistry::new()))
    }

    /// Mapper over an existing set of type descriptors
    pub fn with_registry(registry: Arc<TypeRegistry>) -> Self {
        let configs = Arc::new(ConfigRegistry::new());
        Self {
            plans: PlanCompiler::new(Arc::clone(&registry), Arc::clone(&configs)),
            projections: ProjectionCompiler::new(Arc::clone(&registry), Arc::clone(&configs)),
            registry,
            configs,
        }
    }

    /// Process-wide instance
    pub fn global() -> &'static Mapper {
        static GLOBAL: OnceLock<Mapper> = OnceLock::new();
        GLOBAL.get_or_init(Mapper::new)
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn configs(&self) -> &ConfigRegistry {
        &self.configs
    }

    pub fn settings(&self) -> MapperSettings {
        self.configs.settings()
    }

    pub fn update_settings(&self, update: impl FnOnce(&mut MapperSettings)) {
        self.configs.update_settings(update);
    }

    /// Configure a pair before its first use
    ///
    /// Options added after the pair was compiled do not affect the cached
    /// plan or projection.
    pub fn configure(&self, source: &str, dest: &str) -> Result<PairConfigurator<'_>> {
        let key = PairKey::new(source.parse()?, dest.parse()?);
        if self.plans.cached_plan(&key).is_some() || self.projections.cached(&key).is_some() {
            log::warn!("{} is already compiled; new options apply to nothing cached", key);
        }
        Ok(self.configs.configure(key.source, key.dest))
    }

    /// Adapt `source` into a new value of type `dest`, using the source's
    /// runtime type
    pub fn adapt(&self, source: &Value, dest: &str) -> Result<Value> {
        if source.is_null() {
            return Ok(Value::Null);
        }
        let source_type = self.registry.type_of(source);
        self.adapt_typed(source, &source_type, &dest.parse()?)
    }

    /// Adapt with explicitly named source and destination types
    pub fn adapt_untyped(&self, source: &Value, source_type: &str, dest_type: &str) -> Result<Value> {
        if source.is_null() {
            return Ok(Value::Null);
        }
        self.adapt_typed(source, &source_type.parse()?, &dest_type.parse()?)
    }

    fn adapt_typed(&self, source: &Value, source_type: &TypeRef, dest: &TypeRef) -> Result<Value> {
        let adapter = self.plans.adapter(source_type, dest)?;
        let adapted = engine::adapt_value(&self.plans, &adapter, source, DepthTracker::new())?;
        Ok(adapted.into_value())
    }

    /// Populate an existing destination from `source`
    ///
    /// Null source members overwrite populated destination members with
    /// their zero value unless the pair ignores nulls.
    pub fn adapt_into(&self, source: &ObjectRef, dest: &ObjectRef) -> Result<ObjectRef> {
        let plan = self.plans.compile_or_get(
            &TypeRef::named(source.class_name()),
            &TypeRef::named(dest.class_name()),
        )?;
        GraphMapper::new(&self.plans).adapt(&plan, source, Some(dest.clone()), false, DepthTracker::new())?;
        Ok(dest.clone())
    }

    /// Compiled plan for a class pair
    pub fn plan(&self, source: &str, dest: &str) -> Result<Arc<MappingPlan>> {
        self.plans.compile_or_get(&source.parse()?, &dest.parse()?)
    }

    /// Compiled projection for a class pair
    pub fn projection(&self, source: &str, dest: &str) -> Result<Arc<Lambda>> {
        self.projections.compile(&source.parse()?, &dest.parse()?)
    }

    /// In-memory queryable over `items`
    pub fn query(&self, element_type: &str, items: Vec<Value>) -> Result<InMemoryQuery> {
        Ok(InMemoryQuery::new(
            Arc::clone(&self.registry),
            element_type.parse()?,
            items,
        ))
    }

    /// Start a projection of a queryable source
    pub fn project<S: QuerySource>(&self, source: S) -> Projection<'_, S> {
        Projection { mapper: self, source }
    }

    pub fn plan_compiler(&self) -> &PlanCompiler {
        &self.plans
    }

    pub fn projection_compiler(&self) -> &ProjectionCompiler {
        &self.projections
    }
}

/// Pending projection; see [`Mapper::project`]
pub struct Projection<'m, S> {
    mapper: &'m Mapper,
    source: S,
}

impl<'m, S: QuerySource> Projection<'m, S> {
    /// Attach the projection into `dest` to the source
    pub fn to(self, dest: &str) -> Result<S::Output> {
        let dest: TypeRef = dest.parse()?;
        let lambda = self.mapper.projections.compile(self.source.element_type(), &dest)?;
        Ok(self.source.select(lambda))
    }
}
