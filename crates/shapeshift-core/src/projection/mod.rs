//! Projection compiler
//!
//! Builds a pure, cached expression equivalent to a mapping plan, for
//! deferred evaluation by a [`QuerySource`]. Resolution follows the same
//! order as the plan compiler, but nested classes become null-guarded
//! constructions, nested collections become `Select` combinators and depth
//! is bounded at compile time by pruning members from the construction.
//!
//! # Module Organization
//!
//! - [`ast`] - Expression IR
//! - [`rewrite`] - Parameter substitution and expression validation
//! - [`evaluator`] - In-memory reference evaluator
//! - [`query`] - Deferred evaluation providers
//!
//! # Examples
//!
//! ```
//! use shapeshift_core::projection::{Expr, Lambda, rewrite};
//! use shapeshift_core::model::TypeRef;
//!
//! let full_name = Lambda::new(
//!     "p",
//!     TypeRef::named("Person"),
//!     Expr::concat(vec![
//!         Expr::param("p").member("Name"),
//!         Expr::constant(" "),
//!         Expr::param("p").member("Surname"),
//!     ]),
//! );
//!
//! let spliced = rewrite::inline(&full_name, &Expr::param("srcPerson0"));
//! assert_eq!(
//!     spliced.to_string(),
//!     "concat(srcPerson0.Name, \" \", srcPerson0.Surname)"
//! );
//! ```
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod ast;
pub mod evaluator;
pub mod query;
pub mod rewrite;

#[cfg(test)]
mod tests;

pub use ast::{Binding, Expr, Function, Lambda, Literal};
pub use evaluator::{Evaluator, Scope};
pub use query::{InMemoryQuery, Projected, QuerySource};

use crate::config::{ConfigRegistry, MapperSettings, MemberResolver, PairKey, TypePairConfig};
use crate::convert::{self, Resolution};
use crate::model::{ClassDescriptor, Classification, MemberDescriptor, TypeRef, TypeRegistry};
use crate::plan::flatten;
use crate::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Compiles and caches projection lambdas per type pair
pub struct ProjectionCompiler {
    registry: Arc<TypeRegistry>,
    configs: Arc<ConfigRegistry>,
    cache: RwLock<HashMap<PairKey, Arc<Lambda>>>,
    compile_lock: Mutex<()>,
}

/// State carried through one projection compile
struct BuildContext {
    settings: MapperSettings,
    /// Occurrences of each destination member on the current path
    member_depths: HashMap<(String, String), usize>,
    next_param: usize,
}

impl BuildContext {
    fn fresh_param(&mut self, ty: &TypeRef) -> String {
        let label = match ty.strip_optional() {
            TypeRef::Named(name) => name.clone(),
            TypeRef::Scalar(kind) => kind.name().to_string(),
            _ => "Item".to_string(),
        };
        let name = format!("src{}{}", label, self.next_param);
        self.next_param += 1;
        name
    }
}

impl ProjectionCompiler {
    pub fn new(registry: Arc<TypeRegistry>, configs: Arc<ConfigRegistry>) -> Self {
        Self {
            registry,
            configs,
            cache: RwLock::new(HashMap::new()),
            compile_lock: Mutex::new(()),
        }
    }

    /// Projection for a class pair, compiled on first request
    pub fn compile(&self, source: &TypeRef, dest: &TypeRef) -> Result<Arc<Lambda>> {
        let key = PairKey::new(source.strip_optional().clone(), dest.strip_optional().clone());
        if let Some(found) = self.cached(&key) {
            return Ok(found);
        }

        let _guard = self.compile_lock.lock();
        if let Some(found) = self.cached(&key) {
            return Ok(found);
        }

        let span = tracing::debug_span!("compile_projection", pair = %key);
        let _enter = span.enter();

        let lambda = Arc::new(self.build(&key)?);
        log::debug!("Compiled projection {}: {}", key, lambda);
        self.cache.write().insert(key, Arc::clone(&lambda));
        Ok(lambda)
    }

    pub fn cached(&self, key: &PairKey) -> Option<Arc<Lambda>> {
        self.cache.read().get(key).cloned()
    }

    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }

    fn build(&self, key: &PairKey) -> Result<Lambda> {
        let (source, dest) = self.class_pair(key)?;
        let mut ctx = BuildContext {
            settings: self.configs.settings(),
            member_depths: HashMap::new(),
            next_param: 0,
        };
        let param = ctx.fresh_param(&key.source);
        let body = self.construct(&mut ctx, Expr::param(param.clone()), &source, &dest, key)?;
        Ok(Lambda::new(param, key.source.clone(), body))
    }

    fn class_pair(&self, key: &PairKey) -> Result<(Arc<ClassDescriptor>, Arc<ClassDescriptor>)> {
        let class_of = |ty: &TypeRef| -> Result<Arc<ClassDescriptor>> {
            if let TypeRef::Named(name) = ty {
                if self.registry.classify(ty)? == Classification::Class {
                    return self.registry.class(name);
                }
            }
            Err(Error::configuration(
                format!("projection requires class types, got {}", ty),
                Some(key.to_string()),
            ))
        };
        Ok((class_of(&key.source)?, class_of(&key.dest)?))
    }

    /// Member-init construction of `dest` from `source_expr`
    fn construct(
        &self,
        ctx: &mut BuildContext,
        source_expr: Expr,
        source: &Arc<ClassDescriptor>,
        dest: &Arc<ClassDescriptor>,
        key: &PairKey,
    ) -> Result<Expr> {
        if !dest.is_constructible() {
            return Err(Error::configuration(
                format!("{} has no zero-argument constructor", dest.name()),
                Some(key.to_string()),
            ));
        }

        let config = self.configs.get(key).unwrap_or_default();
        config.check_against(dest, key)?;

        let mut bindings = Vec::new();
        for member in dest.members().iter().filter(|m| m.writable) {
            if config.is_ignored(&member.name) {
                continue;
            }

            if let Some(resolver) = config.resolver(&member.name) {
                let lambda = match resolver {
                    MemberResolver::Expression(lambda) => lambda,
                    MemberResolver::Function(_) => {
                        return Err(Error::configuration(
                            format!(
                                "resolver for {}.{} is a closure and cannot be projected",
                                dest.name(),
                                member.name
                            ),
                            Some(key.to_string()),
                        ))
                    }
                };
                rewrite::validate_lambda(lambda, &key.source, &self.registry)
                    .map_err(|e| with_pair(e, key))?;
                bindings.push(Binding {
                    member: member.name.clone(),
                    value: rewrite::inline(lambda, &source_expr),
                });
                continue;
            }

            let value = self.bind_member(ctx, &source_expr, source, dest, member, &config, key)?;
            match value {
                Some(value) => bindings.push(Binding {
                    member: member.name.clone(),
                    value,
                }),
                None => log::debug!("{}: member {} not projected", key, member.name),
            }
        }

        Ok(Expr::construct(dest.name(), bindings))
    }

    #[allow(clippy::too_many_arguments)]
    fn bind_member(
        &self,
        ctx: &mut BuildContext,
        source_expr: &Expr,
        source: &ClassDescriptor,
        dest: &ClassDescriptor,
        member: &MemberDescriptor,
        config: &TypePairConfig,
        key: &PairKey,
    ) -> Result<Option<Expr>> {
        let Some(source_member) = source.member(&member.name).filter(|m| m.readable) else {
            return self.flatten(source_expr, source, member);
        };

        let access = source_expr.clone().member(&member.name);
        let force_new = config
            .force_new_instance
            .unwrap_or(ctx.settings.force_new_instance_for_identical_types);
        let limit = config
            .max_depth
            .map(|d| d.get())
            .unwrap_or(ctx.settings.projection_max_depth);

        match self.registry.classify(&member.ty)? {
            Classification::Scalar => Ok(Some(self.scalar_access(access, &source_member.ty, &member.ty))),
            Classification::Collection => {
                if self.registry.classify(&source_member.ty)? != Classification::Collection {
                    log::warn!("{}: {} is not a collection on the source", key, member.name);
                    return Ok(None);
                }
                self.at_depth(ctx, dest, member, limit, |this, ctx| {
                    let select = this.select(ctx, access.clone(), &source_member.ty, &member.ty, force_new)?;
                    Ok(Expr::condition(
                        Expr::is_null(access.clone()),
                        Expr::default_of(member.ty.clone()),
                        select,
                    ))
                })
            }
            Classification::Class => {
                if self.registry.classify(&source_member.ty)? != Classification::Class {
                    log::warn!("{}: {} is not a class on the source", key, member.name);
                    return Ok(None);
                }
                if source_member.ty.strip_optional() == member.ty.strip_optional() && !force_new {
                    return Ok(Some(access));
                }
                self.at_depth(ctx, dest, member, limit, |this, ctx| {
                    this.nested(ctx, access.clone(), &source_member.ty, &member.ty)
                })
            }
        }
    }

    /// Run `build` one level deeper for this destination member, or prune
    fn at_depth<F>(
        &self,
        ctx: &mut BuildContext,
        dest: &ClassDescriptor,
        member: &MemberDescriptor,
        limit: usize,
        build: F,
    ) -> Result<Option<Expr>>
    where
        F: FnOnce(&Self, &mut BuildContext) -> Result<Expr>,
    {
        let id = (dest.name().to_string(), member.name.clone());
        let previous = ctx.member_depths.get(&id).copied();
        // The enclosing construction is the first occurrence
        let depth = previous.unwrap_or(1) + 1;
        if depth >= limit {
            log::debug!("Pruned {}.{} at depth {}", dest.name(), member.name, depth);
            return Ok(None);
        }

        ctx.member_depths.insert(id.clone(), depth);
        let built = build(self, ctx);
        match previous {
            Some(previous) => ctx.member_depths.insert(id, previous),
            None => ctx.member_depths.remove(&id),
        };
        built.map(Some)
    }

    /// Null-guarded construction of a nested class
    fn nested(&self, ctx: &mut BuildContext, access: Expr, source_ty: &TypeRef, dest_ty: &TypeRef) -> Result<Expr> {
        let child_key = PairKey::new(source_ty.strip_optional().clone(), dest_ty.strip_optional().clone());
        let (source, dest) = self.class_pair(&child_key)?;
        let construct = self.construct(ctx, access.clone(), &source, &dest, &child_key)?;
        Ok(Expr::condition(Expr::is_null(access), Expr::null(), construct))
    }

    /// Element-wise projection of a collection
    fn select(
        &self,
        ctx: &mut BuildContext,
        access: Expr,
        source_ty: &TypeRef,
        dest_ty: &TypeRef,
        force_new: bool,
    ) -> Result<Expr> {
        let (Some(source_elem), Some(dest_elem), Some(shape)) = (
            source_ty.strip_optional().element(),
            dest_ty.strip_optional().element(),
            dest_ty.strip_optional().shape(),
        ) else {
            return Err(Error::configuration(
                format!("cannot project {} into {}", source_ty, dest_ty),
                None,
            ));
        };

        let param = ctx.fresh_param(source_elem);
        let body = self.element(ctx, Expr::param(param.clone()), source_elem, dest_elem, force_new)?;
        Ok(Expr::select(access, Lambda::new(param, source_elem.clone(), body), shape))
    }

    fn element(
        &self,
        ctx: &mut BuildContext,
        item: Expr,
        source_elem: &TypeRef,
        dest_elem: &TypeRef,
        force_new: bool,
    ) -> Result<Expr> {
        if *dest_elem == TypeRef::Any {
            return Ok(item);
        }
        match self.registry.classify(dest_elem)? {
            Classification::Scalar => Ok(self.scalar_access(item, source_elem, dest_elem)),
            Classification::Class => {
                if *source_elem == TypeRef::Any {
                    return Err(Error::configuration(
                        format!("cannot project untyped elements into {}", dest_elem),
                        None,
                    ));
                }
                if source_elem.strip_optional() == dest_elem.strip_optional() && !force_new {
                    return Ok(item);
                }
                self.nested(ctx, item, source_elem, dest_elem)
            }
            Classification::Collection => {
                let select = self.select(ctx, item.clone(), source_elem, dest_elem, force_new)?;
                Ok(Expr::condition(Expr::is_null(item), Expr::null(), select))
            }
        }
    }

    fn scalar_access(&self, access: Expr, source_ty: &TypeRef, dest_ty: &TypeRef) -> Expr {
        match convert::resolve(source_ty, dest_ty, &self.registry) {
            Resolution::Convert(_) => access.convert(dest_ty.clone()),
            Resolution::Identity | Resolution::Unsupported => access,
        }
    }

    /// Flatten by method, else by member path with a null guard per hop
    fn flatten(&self, source_expr: &Expr, source: &ClassDescriptor, member: &MemberDescriptor) -> Result<Option<Expr>> {
        if let Some(method) = flatten::find_method(source, &member.name) {
            let call = source_expr.clone().invoke(&method.name);
            return Ok(Some(self.scalar_access(call, &method.returns, &member.ty)));
        }

        let Some(path) = flatten::find_path(&self.registry, source, &member.name)? else {
            return Ok(None);
        };

        let mut prefixes = Vec::with_capacity(path.len());
        let mut current = source_expr.clone();
        for hop in &path {
            current = current.member(&hop.member);
            prefixes.push(current.clone());
        }

        let leaf_ty = path.last().map(|h| h.ty.clone()).unwrap_or(TypeRef::Any);
        let mut expr = self.scalar_access(current, &leaf_ty, &member.ty);
        // Guard every intermediate hop, innermost first
        for prefix in prefixes.iter().rev().skip(1) {
            expr = Expr::condition(
                Expr::is_null(prefix.clone()),
                Expr::default_of(member.ty.clone()),
                expr,
            );
        }
        Ok(Some(expr))
    }
}

fn with_pair(error: Error, key: &PairKey) -> Error {
    match error {
        Error::Configuration { message, pair: None } => Error::Configuration {
            message,
            pair: Some(key.to_string()),
        },
        other => other,
    }
}
