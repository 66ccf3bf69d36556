//! Fluent configurator for one type pair
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::{ConfigRegistry, MemberResolver, PairKey};
use crate::projection::Lambda;
use crate::value::{ObjectRef, Value};
use crate::Result;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Writes pair options straight into the [`ConfigRegistry`]
pub struct PairConfigurator<'a> {
    registry: &'a ConfigRegistry,
    key: PairKey,
}

impl<'a> PairConfigurator<'a> {
    pub(crate) fn new(registry: &'a ConfigRegistry, key: PairKey) -> Self {
        Self { registry, key }
    }

    pub fn key(&self) -> &PairKey {
        &self.key
    }

    /// Never write this destination member
    pub fn ignore_member(self, member: impl Into<String>) -> Self {
        let member = member.into();
        self.registry.update(&self.key, |config| {
            config.ignored.insert(member);
        });
        self
    }

    /// Compute a destination member with a closure over the source
    ///
    /// Closure resolvers cannot be projected.
    pub fn map_from<F>(self, member: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&ObjectRef) -> Result<Value> + Send + Sync + 'static,
    {
        let member = member.into();
        self.registry.update(&self.key, |config| {
            config
                .resolvers
                .insert(member, MemberResolver::Function(Arc::new(resolver)));
        });
        self
    }

    /// Compute a destination member with an expression over the source
    pub fn map_from_expr(self, member: impl Into<String>, lambda: Lambda) -> Self {
        let member = member.into();
        self.registry.update(&self.key, |config| {
            config
                .resolvers
                .insert(member, MemberResolver::Expression(Arc::new(lambda)));
        });
        self
    }

    /// Limit recursion of this pair; zero leaves the limit unset
    pub fn max_depth(self, depth: usize) -> Self {
        match NonZeroUsize::new(depth) {
            Some(depth) => self.registry.update(&self.key, |config| {
                config.max_depth = Some(depth);
            }),
            None => log::warn!("Ignoring max_depth(0) for {}", self.key),
        }
        self
    }

    pub fn ignore_null_values(self, ignore: bool) -> Self {
        self.registry.update(&self.key, |config| {
            config.ignore_null_values = Some(ignore);
        });
        self
    }

    /// Override the global same-type instancing policy for this pair
    pub fn force_new_instance_for_identical_types(self, force: bool) -> Self {
        self.registry.update(&self.key, |config| {
            config.force_new_instance = Some(force);
        });
        self
    }

    /// Drop every option set for this pair so far
    pub fn reset(self) -> Self {
        self.registry.reset(&self.key);
        self
    }
}
