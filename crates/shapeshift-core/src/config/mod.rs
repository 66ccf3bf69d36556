//! Per-type-pair configuration and global settings
//!
//! Configuration must be established before the first compile of a pair.
//! Compiled plans and projections capture the options they were built with,
//! so later changes have no effect on them.
//!
//! # Examples
//!
//! ```
//! use shapeshift_core::config::ConfigRegistry;
//! use shapeshift_core::Value;
//!
//! let configs = ConfigRegistry::new();
//! configs
//!     .configure("Customer".parse().unwrap(), "CustomerDto".parse().unwrap())
//!     .ignore_member("Password")
//!     .max_depth(3)
//!     .map_from("DisplayName", |src| src.get("Name"));
//! ```
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod builder;


pub use builder::PairConfigurator;

use crate::model::{ClassDescriptor, TypeRef};
use crate::projection::Lambda;
use crate::value::{ObjectRef, Value};
use crate::{Error, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Closure computing a destination member from the source instance
pub type ResolverFn = Arc<dyn Fn(&ObjectRef) -> Result<Value> + Send + Sync>;

/// Identity of a (source, destination) type pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    pub source: TypeRef,
    pub dest: TypeRef,
}

impl PairKey {
    pub fn new(source: TypeRef, dest: TypeRef) -> Self {
        Self { source, dest }
    }

    /// Stable 64-bit fingerprint, used as the depth-tracking key
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.dest)
    }
}

/// Custom source for a destination member
#[derive(Clone)]
pub enum MemberResolver {
    /// Opaque closure; usable by the eager mapper only
    Function(ResolverFn),
    /// Declarative expression over the source; usable by both engines
    Expression(Arc<Lambda>),
}

impl MemberResolver {
    pub fn is_expression(&self) -> bool {
        matches!(self, MemberResolver::Expression(_))
    }
}

impl fmt::Debug for MemberResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberResolver::Function(_) => write!(f, "Function(..)"),
            MemberResolver::Expression(lambda) => write!(f, "Expression({})", lambda),
        }
    }
}

/// Options for one type pair
#[derive(Debug, Clone, Default)]
pub struct TypePairConfig {
    pub ignored: BTreeSet<String>,
    pub resolvers: BTreeMap<String, MemberResolver>,
    pub max_depth: Option<NonZeroUsize>,
    pub ignore_null_values: Option<bool>,
    pub force_new_instance: Option<bool>,
}

impl TypePairConfig {
    pub fn is_ignored(&self, member: &str) -> bool {
        self.ignored.contains(member)
    }

    pub fn resolver(&self, member: &str) -> Option<&MemberResolver> {
        self.resolvers.get(member)
    }

    /// Check the options against the destination class they apply to
    ///
    /// A resolver for a missing or read-only member is an error; an ignored
    /// member that does not exist only earns a warning.
    pub fn check_against(&self, dest: &ClassDescriptor, key: &PairKey) -> Result<()> {
        for member in self.resolvers.keys() {
            match dest.member(member) {
                Some(found) if found.writable => {}
                Some(_) => {
                    return Err(Error::configuration(
                        format!("resolver targets read-only member {}.{}", dest.name(), member),
                        Some(key.to_string()),
                    ))
                }
                None => {
                    return Err(Error::configuration(
                        format!("resolver targets unknown member {}.{}", dest.name(), member),
                        Some(key.to_string()),
                    ))
                }
            }
        }
        for member in &self.ignored {
            if dest.member(member).is_none() {
                log::warn!("{}: ignored member '{}' does not exist on {}", key, member, dest.name());
            }
        }
        Ok(())
    }
}

/// Process-wide defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperSettings {
    /// Whether a class member whose source and destination types are
    /// identical is deep-copied rather than aliased
    pub force_new_instance_for_identical_types: bool,
    /// Depth limit of projections for pairs without `max_depth`
    pub projection_max_depth: usize,
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self {
            force_new_instance_for_identical_types: true,
            projection_max_depth: 3,
        }
    }
}

/// Store of pair configurations and global settings
#[derive(Default)]
pub struct ConfigRegistry {
    pairs: RwLock<HashMap<PairKey, TypePairConfig>>,
    settings: RwLock<MapperSettings>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent configurator for a pair
    pub fn configure(&self, source: TypeRef, dest: TypeRef) -> PairConfigurator<'_> {
        PairConfigurator::new(self, PairKey::new(source, dest))
    }

    /// Snapshot of the configuration for a pair
    pub fn get(&self, key: &PairKey) -> Option<TypePairConfig> {
        self.pairs.read().get(key).cloned()
    }

    pub fn contains(&self, key: &PairKey) -> bool {
        self.pairs.read().contains_key(key)
    }

    /// Forget the configuration of a pair
    pub fn reset(&self, key: &PairKey) {
        self.pairs.write().remove(key);
    }

    pub fn clear(&self) {
        self.pairs.write().clear();
    }

    pub fn configured_pairs(&self) -> Vec<PairKey> {
        let mut keys: Vec<_> = self.pairs.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn settings(&self) -> MapperSettings {
        self.settings.read().clone()
    }

    pub fn set_settings(&self, settings: MapperSettings) {
        *self.settings.write() = settings;
    }

    pub fn update_settings(&self, update: impl FnOnce(&mut MapperSettings)) {
        update(&mut self.settings.write());
    }

    pub(crate) fn update(&self, key: &PairKey, update: impl FnOnce(&mut TypePairConfig)) {
        let mut pairs = self.pairs.write();
        update(pairs.entry(key.clone()).or_default());
    }
}
