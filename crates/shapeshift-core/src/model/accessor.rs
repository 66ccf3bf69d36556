//! Compiled member accessors
//!
//! An [`Accessor`] is a slot-bound get/set capability for one member of one
//! class. Accessors are built once per `(class, member)` and cached.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::descriptor::MemberDescriptor;
use super::registry::TypeRegistry;
use crate::value::{ObjectRef, Value};
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type Getter = Arc<dyn Fn(&ObjectRef) -> Result<Value> + Send + Sync>;
pub type Setter = Arc<dyn Fn(&ObjectRef, Value) -> Result<()> + Send + Sync>;

/// Bound get/set capability for a member
pub struct Accessor {
    class: String,
    member: MemberDescriptor,
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl Accessor {
    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn member(&self) -> &MemberDescriptor {
        &self.member
    }

    pub fn name(&self) -> &str {
        &self.member.name
    }

    pub fn get(&self, target: &ObjectRef) -> Result<Value> {
        match &self.getter {
            Some(getter) => getter(target),
            None => Err(Error::member(&self.class, &self.member.name, "member is not readable")),
        }
    }

    /// Write with a type check against the declared member type
    pub fn set(&self, target: &ObjectRef, value: Value) -> Result<()> {
        match &self.setter {
            Some(setter) => setter(target, value),
            None => Err(Error::member(&self.class, &self.member.name, "member is not writable")),
        }
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Accessor({}.{})", self.class, self.member.name)
    }
}

/// Builds and caches [`Accessor`]s
pub struct AccessorCompiler {
    registry: Arc<TypeRegistry>,
    cache: RwLock<HashMap<(String, String), Arc<Accessor>>>,
}

impl AccessorCompiler {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Accessor for `class.member`, compiled on first request
    pub fn accessor(&self, class: &str, member: &str) -> Result<Arc<Accessor>> {
        let key = (class.to_string(), member.to_string());
        if let Some(found) = self.cache.read().get(&key) {
            return Ok(Arc::clone(found));
        }

        let compiled = Arc::new(self.compile(class, member)?);
        // A racing thread may have won; both accessors are equivalent
        let mut cache = self.cache.write();
        Ok(Arc::clone(cache.entry(key).or_insert(compiled)))
    }

    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }

    fn compile(&self, class: &str, member: &str) -> Result<Accessor> {
        let descriptor = self.registry.class(class)?;
        let member_desc = descriptor
            .member(member)
            .cloned()
            .ok_or_else(|| Error::member(class, member, "no such member"))?;
        let slot = member_desc.slot;

        let getter: Option<Getter> = member_desc.readable.then(|| {
            let class = class.to_string();
            let name = member_desc.name.clone();
            Arc::new(move |target: &ObjectRef| {
                if target.class_name() != class {
                    return Err(Error::member(
                        target.class_name(),
                        &name,
                        format!("accessor bound to {}", class),
                    ));
                }
                Ok(target.get_slot(slot))
            }) as Getter
        });

        let setter: Option<Setter> = member_desc.writable.then(|| {
            let class = class.to_string();
            let name = member_desc.name.clone();
            let ty = member_desc.ty.clone();
            let registry = Arc::clone(&self.registry);
            Arc::new(move |target: &ObjectRef, value: Value| {
                if !registry.accepts(&ty, &value) {
                    return Err(Error::conversion(value.type_name(), ty.to_string(), value.to_string()));
                }
                if target.class_name() != class {
                    return Err(Error::member(
                        target.class_name(),
                        &name,
                        format!("accessor bound to {}", class),
                    ));
                }
                target.set_slot(slot, value);
                Ok(())
            }) as Setter
        });

        Ok(Accessor {
            class: class.to_string(),
            member: member_desc,
            getter,
            setter,
        })
    }
}
