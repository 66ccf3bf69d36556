//! Class, member, method and enum descriptors
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::types::TypeRef;
use crate::value::{EnumValue, ObjectRef, Value};
use crate::Result;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Body of a zero-argument method
pub type MethodBody = Arc<dyn Fn(&ObjectRef) -> Result<Value> + Send + Sync>;

/// A public member of a class
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    pub name: String,
    pub ty: TypeRef,
    pub readable: bool,
    pub writable: bool,
    /// Field index inside an instance
    pub slot: usize,
}

/// A zero-argument method, used for flattening
#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: String,
    pub returns: TypeRef,
    body: MethodBody,
}

impl MethodDescriptor {
    pub fn call(&self, target: &ObjectRef) -> Result<Value> {
        (self.body)(target)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// Runtime shape of a class
#[derive(Debug)]
pub struct ClassDescriptor {
    name: String,
    members: Vec<MemberDescriptor>,
    index: HashMap<String, usize>,
    methods: HashMap<String, Arc<MethodDescriptor>>,
    constructible: bool,
}

impl ClassDescriptor {
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            members: Vec::new(),
            methods: Vec::new(),
            constructible: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in declaration order
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.index.get(name).map(|&i| &self.members[i])
    }

    pub fn method(&self, name: &str) -> Option<&Arc<MethodDescriptor>> {
        self.methods.get(name)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Arc<MethodDescriptor>> {
        self.methods.values()
    }

    /// Whether a zero-argument constructor exists
    pub fn is_constructible(&self) -> bool {
        self.constructible
    }
}

/// Fluent builder for [`ClassDescriptor`]
pub struct ClassBuilder {
    name: String,
    members: Vec<MemberDescriptor>,
    methods: Vec<MethodDescriptor>,
    constructible: bool,
}

impl ClassBuilder {
    /// Readable and writable member
    pub fn member(self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.member_with_access(name, ty, true, true)
    }

    /// Member without a setter
    pub fn read_only(self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.member_with_access(name, ty, true, false)
    }

    /// Member without a getter
    pub fn write_only(self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.member_with_access(name, ty, false, true)
    }

    pub fn member_with_access(
        mut self,
        name: impl Into<String>,
        ty: TypeRef,
        readable: bool,
        writable: bool,
    ) -> Self {
        let name = name.into();
        // Redeclaring a member replaces it in place
        if let Some(existing) = self.members.iter_mut().find(|m| m.name == name) {
            existing.ty = ty;
            existing.readable = readable;
            existing.writable = writable;
            return self;
        }
        let slot = self.members.len();
        self.members.push(MemberDescriptor {
            name,
            ty,
            readable,
            writable,
            slot,
        });
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, returns: TypeRef, body: F) -> Self
    where
        F: Fn(&ObjectRef) -> Result<Value> + Send + Sync + 'static,
    {
        self.methods.push(MethodDescriptor {
            name: name.into(),
            returns,
            body: Arc::new(body),
        });
        self
    }

    /// Mark the class as lacking a zero-argument constructor
    pub fn not_constructible(mut self) -> Self {
        self.constructible = false;
        self
    }

    pub fn constructible(mut self, constructible: bool) -> Self {
        self.constructible = constructible;
        self
    }

    pub fn build(self) -> ClassDescriptor {
        let index = self
            .members
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        let methods = self
            .methods
            .into_iter()
            .map(|m| (m.name.clone(), Arc::new(m)))
            .collect();
        ClassDescriptor {
            name: self.name,
            members: self.members,
            index,
            methods,
            constructible: self.constructible,
        }
    }
}

/// Runtime shape of an enum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    name: String,
    variants: Vec<(String, i64)>,
}

impl EnumDescriptor {
    pub fn new<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        EnumDescriptor {
            name: name.into(),
            variants: variants.into_iter().map(|(n, c)| (n.into(), c)).collect(),
        }
    }

    /// Variants numbered from zero in the given order
    pub fn from_names<I, S>(name: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, names.into_iter().zip(0i64..))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variants(&self) -> &[(String, i64)] {
        &self.variants
    }

    pub fn by_code(&self, code: i64) -> Option<EnumValue> {
        self.variants
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(n, c)| self.value_of(n, *c))
    }

    /// Exact match first, then case-insensitive
    pub fn by_name(&self, name: &str) -> Option<EnumValue> {
        self.variants
            .iter()
            .find(|(n, _)| n == name)
            .or_else(|| self.variants.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)))
            .map(|(n, c)| self.value_of(n, *c))
    }

    /// Value of an uninitialised member: the zero-coded variant, else the first
    pub fn default_value(&self) -> Option<EnumValue> {
        self.by_code(0).or_else(|| {
            self.variants.first().map(|(n, c)| self.value_of(n, *c))
        })
    }

    fn value_of(&self, variant: &str, code: i64) -> EnumValue {
        EnumValue {
            enum_name: self.name.clone(),
            variant: variant.to_string(),
            discriminant: code,
        }
    }
}
