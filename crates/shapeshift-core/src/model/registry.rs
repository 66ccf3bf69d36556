//! Type registry: the introspection surface the mapper compiles against
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::descriptor::{ClassDescriptor, EnumDescriptor};
use super::types::{Classification, CollectionShape, ScalarKind, TypeRef};
use crate::convert;
use crate::value::{ObjectRef, Value};
use crate::{Error, Result};
use chrono::NaiveDateTime;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Registered classes and enums
///
/// Registration takes `&self` so a registry can be shared behind an `Arc`.
/// Types are expected to be registered at startup, before the first compile
/// that refers to them.
#[derive(Default)]
pub struct TypeRegistry {
    classes: RwLock<HashMap<String, Arc<ClassDescriptor>>>,
    enums: RwLock<HashMap<String, Arc<EnumDescriptor>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_class(&self, class: ClassDescriptor) -> Arc<ClassDescriptor> {
        let class = Arc::new(class);
        let previous = self
            .classes
            .write()
            .insert(class.name().to_string(), Arc::clone(&class));
        if previous.is_some() {
            log::debug!("Class {} re-registered", class.name());
        }
        class
    }

    pub fn register_enum(&self, descriptor: EnumDescriptor) -> Arc<EnumDescriptor> {
        let descriptor = Arc::new(descriptor);
        self.enums
            .write()
            .insert(descriptor.name().to_string(), Arc::clone(&descriptor));
        descriptor
    }

    pub fn find_class(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes.read().get(name).cloned()
    }

    pub fn find_enum(&self, name: &str) -> Option<Arc<EnumDescriptor>> {
        self.enums.read().get(name).cloned()
    }

    pub fn class(&self, name: &str) -> Result<Arc<ClassDescriptor>> {
        self.find_class(name).ok_or_else(|| Error::UnknownType {
            name: name.to_string(),
        })
    }

    pub fn enum_type(&self, name: &str) -> Result<Arc<EnumDescriptor>> {
        self.find_enum(name).ok_or_else(|| Error::UnknownType {
            name: name.to_string(),
        })
    }

    /// Registered class names, sorted
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.classes.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_enum(&self, ty: &TypeRef) -> bool {
        ty.name().is_some_and(|n| self.enums.read().contains_key(n))
    }

    pub fn is_class(&self, ty: &TypeRef) -> bool {
        matches!(ty, TypeRef::Named(n) if self.classes.read().contains_key(n))
    }

    /// Classify a declared type
    ///
    /// Enums and `any` count as scalars; an optional type classifies as the
    /// type it wraps.
    pub fn classify(&self, ty: &TypeRef) -> Result<Classification> {
        match ty {
            TypeRef::Any | TypeRef::Scalar(_) => Ok(Classification::Scalar),
            TypeRef::Optional(inner) => self.classify(inner),
            TypeRef::Collection { .. } => Ok(Classification::Collection),
            TypeRef::Named(name) => {
                if self.classes.read().contains_key(name) {
                    Ok(Classification::Class)
                } else if self.enums.read().contains_key(name) {
                    Ok(Classification::Scalar)
                } else {
                    Err(Error::UnknownType { name: name.clone() })
                }
            }
        }
    }

    /// Element type of a collection type
    pub fn element_type(&self, ty: &TypeRef) -> Option<TypeRef> {
        ty.strip_optional().element().cloned()
    }

    /// Freshly constructed instance with every member at its zero value
    pub fn create_instance(&self, name: &str) -> Result<ObjectRef> {
        let class = self.class(name)?;
        if !class.is_constructible() {
            return Err(Error::configuration(
                format!("{} has no zero-argument constructor", name),
                None,
            ));
        }
        Ok(self.instantiate(class))
    }

    /// Instance of `class` regardless of its constructor, for data loading
    pub(crate) fn instantiate(&self, class: Arc<ClassDescriptor>) -> ObjectRef {
        let fields = class.members().iter().map(|m| self.zero_value(&m.ty)).collect();
        ObjectRef::new(class, fields)
    }

    /// Value an unset member of this type holds
    pub fn zero_value(&self, ty: &TypeRef) -> Value {
        match ty {
            TypeRef::Scalar(kind) => scalar_zero(*kind),
            TypeRef::Named(name) => self
                .find_enum(name)
                .and_then(|e| e.default_value())
                .map(Value::Enum)
                .unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Whether `value` satisfies the declared type
    pub fn accepts(&self, ty: &TypeRef, value: &Value) -> bool {
        match (ty, value) {
            (TypeRef::Any, _) => true,
            (TypeRef::Optional(inner), v) => v.is_null() || self.accepts(inner, v),
            (TypeRef::Scalar(kind), Value::Null) => kind.is_nullable(),
            (TypeRef::Scalar(kind), v) => v.scalar_kind() == Some(*kind),
            (TypeRef::Named(name), Value::Null) => self.classes.read().contains_key(name),
            (TypeRef::Named(name), Value::Object(obj)) => obj.class_name() == name,
            (TypeRef::Named(name), Value::Enum(e)) => &e.enum_name == name,
            (TypeRef::Named(_), _) => false,
            (TypeRef::Collection { .. }, Value::Null) => true,
            (TypeRef::Collection { shape, element }, v) => {
                let items = match (shape, v) {
                    (CollectionShape::Array, Value::Array(items)) => items,
                    (CollectionShape::List, Value::List(items)) => items,
                    (CollectionShape::Bag, Value::Bag(items)) => items,
                    (s, Value::List(items) | Value::Array(items)) if s.is_interface() => items,
                    _ => return false,
                };
                items.iter().all(|item| self.accepts(element, item))
            }
        }
    }

    /// Static type describing a runtime value
    pub fn type_of(&self, value: &Value) -> TypeRef {
        match value {
            Value::Null => TypeRef::Any,
            Value::Enum(e) => TypeRef::named(e.enum_name.clone()),
            Value::Object(obj) => TypeRef::named(obj.class_name()),
            Value::Array(_) => TypeRef::array(TypeRef::Any),
            Value::List(_) => TypeRef::list(TypeRef::Any),
            Value::Bag(_) => TypeRef::bag(),
            scalar => scalar.scalar_kind().map(TypeRef::Scalar).unwrap_or(TypeRef::Any),
        }
    }

    /// Build a typed value from JSON
    pub fn value_from_json(&self, ty: &TypeRef, json: &serde_json::Value) -> Result<Value> {
        use serde_json::Value as Json;

        if json.is_null() {
            return Ok(Value::Null);
        }

        match ty {
            TypeRef::Optional(inner) => self.value_from_json(inner, json),
            TypeRef::Any => infer_from_json(json),
            TypeRef::Scalar(kind) => {
                let raw = infer_from_json(json)?;
                convert::convert_scalar(&raw, *kind)
            }
            TypeRef::Named(name) => {
                if let Some(descriptor) = self.find_enum(name) {
                    let raw = infer_from_json(json)?;
                    return convert::convert_enum(&raw, &descriptor);
                }
                let class = self.class(name)?;
                let Json::Object(map) = json else {
                    return Err(Error::conversion("json", name.clone(), json.to_string()));
                };
                let instance = self.instantiate(Arc::clone(&class));
                for (key, item) in map {
                    let member = class
                        .member(key)
                        .ok_or_else(|| Error::member(name.clone(), key.clone(), "no such member"))?;
                    let value = self.value_from_json(&member.ty, item)?;
                    instance.set_slot(member.slot, value);
                }
                Ok(Value::Object(instance))
            }
            TypeRef::Collection { shape, element } => {
                let Json::Array(items) = json else {
                    return Err(Error::conversion("json", ty.to_string(), json.to_string()));
                };
                let values = items
                    .iter()
                    .map(|item| self.value_from_json(element, item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(collection_value(*shape, values))
            }
        }
    }
}

/// Wrap elements in the runtime representation of a collection shape
pub fn collection_value(shape: CollectionShape, items: Vec<Value>) -> Value {
    match shape {
        CollectionShape::Array => Value::Array(items),
        CollectionShape::Bag => Value::Bag(items),
        _ => Value::List(items),
    }
}

fn scalar_zero(kind: ScalarKind) -> Value {
    match kind {
        ScalarKind::Bool => Value::Bool(false),
        ScalarKind::Char => Value::Char('\0'),
        ScalarKind::I8 => Value::I8(0),
        ScalarKind::I16 => Value::I16(0),
        ScalarKind::I32 => Value::I32(0),
        ScalarKind::I64 => Value::I64(0),
        ScalarKind::U8 => Value::U8(0),
        ScalarKind::U16 => Value::U16(0),
        ScalarKind::U32 => Value::U32(0),
        ScalarKind::U64 => Value::U64(0),
        ScalarKind::F32 => Value::F32(0.0),
        ScalarKind::F64 => Value::F64(0.0),
        ScalarKind::Decimal => Value::Decimal(Decimal::ZERO),
        ScalarKind::String => Value::Null,
        ScalarKind::DateTime => Value::DateTime(NaiveDateTime::default()),
        ScalarKind::Uuid => Value::Uuid(Uuid::nil()),
    }
}

fn infer_from_json(json: &serde_json::Value) -> Result<Value> {
    use serde_json::Value as Json;

    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => {
            if let Some(v) = n.as_i64() {
                Ok(Value::I64(v))
            } else if let Some(v) = n.as_u64() {
                Ok(Value::U64(v))
            } else {
                Ok(Value::F64(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        Json::String(s) => Ok(Value::String(s.clone())),
        Json::Array(items) => Ok(Value::Bag(
            items.iter().map(infer_from_json).collect::<Result<Vec<_>>>()?,
        )),
        Json::Object(_) => Err(Error::conversion("json object", "any", json.to_string())),
    }
}
