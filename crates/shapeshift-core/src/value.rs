//! Dynamic instance data
//!
//! Instances of registered classes are shared, interior-mutable
//! [`ObjectRef`]s so that aliasing, in-place population of an existing
//! destination and self-referential graphs can all be expressed.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::model::{ClassDescriptor, ScalarKind};
use crate::{Error, Result};
use chrono::NaiveDateTime;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Text layout used when date/time values are rendered
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A value of a registered enum type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumValue {
    pub enum_name: String,
    pub variant: String,
    pub discriminant: i64,
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.variant)
    }
}

/// Dynamically typed value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    String(String),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
    Enum(EnumValue),
    Object(ObjectRef),
    /// Fixed-size array
    Array(Vec<Value>),
    /// Growable list, also used for interface-typed collections
    List(Vec<Value>),
    /// Untyped legacy collection
    Bag(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Runtime scalar kind, if this is a built-in scalar
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        let kind = match self {
            Value::Bool(_) => ScalarKind::Bool,
            Value::Char(_) => ScalarKind::Char,
            Value::I8(_) => ScalarKind::I8,
            Value::I16(_) => ScalarKind::I16,
            Value::I32(_) => ScalarKind::I32,
            Value::I64(_) => ScalarKind::I64,
            Value::U8(_) => ScalarKind::U8,
            Value::U16(_) => ScalarKind::U16,
            Value::U32(_) => ScalarKind::U32,
            Value::U64(_) => ScalarKind::U64,
            Value::F32(_) => ScalarKind::F32,
            Value::F64(_) => ScalarKind::F64,
            Value::Decimal(_) => ScalarKind::Decimal,
            Value::String(_) => ScalarKind::String,
            Value::DateTime(_) => ScalarKind::DateTime,
            Value::Uuid(_) => ScalarKind::Uuid,
            _ => return None,
        };
        Some(kind)
    }

    /// Short runtime type name used in error messages
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Enum(e) => e.enum_name.clone(),
            Value::Object(obj) => obj.class_name().to_string(),
            Value::Array(_) => "Array".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Bag(_) => "Bag".to_string(),
            scalar => scalar
                .scalar_kind()
                .map(|k| k.name().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Any integer widened to `i128`
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::I8(v) => Some(i128::from(*v)),
            Value::I16(v) => Some(i128::from(*v)),
            Value::I32(v) => Some(i128::from(*v)),
            Value::I64(v) => Some(i128::from(*v)),
            Value::U8(v) => Some(i128::from(*v)),
            Value::U16(v) => Some(i128::from(*v)),
            Value::U32(v) => Some(i128::from(*v)),
            Value::U64(v) => Some(i128::from(*v)),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|v| i64::try_from(v).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(f64::from(*v)),
            Value::F64(v) => Some(*v),
            other => other.as_integer().map(|v| v as f64),
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Elements of any collection value
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::List(items) | Value::Bag(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        self.elements().is_some()
    }

    /// Render as JSON
    ///
    /// Objects become JSON objects keyed by member name. A back-reference to
    /// an object already being rendered is written as `null`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut path = HashSet::new();
        self.to_json_inner(&mut path)
    }

    fn to_json_inner(&self, path: &mut HashSet<usize>) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Char(c) => Json::String(c.to_string()),
            Value::I8(v) => Json::from(*v),
            Value::I16(v) => Json::from(*v),
            Value::I32(v) => Json::from(*v),
            Value::I64(v) => Json::from(*v),
            Value::U8(v) => Json::from(*v),
            Value::U16(v) => Json::from(*v),
            Value::U32(v) => Json::from(*v),
            Value::U64(v) => Json::from(*v),
            Value::F32(v) => serde_json::Number::from_f64(f64::from(*v))
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::F64(v) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Decimal(d) => Json::String(d.to_string()),
            Value::String(s) => Json::String(s.clone()),
            Value::DateTime(dt) => Json::String(dt.format(DATETIME_FORMAT).to_string()),
            Value::Uuid(id) => Json::String(id.hyphenated().to_string()),
            Value::Enum(e) => Json::String(e.variant.clone()),
            Value::Array(items) | Value::List(items) | Value::Bag(items) => {
                Json::Array(items.iter().map(|item| item.to_json_inner(path)).collect())
            }
            Value::Object(obj) => {
                let id = obj.id();
                if !path.insert(id) {
                    log::warn!(
                        "Cyclic reference to {} rendered as null",
                        obj.class_name()
                    );
                    return Json::Null;
                }
                let mut map = serde_json::Map::new();
                for (member, value) in obj.entries() {
                    map.insert(member, value.to_json_inner(path));
                }
                path.remove(&id);
                Json::Object(map)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v.format(DATETIME_FORMAT)),
            Value::Uuid(v) => write!(f, "{}", v.hyphenated()),
            Value::Enum(v) => write!(f, "{}", v),
            Value::Object(obj) => write!(f, "{} {{ .. }}", obj.class_name()),
            Value::Array(items) | Value::List(items) | Value::Bag(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
    String => String,
    NaiveDateTime => DateTime,
    Uuid => Uuid,
    EnumValue => Enum,
    ObjectRef => Object,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Field storage of a class instance
struct Instance {
    class: Arc<ClassDescriptor>,
    fields: RwLock<Vec<Value>>,
}

/// Shared reference to a class instance
///
/// Cloning the reference aliases the instance. Equality is identity.
#[derive(Clone)]
pub struct ObjectRef(Arc<Instance>);

impl ObjectRef {
    /// Wrap field values laid out in the class's slot order
    pub(crate) fn new(class: Arc<ClassDescriptor>, fields: Vec<Value>) -> Self {
        ObjectRef(Arc::new(Instance {
            class,
            fields: RwLock::new(fields),
        }))
    }

    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.0.class
    }

    pub fn class_name(&self) -> &str {
        self.0.class.name()
    }

    /// Read a member by name
    ///
    /// This is the raw instance API: it ignores the member's readability,
    /// which is only enforced by compiled accessors.
    pub fn get(&self, member: &str) -> Result<Value> {
        let slot = self.slot_of(member)?;
        Ok(self.get_slot(slot))
    }

    /// Write a member by name without type checking
    pub fn set(&self, member: &str, value: impl Into<Value>) -> Result<()> {
        let slot = self.slot_of(member)?;
        self.set_slot(slot, value.into());
        Ok(())
    }

    /// Builder-style [`set`](Self::set) for constructing test and fixture data
    pub fn with(self, member: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(member, value)?;
        Ok(self)
    }

    /// Call a zero-argument method declared on the class
    pub fn invoke(&self, method: &str) -> Result<Value> {
        let descriptor = self.0.class.method(method).ok_or_else(|| {
            Error::member(self.class_name(), method, "no such method")
        })?;
        descriptor.call(self)
    }

    /// Member names and current values, in declaration order
    pub fn entries(&self) -> Vec<(String, Value)> {
        let fields = self.0.fields.read();
        self.0
            .class
            .members()
            .iter()
            .map(|m| (m.name.clone(), fields.get(m.slot).cloned().unwrap_or_default()))
            .collect()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn get_slot(&self, slot: usize) -> Value {
        self.0.fields.read().get(slot).cloned().unwrap_or_default()
    }

    pub(crate) fn set_slot(&self, slot: usize, value: Value) {
        let mut fields = self.0.fields.write();
        if let Some(field) = fields.get_mut(slot) {
            *field = value;
        }
    }

    fn slot_of(&self, member: &str) -> Result<usize> {
        self.0
            .class
            .member(member)
            .map(|m| m.slot)
            .ok_or_else(|| Error::member(self.class_name(), member, "no such member"))
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shallow: fields may point back at this instance
        write!(f, "ObjectRef({}@{:#x})", self.class_name(), self.id())
    }
}
