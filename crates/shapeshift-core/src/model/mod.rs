//! Runtime type model
//!
//! Rust has no runtime reflection, so the shapes the mapper works with are
//! described explicitly and kept in a [`TypeRegistry`].
//!
//! # Module Organization
//!
//! - [`types`] - Declared types and their text form
//! - [`descriptor`] - Class, member, method and enum descriptors
//! - [`registry`] - Type registry, classification and the object factory
//! - [`accessor`] - Compiled, cached member accessors
//!
//! # Examples
//!
//! ```
//! use shapeshift_core::model::{ClassDescriptor, TypeRegistry, TypeRef, Classification};
//!
//! let registry = TypeRegistry::new();
//! registry.register_class(
//!     ClassDescriptor::builder("Customer")
//!         .member("Id", "i32".parse().unwrap())
//!         .member("Orders", "List<Order>".parse().unwrap())
//!         .build(),
//! );
//!
//! let orders: TypeRef = "List<Order>".parse().unwrap();
//! assert_eq!(registry.classify(&orders).unwrap(), Classification::Collection);
//! ```
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod accessor;
pub mod descriptor;
pub mod registry;
pub mod types;

#[cfg(test)]
mod tests;

pub use accessor::{Accessor, AccessorCompiler, Getter, Setter};
pub use descriptor::{
    ClassBuilder, ClassDescriptor, EnumDescriptor, MemberDescriptor, MethodBody, MethodDescriptor,
};
pub use registry::{collection_value, TypeRegistry};
pub use types::{Classification, CollectionShape, ScalarKind, TypeRef};
