//! Flattening: deriving a destination member from nested source data
//!
//! A destination member `Total` with no same-named source member is sourced
//! from a zero-argument `GetTotal` method, else by splitting the name into a
//! chain of nested source members (`BClassTotal` -> `BClass.Total`).
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::model::{ClassDescriptor, Classification, MethodDescriptor, TypeRef, TypeRegistry};
use crate::Result;
use std::sync::Arc;

/// Prefix of flattening methods
pub const METHOD_PREFIX: &str = "Get";

/// One member access along a flattening path
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenHop {
    pub class: String,
    pub member: String,
    pub ty: TypeRef,
}

/// Zero-argument `Get<member>` method on the source class
pub fn find_method(source: &ClassDescriptor, member: &str) -> Option<Arc<MethodDescriptor>> {
    source.method(&format!("{}{}", METHOD_PREFIX, member)).cloned()
}

/// Decompose `member` into a chain of readable source members
///
/// Prefixes are tried longest first; a prefix that does not lead to a full
/// match is abandoned for the next candidate.
pub fn find_path(
    registry: &TypeRegistry,
    source: &ClassDescriptor,
    member: &str,
) -> Result<Option<Vec<FlattenHop>>> {
    let mut chain = Vec::new();
    if search(registry, source, member, &mut chain)? && chain.len() > 1 {
        Ok(Some(chain))
    } else {
        Ok(None)
    }
}

fn search(
    registry: &TypeRegistry,
    class: &ClassDescriptor,
    remaining: &str,
    chain: &mut Vec<FlattenHop>,
) -> Result<bool> {
    // Suffix match ends the path, but only below the root
    if !chain.is_empty() {
        if let Some(found) = class.member(remaining).filter(|m| m.readable) {
            chain.push(hop(class, &found.name, &found.ty));
            return Ok(true);
        }
    }

    let mut candidates: Vec<_> = class
        .members()
        .iter()
        .filter(|m| m.readable && m.name.len() < remaining.len() && remaining.starts_with(&m.name))
        .collect();
    candidates.sort_by(|a, b| b.name.len().cmp(&a.name.len()));

    for candidate in candidates {
        if registry.classify(&candidate.ty)? != Classification::Class {
            continue;
        }
        let Some(name) = candidate.ty.name() else {
            continue;
        };
        let nested = registry.class(name)?;
        chain.push(hop(class, &candidate.name, &candidate.ty));
        if search(registry, &nested, &remaining[candidate.name.len()..], chain)? {
            return Ok(true);
        }
        chain.pop();
    }
    Ok(false)
}

fn hop(class: &ClassDescriptor, member: &str, ty: &TypeRef) -> FlattenHop {
    FlattenHop {
        class: class.name().to_string(),
        member: member.to_string(),
        ty: ty.clone(),
    }
}
