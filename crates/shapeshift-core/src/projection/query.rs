//! Deferred evaluation providers
//!
//! A [`QuerySource`] receives the compiled projection lambda and decides how
//! to run it. [`InMemoryQuery`] is the reference provider: it evaluates the
//! lambda lazily, one element at a time, with the in-memory [`Evaluator`].
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::ast::Lambda;
use super::evaluator::Evaluator;
use crate::model::{TypeRef, TypeRegistry};
use crate::value::Value;
use crate::Result;
use std::sync::Arc;

/// A sequence that can accept a projection
pub trait QuerySource {
    /// What [`select`](Self::select) produces
    type Output;

    /// Static type of the sequence's elements
    fn element_type(&self) -> &TypeRef;

    /// Attach the projection; execution may be deferred
    fn select(self, projection: Arc<Lambda>) -> Self::Output;
}

/// In-memory sequence of values
pub struct InMemoryQuery {
    registry: Arc<TypeRegistry>,
    element_type: TypeRef,
    items: Vec<Value>,
}

impl InMemoryQuery {
    pub fn new(registry: Arc<TypeRegistry>, element_type: TypeRef, items: Vec<Value>) -> Self {
        Self {
            registry,
            element_type,
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl QuerySource for InMemoryQuery {
    type Output = Projected;

    fn element_type(&self) -> &TypeRef {
        &self.element_type
    }

    fn select(self, projection: Arc<Lambda>) -> Projected {
        Projected {
            registry: self.registry,
            projection,
            items: self.items.into_iter(),
        }
    }
}

/// Lazy projected sequence; each element is evaluated when pulled
pub struct Projected {
    registry: Arc<TypeRegistry>,
    projection: Arc<Lambda>,
    items: std::vec::IntoIter<Value>,
}

impl Projected {
    /// The expression being applied
    pub fn projection(&self) -> &Lambda {
        &self.projection
    }
}

impl Iterator for Projected {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.items.next()?;
        Some(Evaluator::new(&self.registry).apply(&self.projection, item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}
