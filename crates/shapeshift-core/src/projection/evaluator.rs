//! In-memory expression evaluator
//!
//! The reference backend for projections: it executes an [`Expr`] directly
//! against dynamic values. It also evaluates expression resolvers for the
//! eager mapper.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::ast::{Expr, Function, Lambda};
use crate::convert;
use crate::model::{collection_value, ScalarKind, TypeRegistry};
use crate::value::Value;
use crate::{Error, Result};
use rust_decimal::Decimal;

/// Parameter bindings visible to an expression, innermost last
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: Vec<(String, Value)>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bindings.push((name.into(), value));
        self
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    fn push(&mut self, name: &str, value: Value) {
        self.bindings.push((name.to_string(), value));
    }

    fn pop(&mut self) {
        self.bindings.pop();
    }
}

/// Executes expressions against values
pub struct Evaluator<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> Evaluator<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Apply a lambda to one argument
    pub fn apply(&self, lambda: &Lambda, argument: Value) -> Result<Value> {
        let mut scope = Scope::new().with(lambda.param.clone(), argument);
        self.eval(&lambda.body, &mut scope)
    }

    pub fn eval(&self, expr: &Expr, scope: &mut Scope) -> Result<Value> {
        match expr {
            Expr::Parameter { name } => scope
                .lookup(name)
                .cloned()
                .ok_or_else(|| Error::evaluation(format!("unbound parameter '{}'", name))),
            Expr::Constant { value } => Ok(value.to_value()),
            Expr::Member { target, member } => {
                let target = self.eval(target, scope)?;
                match target {
                    Value::Object(obj) => obj.get(member),
                    Value::Null => Err(Error::evaluation(format!(
                        "member access '.{}' on null in '{}'",
                        member, expr
                    ))),
                    other => Err(Error::evaluation(format!(
                        "member access '.{}' on {}",
                        member,
                        other.type_name()
                    ))),
                }
            }
            Expr::Invoke { target, method } => match self.eval(target, scope)? {
                Value::Object(obj) => obj.invoke(method),
                other => Err(Error::evaluation(format!(
                    "method call '.{}()' on {}",
                    method,
                    other.type_name()
                ))),
            },
            Expr::IsNull { operand } => Ok(Value::Bool(self.eval(operand, scope)?.is_null())),
            Expr::Condition {
                test,
                if_true,
                if_false,
            } => match self.eval(test, scope)? {
                Value::Bool(true) => self.eval(if_true, scope),
                Value::Bool(false) => self.eval(if_false, scope),
                other => Err(Error::evaluation(format!(
                    "condition must be bool, got {}",
                    other.type_name()
                ))),
            },
            Expr::Construct { class, bindings } => {
                let instance = self.registry.create_instance(class)?;
                let descriptor = instance.class().clone();
                for binding in bindings {
                    let member = descriptor.member(&binding.member).ok_or_else(|| {
                        Error::member(class.clone(), binding.member.clone(), "no such member")
                    })?;
                    let value = self.eval(&binding.value, scope)?;
                    if !self.registry.accepts(&member.ty, &value) {
                        return Err(Error::conversion(
                            value.type_name(),
                            member.ty.to_string(),
                            value.to_string(),
                        ));
                    }
                    instance.set(&binding.member, value)?;
                }
                Ok(Value::Object(instance))
            }
            Expr::Select {
                source,
                lambda,
                shape,
            } => {
                let source = self.eval(source, scope)?;
                let items = source.elements().ok_or_else(|| {
                    Error::evaluation(format!("select over {}", source.type_name()))
                })?;
                let mut projected = Vec::with_capacity(items.len());
                for item in items {
                    scope.push(&lambda.param, item.clone());
                    let result = self.eval(&lambda.body, scope);
                    scope.pop();
                    projected.push(result?);
                }
                Ok(collection_value(*shape, projected))
            }
            Expr::Convert { operand, to } => {
                let value = self.eval(operand, scope)?;
                convert::convert_to(value, to, self.registry)
            }
            Expr::Default { ty } => Ok(self.registry.zero_value(ty)),
            Expr::Call { function, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, scope))
                    .collect::<Result<Vec<_>>>()?;
                call(*function, args)
            }
        }
    }
}

fn call(function: Function, args: Vec<Value>) -> Result<Value> {
    match function {
        Function::Concat => Ok(Value::String(
            args.iter()
                .filter(|v| !v.is_null())
                .map(|v| v.to_string())
                .collect(),
        )),
        Function::Coalesce => Ok(args.into_iter().find(|v| !v.is_null()).unwrap_or_default()),
        Function::Count => match args.as_slice() {
            [value] => {
                let items = value.elements().ok_or_else(|| {
                    Error::evaluation(format!("count of {}", value.type_name()))
                })?;
                let count = i32::try_from(items.len())
                    .map_err(|_| Error::evaluation("collection too large to count"))?;
                Ok(Value::I32(count))
            }
            _ => Err(Error::evaluation("count takes exactly one argument")),
        },
        Function::Add | Function::Subtract | Function::Multiply => {
            let mut args = args.into_iter();
            let first = args
                .next()
                .ok_or_else(|| Error::evaluation(format!("{} needs arguments", function.name())))?;
            args.try_fold(first, |acc, next| arithmetic(function, acc, next))
        }
    }
}

/// Binary arithmetic with numeric promotion
///
/// Same-kind integers keep their kind (range-checked); mixed integers widen
/// to i64; any float yields f64; any decimal yields decimal. Adding text
/// concatenates.
fn arithmetic(function: Function, left: Value, right: Value) -> Result<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    if function == Function::Add
        && (matches!(left, Value::String(_)) || matches!(right, Value::String(_)))
    {
        return Ok(Value::String(format!("{}{}", left, right)));
    }

    let overflow = || Error::evaluation(format!("{} overflowed", function.name()));

    if let (Some(a), Some(b)) = (left.as_integer(), right.as_integer()) {
        let wide = match function {
            Function::Add => a.checked_add(b),
            Function::Subtract => a.checked_sub(b),
            _ => a.checked_mul(b),
        }
        .ok_or_else(overflow)?;
        let kind = match (left.scalar_kind(), right.scalar_kind()) {
            (Some(l), Some(r)) if l == r => l,
            _ => ScalarKind::I64,
        };
        return convert::narrow(wide, kind).ok_or_else(overflow);
    }

    if matches!(left, Value::Decimal(_)) || matches!(right, Value::Decimal(_)) {
        let a = decimal_operand(&left)?;
        let b = decimal_operand(&right)?;
        let result = match function {
            Function::Add => a.checked_add(b),
            Function::Subtract => a.checked_sub(b),
            _ => a.checked_mul(b),
        }
        .ok_or_else(overflow)?;
        return Ok(Value::Decimal(result));
    }

    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Ok(Value::F64(match function {
            Function::Add => a + b,
            Function::Subtract => a - b,
            _ => a * b,
        })),
        _ => Err(Error::evaluation(format!(
            "cannot {} {} and {}",
            function.name(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn decimal_operand(value: &Value) -> Result<Decimal> {
    match convert::convert_scalar(value, ScalarKind::Decimal)? {
        Value::Decimal(d) => Ok(d),
        other => Err(Error::evaluation(format!("expected decimal, got {}", other.type_name()))),
    }
}
