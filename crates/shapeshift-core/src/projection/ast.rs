//! Expression IR for deferred projections
//!
//! Expressions are pure: evaluating one never mutates its inputs. They are
//! serde serializable so a compiled projection can be handed to an external
//! backend, and `Display` as readable source text.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::model::{CollectionShape, TypeRef};
use crate::value::{EnumValue, Value};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Constant embedded in an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
    Enum(EnumValue),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(v) => Value::I64(*v),
            Literal::Float(v) => Value::F64(*v),
            Literal::Decimal(d) => Value::Decimal(*d),
            Literal::Text(s) => Value::String(s.clone()),
            Literal::DateTime(dt) => Value::DateTime(*dt),
            Literal::Uuid(id) => Value::Uuid(*id),
            Literal::Enum(e) => Value::Enum(e.clone()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Text(s) => write!(f, "{:?}", s),
            Literal::Enum(e) => write!(f, "{}.{}", e.enum_name, e.variant),
            other => write!(f, "{}", other.to_value()),
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

/// Built-in functions available to expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Function {
    /// Text concatenation; null arguments contribute nothing
    Concat,
    /// First non-null argument
    Coalesce,
    Add,
    Subtract,
    Multiply,
    /// Element count of a collection
    Count,
}

impl Function {
    pub fn name(self) -> &'static str {
        match self {
            Function::Concat => "concat",
            Function::Coalesce => "coalesce",
            Function::Add => "add",
            Function::Subtract => "subtract",
            Function::Multiply => "multiply",
            Function::Count => "count",
        }
    }
}

/// One member assignment inside a [`Expr::Construct`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub member: String,
    pub value: Expr,
}

/// Expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Expr {
    Parameter {
        name: String,
    },
    Constant {
        value: Literal,
    },
    Member {
        target: Box<Expr>,
        member: String,
    },
    IsNull {
        operand: Box<Expr>,
    },
    Condition {
        test: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    /// New instance of `class` with the bindings applied in order
    Construct {
        class: String,
        bindings: Vec<Binding>,
    },
    /// Element-wise projection of a sequence into a collection of `shape`
    Select {
        source: Box<Expr>,
        lambda: Box<Lambda>,
        shape: CollectionShape,
    },
    Convert {
        operand: Box<Expr>,
        to: TypeRef,
    },
    /// Zero value of a type
    Default {
        ty: TypeRef,
    },
    /// Zero-argument method call
    Invoke {
        target: Box<Expr>,
        method: String,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn param(name: impl Into<String>) -> Self {
        Expr::Parameter { name: name.into() }
    }

    pub fn constant(value: impl Into<Literal>) -> Self {
        Expr::Constant {
            value: value.into(),
        }
    }

    pub fn null() -> Self {
        Expr::Constant {
            value: Literal::Null,
        }
    }

    /// Member access on this expression
    pub fn member(self, member: impl Into<String>) -> Self {
        Expr::Member {
            target: Box::new(self),
            member: member.into(),
        }
    }

    /// Method call on this expression
    pub fn invoke(self, method: impl Into<String>) -> Self {
        Expr::Invoke {
            target: Box::new(self),
            method: method.into(),
        }
    }

    pub fn convert(self, to: TypeRef) -> Self {
        Expr::Convert {
            operand: Box::new(self),
            to,
        }
    }

    pub fn is_null(operand: Expr) -> Self {
        Expr::IsNull {
            operand: Box::new(operand),
        }
    }

    pub fn condition(test: Expr, if_true: Expr, if_false: Expr) -> Self {
        Expr::Condition {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    pub fn default_of(ty: TypeRef) -> Self {
        Expr::Default { ty }
    }

    pub fn construct(class: impl Into<String>, bindings: Vec<Binding>) -> Self {
        Expr::Construct {
            class: class.into(),
            bindings,
        }
    }

    pub fn select(source: Expr, lambda: Lambda, shape: CollectionShape) -> Self {
        Expr::Select {
            source: Box::new(source),
            lambda: Box::new(lambda),
            shape,
        }
    }

    pub fn call(function: Function, args: Vec<Expr>) -> Self {
        Expr::Call { function, args }
    }

    pub fn concat(args: Vec<Expr>) -> Self {
        Self::call(Function::Concat, args)
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        1 + match self {
            Expr::Parameter { .. } | Expr::Constant { .. } | Expr::Default { .. } => 0,
            Expr::Member { target, .. } | Expr::Invoke { target, .. } => target.node_count(),
            Expr::IsNull { operand } | Expr::Convert { operand, .. } => operand.node_count(),
            Expr::Condition {
                test,
                if_true,
                if_false,
            } => test.node_count() + if_true.node_count() + if_false.node_count(),
            Expr::Construct { bindings, .. } => bindings.iter().map(|b| b.value.node_count()).sum(),
            Expr::Select { source, lambda, .. } => source.node_count() + lambda.body.node_count(),
            Expr::Call { args, .. } => args.iter().map(Expr::node_count).sum(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Parameter { name } => write!(f, "{}", name),
            Expr::Constant { value } => write!(f, "{}", value),
            Expr::Member { target, member } => write!(f, "{}.{}", target, member),
            Expr::IsNull { operand } => write!(f, "({} == null)", operand),
            Expr::Condition {
                test,
                if_true,
                if_false,
            } => write!(f, "({} ? {} : {})", test, if_true, if_false),
            Expr::Construct { class, bindings } => {
                write!(f, "new {} {{ ", class)?;
                for (i, binding) in bindings.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", binding.member, binding.value)?;
                }
                write!(f, " }}")
            }
            Expr::Select {
                source,
                lambda,
                shape,
            } => {
                let collect = match shape {
                    CollectionShape::Array => "ToArray",
                    CollectionShape::Bag => "ToBag",
                    _ => "ToList",
                };
                write!(f, "{}.Select({}).{}()", source, lambda, collect)
            }
            Expr::Convert { operand, to } => write!(f, "(({}) {})", to, operand),
            Expr::Default { ty } => write!(f, "default({})", ty),
            Expr::Invoke { target, method } => write!(f, "{}.{}()", target, method),
            Expr::Call { function, args } => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Single-parameter function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    pub param: String,
    pub param_type: TypeRef,
    pub body: Expr,
}

impl Lambda {
    pub fn new(param: impl Into<String>, param_type: TypeRef, body: Expr) -> Self {
        Self {
            param: param.into(),
            param_type,
            body,
        }
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.param, self.body)
    }
}
