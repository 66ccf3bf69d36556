//! Parameter rewriting and validation of custom expressions
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::ast::{Binding, Expr, Lambda};
use crate::model::{Classification, ScalarKind, TypeRef, TypeRegistry};
use crate::{Error, Result};
use std::collections::{BTreeSet, HashMap};

/// Parameter names referenced but not bound inside `expr`
pub fn free_parameters(expr: &Expr) -> BTreeSet<String> {
    let mut free = BTreeSet::new();
    collect_free(expr, &mut Vec::new(), &mut free);
    free
}

fn collect_free(expr: &Expr, bound: &mut Vec<String>, free: &mut BTreeSet<String>) {
    match expr {
        Expr::Parameter { name } => {
            if !bound.contains(name) {
                free.insert(name.clone());
            }
        }
        Expr::Constant { .. } | Expr::Default { .. } => {}
        Expr::Member { target, .. } | Expr::Invoke { target, .. } => collect_free(target, bound, free),
        Expr::IsNull { operand } | Expr::Convert { operand, .. } => collect_free(operand, bound, free),
        Expr::Condition {
            test,
            if_true,
            if_false,
        } => {
            collect_free(test, bound, free);
            collect_free(if_true, bound, free);
            collect_free(if_false, bound, free);
        }
        Expr::Construct { bindings, .. } => {
            for binding in bindings {
                collect_free(&binding.value, bound, free);
            }
        }
        Expr::Select { source, lambda, .. } => {
            collect_free(source, bound, free);
            bound.push(lambda.param.clone());
            collect_free(&lambda.body, bound, free);
            bound.pop();
        }
        Expr::Call { args, .. } => {
            for arg in args {
                collect_free(arg, bound, free);
            }
        }
    }
}

/// Replace free occurrences of `name` in `expr` with `replacement`
///
/// Inner lambdas that rebind `name` are left alone. An inner parameter that
/// would capture a free name of `replacement` is renamed first.
pub fn substitute(expr: &Expr, name: &str, replacement: &Expr) -> Expr {
    let replacement_free = free_parameters(replacement);
    substitute_inner(expr, name, replacement, &replacement_free)
}

/// Apply `lambda` to `argument` by substitution
pub fn inline(lambda: &Lambda, argument: &Expr) -> Expr {
    substitute(&lambda.body, &lambda.param, argument)
}

fn substitute_inner(expr: &Expr, name: &str, replacement: &Expr, replacement_free: &BTreeSet<String>) -> Expr {
    let recurse = |e: &Expr| substitute_inner(e, name, replacement, replacement_free);

    match expr {
        Expr::Parameter { name: p } if p == name => replacement.clone(),
        Expr::Parameter { .. } | Expr::Constant { .. } | Expr::Default { .. } => expr.clone(),
        Expr::Member { target, member } => Expr::Member {
            target: Box::new(recurse(target)),
            member: member.clone(),
        },
        Expr::Invoke { target, method } => Expr::Invoke {
            target: Box::new(recurse(target)),
            method: method.clone(),
        },
        Expr::IsNull { operand } => Expr::IsNull {
            operand: Box::new(recurse(operand)),
        },
        Expr::Convert { operand, to } => Expr::Convert {
            operand: Box::new(recurse(operand)),
            to: to.clone(),
        },
        Expr::Condition {
            test,
            if_true,
            if_false,
        } => Expr::Condition {
            test: Box::new(recurse(test)),
            if_true: Box::new(recurse(if_true)),
            if_false: Box::new(recurse(if_false)),
        },
        Expr::Construct { class, bindings } => Expr::Construct {
            class: class.clone(),
            bindings: bindings
                .iter()
                .map(|b| Binding {
                    member: b.member.clone(),
                    value: recurse(&b.value),
                })
                .collect(),
        },
        Expr::Call { function, args } => Expr::Call {
            function: *function,
            args: args.iter().map(recurse).collect(),
        },
        Expr::Select {
            source,
            lambda,
            shape,
        } => {
            let source = Box::new(recurse(source));
            let lambda = if lambda.param == name {
                lambda.clone()
            } else if replacement_free.contains(&lambda.param) {
                let mut taken = free_parameters(&lambda.body);
                taken.extend(replacement_free.iter().cloned());
                let fresh = fresh_name(&lambda.param, &taken);
                let renamed = substitute(&lambda.body, &lambda.param, &Expr::param(fresh.clone()));
                Box::new(Lambda {
                    param: fresh,
                    param_type: lambda.param_type.clone(),
                    body: substitute_inner(&renamed, name, replacement, replacement_free),
                })
            } else {
                Box::new(Lambda {
                    param: lambda.param.clone(),
                    param_type: lambda.param_type.clone(),
                    body: recurse(&lambda.body),
                })
            };
            Expr::Select {
                source,
                lambda,
                shape: *shape,
            }
        }
    }
}

fn fresh_name(base: &str, taken: &BTreeSet<String>) -> String {
    (1..)
        .map(|n| format!("{}{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Check a custom expression against the source type it will be applied to
///
/// The lambda's body may only reference its own parameter, and every member
/// access and method call whose target type is known must resolve.
pub fn validate_lambda(lambda: &Lambda, source: &TypeRef, registry: &TypeRegistry) -> Result<()> {
    let free = free_parameters(&lambda.body);
    if free.len() > 1 || free.iter().any(|p| p != &lambda.param) {
        return Err(Error::configuration(
            format!(
                "expression '{}' references unbound parameters: {}",
                lambda,
                free.iter().filter(|p| *p != &lambda.param).cloned().collect::<Vec<_>>().join(", ")
            ),
            None,
        ));
    }

    let mut env = HashMap::new();
    env.insert(lambda.param.clone(), source.clone());
    static_type(&lambda.body, &env, registry).map(|_| ())
}

/// Best-effort static type of an expression; `None` when unknown
fn static_type(expr: &Expr, env: &HashMap<String, TypeRef>, registry: &TypeRegistry) -> Result<Option<TypeRef>> {
    let ty = match expr {
        Expr::Parameter { name } => env.get(name).cloned(),
        Expr::Constant { .. } => None,
        Expr::Call { args, .. } => {
            for arg in args {
                static_type(arg, env, registry)?;
            }
            None
        }
        Expr::Default { ty } => Some(ty.clone()),
        Expr::Convert { operand, to } => {
            static_type(operand, env, registry)?;
            Some(to.clone())
        }
        Expr::IsNull { operand } => {
            static_type(operand, env, registry)?;
            Some(TypeRef::scalar(ScalarKind::Bool))
        }
        Expr::Condition {
            test,
            if_true,
            if_false,
        } => {
            static_type(test, env, registry)?;
            let a = static_type(if_true, env, registry)?;
            let b = static_type(if_false, env, registry)?;
            a.or(b)
        }
        Expr::Member { target, member } => match class_of(static_type(target, env, registry)?, registry) {
            Some(class) => {
                let descriptor = registry.class(&class)?;
                let found = descriptor.member(member).filter(|m| m.readable).ok_or_else(|| {
                    Error::configuration(
                        format!("{} has no readable member '{}' (in '{}')", class, member, expr),
                        None,
                    )
                })?;
                Some(found.ty.clone())
            }
            None => None,
        },
        Expr::Invoke { target, method } => match class_of(static_type(target, env, registry)?, registry) {
            Some(class) => {
                let descriptor = registry.class(&class)?;
                let found = descriptor.method(method).ok_or_else(|| {
                    Error::configuration(format!("{} has no method '{}' (in '{}')", class, method, expr), None)
                })?;
                Some(found.returns.clone())
            }
            None => None,
        },
        Expr::Construct { class, bindings } => {
            let descriptor = registry.class(class)?;
            for binding in bindings {
                if descriptor.member(&binding.member).filter(|m| m.writable).is_none() {
                    return Err(Error::configuration(
                        format!("{} has no writable member '{}'", class, binding.member),
                        None,
                    ));
                }
                static_type(&binding.value, env, registry)?;
            }
            Some(TypeRef::named(class.clone()))
        }
        Expr::Select {
            source,
            lambda,
            shape,
        } => {
            let source_ty = static_type(source, env, registry)?;
            let element = match &lambda.param_type {
                TypeRef::Any => source_ty.as_ref().and_then(|t| t.strip_optional().element().cloned()),
                declared => Some(declared.clone()),
            };
            let mut inner = env.clone();
            match element {
                Some(element) => inner.insert(lambda.param.clone(), element),
                None => inner.remove(&lambda.param),
            };
            let body = static_type(&lambda.body, &inner, registry)?;
            Some(TypeRef::collection(*shape, body.unwrap_or(TypeRef::Any)))
        }
    };
    Ok(ty)
}

fn class_of(ty: Option<TypeRef>, registry: &TypeRegistry) -> Option<String> {
    let ty = ty?;
    let stripped = ty.strip_optional();
    match registry.classify(stripped) {
        Ok(Classification::Class) => stripped.name().map(str::to_string),
        _ => None,
    }
}
