//! Tests for expressions and the projection compiler
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::model::{ClassDescriptor, CollectionShape, ScalarKind};
    use crate::value::{ObjectRef, Value};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn text() -> TypeRef {
        TypeRef::scalar(ScalarKind::String)
    }

    fn registry() -> Arc<TypeRegistry> {
        let registry = TypeRegistry::new();
        registry.register_class(
            ClassDescriptor::builder("Address")
                .member("City", text())
                .build(),
        );
        registry.register_class(
            ClassDescriptor::builder("AddressDto")
                .member("City", text())
                .build(),
        );
        registry.register_class(
            ClassDescriptor::builder("Order")
                .member("Total", TypeRef::scalar(ScalarKind::F64))
                .build(),
        );
        registry.register_class(
            ClassDescriptor::builder("OrderDto")
                .member("Total", TypeRef::scalar(ScalarKind::Decimal))
                .build(),
        );
        registry.register_class(
            ClassDescriptor::builder("Person")
                .member("Name", text())
                .member("Surname", text())
                .member("Age", TypeRef::scalar(ScalarKind::I32))
                .member("Address", TypeRef::named("Address"))
                .member("Orders", TypeRef::list(TypeRef::named("Order")))
                .method("GetInitials", text(), |p| {
                    let name = p.get("Name")?;
                    Ok(Value::from(name.as_str().and_then(|n| n.get(..1)).unwrap_or("")))
                })
                .build(),
        );
        registry.register_class(
            ClassDescriptor::builder("PersonDto")
                .member("Name", text())
                .member("Age", text())
                .member("Address", TypeRef::named("AddressDto"))
                .member("AddressCity", text())
                .member("Orders", TypeRef::array(TypeRef::named("OrderDto")))
                .member("Initials", text())
                .member("FullName", text())
                .build(),
        );
        registry.register_class(
            ClassDescriptor::builder("Node")
                .member("Name", text())
                .member("Children", TypeRef::list(TypeRef::named("Node")))
                .member("Parent", TypeRef::named("Node"))
                .build(),
        );
        registry.register_class(
            ClassDescriptor::builder("NodeDto")
                .member("Name", text())
                .member("Children", TypeRef::list(TypeRef::named("NodeDto")))
                .member("Parent", TypeRef::named("NodeDto"))
                .build(),
        );
        registry.register_class(
            ClassDescriptor::builder("Branch")
                .member("Child", TypeRef::optional(TypeRef::named("Address")))
                .member("Items", TypeRef::optional(TypeRef::list(TypeRef::named("Address"))))
                .build(),
        );
        registry.register_class(
            ClassDescriptor::builder("BranchDto")
                .member("Child", TypeRef::optional(TypeRef::named("AddressDto")))
                .member("Items", TypeRef::optional(TypeRef::list(TypeRef::named("AddressDto"))))
                .build(),
        );
        Arc::new(registry)
    }

    fn compiler(registry: &Arc<TypeRegistry>) -> (ProjectionCompiler, Arc<ConfigRegistry>) {
        let configs = Arc::new(ConfigRegistry::new());
        (ProjectionCompiler::new(Arc::clone(registry), Arc::clone(&configs)), configs)
    }

    fn person(registry: &TypeRegistry, address: Option<&str>) -> ObjectRef {
        let person = registry.create_instance("Person").unwrap();
        person.set("Name", "Ada").unwrap();
        person.set("Surname", "Lovelace").unwrap();
        person.set("Age", 36i32).unwrap();
        if let Some(city) = address {
            let addr = registry.create_instance("Address").unwrap();
            addr.set("City", city).unwrap();
            person.set("Address", addr).unwrap();
        }
        let orders = [10.5, 20.25]
            .iter()
            .map(|total| {
                let order = registry.create_instance("Order").unwrap();
                order.set("Total", *total).unwrap();
                Value::Object(order)
            })
            .collect();
        person.set("Orders", Value::List(orders)).unwrap();
        person
    }

    fn full_name() -> Lambda {
        Lambda::new(
            "p",
            TypeRef::named("Person"),
            Expr::concat(vec![
                Expr::param("p").member("Name"),
                Expr::constant(" "),
                Expr::param("p").member("Surname"),
            ]),
        )
    }

    #[test]
    fn test_free_parameters_respect_select_binding() {
        let expr = Expr::select(
            Expr::param("p").member("Orders"),
            Lambda::new("o", TypeRef::named("Order"), Expr::param("o").member("Total")),
            CollectionShape::List,
        );
        let free = rewrite::free_parameters(&expr);
        assert_eq!(free.into_iter().collect::<Vec<_>>(), vec!["p".to_string()]);
    }

    #[test]
    fn test_substitute_avoids_capture() {
        // Replacing `x` with `o` must not be captured by the inner `o`
        let expr = Expr::select(
            Expr::param("x").member("Orders"),
            Lambda::new(
                "o",
                TypeRef::Any,
                Expr::concat(vec![Expr::param("o").member("Total"), Expr::param("x").member("Name")]),
            ),
            CollectionShape::List,
        );
        let rewritten = rewrite::substitute(&expr, "x", &Expr::param("o"));
        let free = rewrite::free_parameters(&rewritten);
        assert!(free.contains("o"));
        assert_eq!(free.len(), 1);
        assert!(rewritten.to_string().starts_with("o.Orders.Select("));
        assert!(!rewritten.to_string().contains("o => concat(o.Total, o.Name)"));
    }

    #[test]
    fn test_validate_lambda_rejects_unbound_and_unknown() {
        let registry = registry();
        let person = TypeRef::named("Person");

        assert!(rewrite::validate_lambda(&full_name(), &person, &registry).is_ok());

        let unbound = Lambda::new("p", person.clone(), Expr::param("q").member("Name"));
        let err = rewrite::validate_lambda(&unbound, &person, &registry).unwrap_err();
        assert!(err.is_configuration());

        let unknown = Lambda::new("p", person.clone(), Expr::param("p").member("Nickname"));
        let err = rewrite::validate_lambda(&unknown, &person, &registry).unwrap_err();
        assert!(err.to_string().contains("Nickname"));

        let bad_method = Lambda::new("p", person.clone(), Expr::param("p").invoke("GetNothing"));
        assert!(rewrite::validate_lambda(&bad_method, &person, &registry).is_err());
    }

    #[test]
    fn test_evaluator_functions() {
        let registry = registry();
        let evaluator = Evaluator::new(&registry);
        let mut scope = Scope::new();

        let concat = Expr::concat(vec![Expr::constant("a"), Expr::null(), Expr::constant("b")]);
        assert_eq!(evaluator.eval(&concat, &mut scope).unwrap(), Value::from("ab"));

        let coalesce = Expr::call(Function::Coalesce, vec![Expr::null(), Expr::constant(7i64)]);
        assert_eq!(evaluator.eval(&coalesce, &mut scope).unwrap(), Value::I64(7));

        let add = Expr::call(Function::Add, vec![Expr::constant(2i64), Expr::constant(3i64)]);
        assert_eq!(evaluator.eval(&add, &mut scope).unwrap(), Value::I64(5));

        let add_null = Expr::call(Function::Add, vec![Expr::constant(2i64), Expr::null()]);
        assert_eq!(evaluator.eval(&add_null, &mut scope).unwrap(), Value::Null);

        let condition = Expr::condition(Expr::is_null(Expr::null()), Expr::constant("yes"), Expr::constant("no"));
        assert_eq!(evaluator.eval(&condition, &mut scope).unwrap(), Value::from("yes"));
    }

    #[test]
    fn test_evaluator_integer_arithmetic_keeps_kind() {
        let registry = registry();
        let evaluator = Evaluator::new(&registry);
        let add = Expr::call(Function::Add, vec![Expr::param("a"), Expr::param("b")]);
        let eval = |a: Value, b: Value| evaluator.eval(&add, &mut Scope::new().with("a", a).with("b", b));

        // Unsigned sums above i64::MAX stay in range for u64
        assert_eq!(
            eval(Value::U64(u64::MAX - 10), Value::U64(1)).unwrap(),
            Value::U64(u64::MAX - 9)
        );
        assert!(matches!(
            eval(Value::U64(u64::MAX), Value::U64(1)),
            Err(crate::Error::Evaluation { .. })
        ));
        assert!(matches!(
            eval(Value::I8(120), Value::I8(10)),
            Err(crate::Error::Evaluation { .. })
        ));
        // Mixed kinds widen to i64
        assert_eq!(eval(Value::I32(2), Value::U8(3)).unwrap(), Value::I64(5));
        assert!(matches!(
            eval(Value::U64(u64::MAX), Value::I32(0)),
            Err(crate::Error::Evaluation { .. })
        ));
    }

    #[test]
    fn test_evaluator_member_on_null_fails() {
        let registry = registry();
        let lambda = Lambda::new("p", TypeRef::named("Person"), Expr::param("p").member("Address").member("City"));
        let person = registry.create_instance("Person").unwrap();
        let err = Evaluator::new(&registry).apply(&lambda, Value::Object(person)).unwrap_err();
        assert!(matches!(err, crate::Error::Evaluation { .. }));
    }

    #[test]
    fn test_compile_nested_projection() {
        let registry = registry();
        let (compiler, _) = compiler(&registry);
        let lambda = compiler
            .compile(&TypeRef::named("Person"), &TypeRef::named("PersonDto"))
            .unwrap();

        assert_eq!(lambda.param, "srcPerson0");
        let text = lambda.body.to_string();
        assert!(text.contains("new PersonDto {"));
        assert!(text.contains("Age = ((string) srcPerson0.Age)"));
        assert!(text.contains("Initials = srcPerson0.GetInitials()"));
        assert!(text.contains(".ToArray()"));
        // No source for FullName without a resolver
        assert!(!text.contains("FullName"));

        let source = person(&registry, Some("London"));
        let result = Evaluator::new(&registry).apply(&lambda, Value::Object(source)).unwrap();
        let dto = result.as_object().unwrap();

        assert_eq!(dto.class_name(), "PersonDto");
        assert_eq!(dto.get("Name").unwrap(), Value::from("Ada"));
        assert_eq!(dto.get("Age").unwrap(), Value::from("36"));
        assert_eq!(dto.get("Initials").unwrap(), Value::from("A"));
        assert_eq!(dto.get("AddressCity").unwrap(), Value::from("London"));

        let address = dto.get("Address").unwrap();
        assert_eq!(address.as_object().unwrap().get("City").unwrap(), Value::from("London"));

        let orders = dto.get("Orders").unwrap();
        assert!(matches!(orders, Value::Array(_)));
        let totals: Vec<Value> = orders
            .elements()
            .unwrap()
            .iter()
            .map(|o| o.as_object().unwrap().get("Total").unwrap())
            .collect();
        assert_eq!(
            totals,
            vec![
                Value::Decimal(Decimal::from_str("10.5").unwrap()),
                Value::Decimal(Decimal::from_str("20.25").unwrap())
            ]
        );
    }

    #[test]
    fn test_null_guards() {
        let registry = registry();
        let (compiler, _) = compiler(&registry);
        let lambda = compiler
            .compile(&TypeRef::named("Person"), &TypeRef::named("PersonDto"))
            .unwrap();

        let source = person(&registry, None);
        source.set("Orders", Value::Null).unwrap();
        let result = Evaluator::new(&registry).apply(&lambda, Value::Object(source)).unwrap();
        let dto = result.as_object().unwrap();

        assert_eq!(dto.get("Address").unwrap(), Value::Null);
        assert_eq!(dto.get("AddressCity").unwrap(), Value::Null);
        assert_eq!(dto.get("Orders").unwrap(), Value::Null);
    }

    #[test]
    fn test_expression_resolver_is_inlined() {
        let registry = registry();
        let (compiler, configs) = compiler(&registry);
        configs
            .configure(TypeRef::named("Person"), TypeRef::named("PersonDto"))
            .map_from_expr("FullName", full_name())
            .ignore_member("Orders");

        let lambda = compiler
            .compile(&TypeRef::named("Person"), &TypeRef::named("PersonDto"))
            .unwrap();
        let text = lambda.body.to_string();
        assert!(text.contains("FullName = concat(srcPerson0.Name, \" \", srcPerson0.Surname)"));
        assert!(!text.contains("Orders"));

        let result = Evaluator::new(&registry)
            .apply(&lambda, Value::Object(person(&registry, Some("Paris"))))
            .unwrap();
        assert_eq!(
            result.as_object().unwrap().get("FullName").unwrap(),
            Value::from("Ada Lovelace")
        );
    }

    #[test]
    fn test_closure_resolver_cannot_be_projected() {
        let registry = registry();
        let (compiler, configs) = compiler(&registry);
        configs
            .configure(TypeRef::named("Person"), TypeRef::named("PersonDto"))
            .map_from("FullName", |p| p.get("Name"));

        let err = compiler
            .compile(&TypeRef::named("Person"), &TypeRef::named("PersonDto"))
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("FullName"));
        assert_eq!(compiler.cached_count(), 0);
    }

    #[test]
    fn test_optional_members_are_projected() {
        let registry = registry();
        let (compiler, _) = compiler(&registry);
        let lambda = compiler
            .compile(&TypeRef::named("Branch"), &TypeRef::named("BranchDto"))
            .unwrap();
        let text = lambda.body.to_string();
        assert!(text.contains("Child = ((srcBranch0.Child == null) ? null : new AddressDto {"));
        assert!(text.contains("Items = ((srcBranch0.Items == null) ? default(List<AddressDto>?) : srcBranch0.Items.Select("));

        let city = |name: &str| {
            let address = registry.create_instance("Address").unwrap();
            address.set("City", name).unwrap();
            Value::Object(address)
        };
        let branch = registry.create_instance("Branch").unwrap();
        branch.set("Child", city("Oslo")).unwrap();
        branch.set("Items", Value::List(vec![city("Bergen"), city("Tromso")])).unwrap();

        let result = Evaluator::new(&registry).apply(&lambda, Value::Object(branch)).unwrap();
        let dto = result.as_object().unwrap();
        let child = dto.get("Child").unwrap();
        assert_eq!(child.as_object().unwrap().class_name(), "AddressDto");
        assert_eq!(child.as_object().unwrap().get("City").unwrap(), Value::from("Oslo"));

        let items = dto.get("Items").unwrap();
        let cities: Vec<Value> = items
            .elements()
            .unwrap()
            .iter()
            .map(|a| a.as_object().unwrap().get("City").unwrap())
            .collect();
        assert_eq!(cities, vec![Value::from("Bergen"), Value::from("Tromso")]);
    }

    #[test]
    fn test_optional_pair_shares_cache_entry() {
        let registry = registry();
        let (compiler, _) = compiler(&registry);
        let plain = compiler
            .compile(&TypeRef::named("Address"), &TypeRef::named("AddressDto"))
            .unwrap();
        let optional = compiler
            .compile(
                &TypeRef::optional(TypeRef::named("Address")),
                &TypeRef::optional(TypeRef::named("AddressDto")),
            )
            .unwrap();
        assert!(Arc::ptr_eq(&plain, &optional));
        assert_eq!(compiler.cached_count(), 1);
    }

    #[test]
    fn test_non_class_pair_rejected() {
        let registry = registry();
        let (compiler, _) = compiler(&registry);
        let err = compiler
            .compile(&TypeRef::scalar(ScalarKind::I32), &TypeRef::named("PersonDto"))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_cache_returns_same_lambda() {
        let registry = registry();
        let (compiler, _) = compiler(&registry);
        let first = compiler.compile(&TypeRef::named("Address"), &TypeRef::named("AddressDto")).unwrap();
        let second = compiler.compile(&TypeRef::named("Address"), &TypeRef::named("AddressDto")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(compiler.cached_count(), 1);
    }

    #[test]
    fn test_recursive_projection_is_pruned() {
        let registry = registry();
        let (compiler, _) = compiler(&registry);
        let lambda = compiler.compile(&TypeRef::named("Node"), &TypeRef::named("NodeDto")).unwrap();

        let node = |name: &str| {
            let n = registry.create_instance("Node").unwrap();
            n.set("Name", name).unwrap();
            n
        };
        let root = node("root");
        let children: Vec<Value> = (0..3)
            .map(|i| {
                let child = node(&format!("child{}", i));
                let grandchildren = (0..2).map(|j| Value::Object(node(&format!("leaf{}{}", i, j)))).collect();
                child.set("Children", Value::List(grandchildren)).unwrap();
                Value::Object(child)
            })
            .collect();
        root.set("Children", Value::List(children)).unwrap();

        let result = Evaluator::new(&registry).apply(&lambda, Value::Object(root)).unwrap();
        let dto = result.as_object().unwrap();
        assert_eq!(dto.get("Parent").unwrap(), Value::Null);

        let children = dto.get("Children").unwrap();
        let children = children.elements().unwrap();
        assert_eq!(children.len(), 3);
        for child in children {
            // Grandchildren are beyond the default depth
            assert_eq!(child.as_object().unwrap().get("Children").unwrap(), Value::Null);
        }
    }

    #[test]
    fn test_configured_depth_overrides_default() {
        let registry = registry();
        let (compiler, configs) = compiler(&registry);
        configs
            .configure(TypeRef::named("Node"), TypeRef::named("NodeDto"))
            .max_depth(2);

        let lambda = compiler.compile(&TypeRef::named("Node"), &TypeRef::named("NodeDto")).unwrap();
        let text = lambda.body.to_string();
        assert!(!text.contains("Children ="));
        assert!(!text.contains("Parent ="));
        assert!(text.contains("Name = srcNode0.Name"));
    }

    #[test]
    fn test_in_memory_query_is_lazy() {
        let registry = registry();
        let (compiler, _) = compiler(&registry);
        let lambda = compiler.compile(&TypeRef::named("Address"), &TypeRef::named("AddressDto")).unwrap();

        let addresses: Vec<Value> = ["Oslo", "Rome"]
            .iter()
            .map(|city| {
                let a = registry.create_instance("Address").unwrap();
                a.set("City", *city).unwrap();
                Value::Object(a)
            })
            .chain(std::iter::once(Value::from(5i32)))
            .collect();
        let query = InMemoryQuery::new(Arc::clone(&registry), TypeRef::named("Address"), addresses);
        assert_eq!(query.len(), 3);

        let mut projected = query.select(lambda);
        let first = projected.next().unwrap().unwrap();
        assert_eq!(first.as_object().unwrap().get("City").unwrap(), Value::from("Oslo"));
        assert!(projected.next().unwrap().is_ok());
        // The bad element only fails when it is pulled
        assert!(projected.next().unwrap().is_err());
        assert!(projected.next().is_none());
    }
}
