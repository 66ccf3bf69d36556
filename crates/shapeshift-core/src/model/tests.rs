//! Tests for the runtime type model
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::value::Value;
    use crate::Error;
    use serde_json::json;
    use std::sync::Arc;

    fn registry() -> Arc<TypeRegistry> {
        let registry = TypeRegistry::new();
        registry.register_enum(EnumDescriptor::from_names("Status", ["Active", "Passive"]));
        registry.register_class(
            ClassDescriptor::builder("Address")
                .member("City", TypeRef::scalar(ScalarKind::String))
                .build(),
        );
        registry.register_class(
            ClassDescriptor::builder("Customer")
                .member("Id", TypeRef::scalar(ScalarKind::I32))
                .member("Name", TypeRef::scalar(ScalarKind::String))
                .member("Status", TypeRef::named("Status"))
                .member("Address", TypeRef::named("Address"))
                .member("Tags", TypeRef::list(TypeRef::scalar(ScalarKind::String)))
                .read_only("Code", TypeRef::scalar(ScalarKind::Uuid))
                .build(),
        );
        registry.register_class(
            ClassDescriptor::builder("Sealed")
                .member("Id", TypeRef::scalar(ScalarKind::I32))
                .not_constructible()
                .build(),
        );
        Arc::new(registry)
    }

    #[test]
    fn test_parse_type_refs() {
        assert_eq!("i32".parse::<TypeRef>().unwrap(), TypeRef::scalar(ScalarKind::I32));
        assert_eq!("int".parse::<TypeRef>().unwrap(), TypeRef::scalar(ScalarKind::I32));
        assert_eq!(
            "string?".parse::<TypeRef>().unwrap(),
            TypeRef::optional(TypeRef::scalar(ScalarKind::String))
        );
        assert_eq!(
            "List<Person>".parse::<TypeRef>().unwrap(),
            TypeRef::list(TypeRef::named("Person"))
        );
        assert_eq!(
            "u8[]".parse::<TypeRef>().unwrap(),
            TypeRef::array(TypeRef::scalar(ScalarKind::U8))
        );
        assert_eq!("Bag".parse::<TypeRef>().unwrap(), TypeRef::bag());
        assert_eq!(
            "IndexedList< List<i64?> >".parse::<TypeRef>().unwrap(),
            TypeRef::collection(
                CollectionShape::IndexedList,
                TypeRef::list(TypeRef::optional(TypeRef::scalar(ScalarKind::I64)))
            )
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<TypeRef>().is_err());
        assert!("List<i32".parse::<TypeRef>().is_err());
        assert!("Person<i32>".parse::<TypeRef>().is_err());
        assert!("i32 extra".parse::<TypeRef>().is_err());
    }

    #[test]
    fn test_display_matches_parse() {
        for text in ["i32", "uuid?", "List<Person>", "Array<u8>", "Bag", "Iterable<List<string>>"] {
            let ty: TypeRef = text.parse().unwrap();
            assert_eq!(ty.to_string(), text);
        }
    }

    #[test]
    fn test_type_ref_serde_uses_text_form() {
        let ty = TypeRef::list(TypeRef::named("Order"));
        let json = serde_json::to_value(&ty).unwrap();
        assert_eq!(json, json!("List<Order>"));
        let back: TypeRef = serde_json::from_value(json).unwrap();
        assert_eq!(back, ty);
    }

    #[test]
    fn test_classify() {
        let registry = registry();
        let classify = |text: &str| registry.classify(&text.parse().unwrap()).unwrap();

        assert_eq!(classify("i32"), Classification::Scalar);
        assert_eq!(classify("Status"), Classification::Scalar);
        assert_eq!(classify("Status?"), Classification::Scalar);
        assert_eq!(classify("Address"), Classification::Class);
        assert_eq!(classify("Address?"), Classification::Class);
        assert_eq!(classify("Array<Address>"), Classification::Collection);
        assert_eq!(classify("List<Address>?"), Classification::Collection);
        assert_eq!(classify("i32?"), Classification::Scalar);

        let err = registry.classify(&TypeRef::named("Ghost")).unwrap_err();
        assert!(matches!(err, Error::UnknownType { ref name } if name == "Ghost"));
    }

    #[test]
    fn test_create_instance_zero_values() {
        let registry = registry();
        let customer = registry.create_instance("Customer").unwrap();

        assert_eq!(customer.get("Id").unwrap(), Value::I32(0));
        assert_eq!(customer.get("Name").unwrap(), Value::Null);
        assert_eq!(customer.get("Status").unwrap().as_enum().unwrap().variant, "Active");
        assert_eq!(customer.get("Code").unwrap(), Value::Uuid(uuid::Uuid::nil()));

        let err = registry.create_instance("Sealed").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_accepts() {
        let registry = registry();
        let accepts = |text: &str, value: &Value| registry.accepts(&text.parse().unwrap(), value);

        assert!(accepts("i32", &Value::I32(1)));
        assert!(!accepts("i32", &Value::I64(1)));
        assert!(!accepts("i32", &Value::Null));
        assert!(accepts("i32?", &Value::Null));
        assert!(accepts("string", &Value::Null));
        assert!(accepts("Address", &Value::Null));
        assert!(!accepts("Status", &Value::Null));
        assert!(accepts("List<i32>", &Value::List(vec![Value::I32(1)])));
        assert!(!accepts("List<i32>", &Value::Array(vec![Value::I32(1)])));
        assert!(accepts("Iterable<i32>", &Value::Array(vec![Value::I32(1)])));
        assert!(!accepts("List<i32>", &Value::List(vec![Value::from("x")])));
        assert!(accepts("Bag", &Value::Bag(vec![Value::from("x"), Value::I32(2)])));
    }

    #[test]
    fn test_accessor_get_set() {
        let registry = registry();
        let accessors = AccessorCompiler::new(Arc::clone(&registry));
        let customer = registry.create_instance("Customer").unwrap();

        let name = accessors.accessor("Customer", "Name").unwrap();
        name.set(&customer, Value::from("Timucin")).unwrap();
        assert_eq!(name.get(&customer).unwrap(), Value::from("Timucin"));

        let err = name.set(&customer, Value::I32(3)).unwrap_err();
        assert!(err.is_conversion());

        let code = accessors.accessor("Customer", "Code").unwrap();
        assert!(code.set(&customer, Value::Uuid(uuid::Uuid::nil())).is_err());

        let address = registry.create_instance("Address").unwrap();
        assert!(name.get(&address).is_err());
    }

    #[test]
    fn test_accessor_cache() {
        let registry = registry();
        let accessors = AccessorCompiler::new(Arc::clone(&registry));

        let first = accessors.accessor("Customer", "Id").unwrap();
        let second = accessors.accessor("Customer", "Id").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(accessors.cached_count(), 1);
        assert!(accessors.accessor("Customer", "Nope").is_err());
    }

    #[test]
    fn test_value_from_json() {
        let registry = registry();
        let value = registry
            .value_from_json(
                &TypeRef::named("Customer"),
                &json!({
                    "Id": 7,
                    "Name": "Ada",
                    "Status": "Passive",
                    "Address": {"City": "Izmir"},
                    "Tags": ["a", "b"],
                    "Code": "6f1c9a3e-8e4d-4f4a-9a59-6c1f0e2b7d11"
                }),
            )
            .unwrap();

        let customer = value.as_object().unwrap();
        assert_eq!(customer.get("Id").unwrap(), Value::I32(7));
        assert_eq!(customer.get("Status").unwrap().as_enum().unwrap().discriminant, 1);
        assert_eq!(
            customer.get("Tags").unwrap(),
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
        let address = customer.get("Address").unwrap();
        assert_eq!(address.as_object().unwrap().get("City").unwrap(), Value::from("Izmir"));
        assert_eq!(value.to_json()["Code"], json!("6f1c9a3e-8e4d-4f4a-9a59-6c1f0e2b7d11"));
    }

    #[test]
    fn test_value_from_json_rejects_unknown_members() {
        let registry = registry();
        let err = registry
            .value_from_json(&TypeRef::named("Address"), &json!({"Town": "x"}))
            .unwrap_err();
        assert!(matches!(err, Error::Member { .. }));
    }
}
