//! Tests for scalar conversion
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::model::{EnumDescriptor, ScalarKind, TypeRef, TypeRegistry};
    use crate::value::Value;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use uuid::Uuid;

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.register_enum(EnumDescriptor::new(
            "Priority",
            [("Low", 0), ("Medium", 5), ("High", 10)],
        ));
        registry.register_enum(EnumDescriptor::from_names("Level", ["Low", "High"]));
        registry
    }

    fn convert(from: &str, to: &str, value: Value) -> crate::Result<Value> {
        let registry = registry();
        let resolution = resolve(&from.parse().unwrap(), &to.parse().unwrap(), &registry);
        match resolution {
            Resolution::Convert(converter) => converter.convert(&value),
            other => panic!("expected a converter for {} -> {}, got {:?}", from, to, other),
        }
    }

    #[test]
    fn test_identity_after_stripping_optional() {
        let registry = registry();
        let resolution = resolve(
            &"i32?".parse().unwrap(),
            &TypeRef::scalar(ScalarKind::I32),
            &registry,
        );
        assert!(matches!(resolution, Resolution::Identity));
    }

    #[test]
    fn test_unsupported_pairs() {
        let registry = registry();
        let uuid_to_int = resolve(&"uuid".parse().unwrap(), &"i32".parse().unwrap(), &registry);
        assert!(matches!(uuid_to_int, Resolution::Unsupported));

        let datetime_to_bool = resolve(&"datetime".parse().unwrap(), &"bool".parse().unwrap(), &registry);
        assert!(matches!(datetime_to_bool, Resolution::Unsupported));
    }

    #[test]
    fn test_integer_widening_and_narrowing() {
        assert_eq!(convert("i32", "i64", Value::I32(-4)).unwrap(), Value::I64(-4));
        assert_eq!(convert("i64", "u8", Value::I64(255)).unwrap(), Value::U8(255));

        let err = convert("i64", "u8", Value::I64(256)).unwrap_err();
        assert!(err.is_conversion());
        let err = convert("i32", "u32", Value::I32(-1)).unwrap_err();
        assert!(err.is_conversion());
    }

    #[test]
    fn test_float_to_integer_rounds_half_to_even() {
        assert_eq!(convert("f64", "i32", Value::F64(2.5)).unwrap(), Value::I32(2));
        assert_eq!(convert("f64", "i32", Value::F64(3.5)).unwrap(), Value::I32(4));
        assert_eq!(convert("f64", "i32", Value::F64(-2.5)).unwrap(), Value::I32(-2));
        assert_eq!(convert("f32", "i16", Value::F32(7.4)).unwrap(), Value::I16(7));
        assert!(convert("f64", "i8", Value::F64(1000.0)).is_err());
        assert!(convert("f64", "i32", Value::F64(f64::NAN)).is_err());
    }

    #[test]
    fn test_decimal_conversions() {
        let d = Decimal::from_str("12.50").unwrap();
        assert_eq!(convert("decimal", "i32", Value::Decimal(d)).unwrap(), Value::I32(12));
        assert_eq!(convert("decimal", "f64", Value::Decimal(d)).unwrap(), Value::F64(12.5));
        assert_eq!(
            convert("string", "decimal", Value::from("3.14")).unwrap(),
            Value::Decimal(Decimal::from_str("3.14").unwrap())
        );
        assert_eq!(
            convert("i32", "decimal", Value::I32(9)).unwrap(),
            Value::Decimal(Decimal::from(9))
        );
    }

    #[test]
    fn test_text_conversions() {
        assert_eq!(convert("i32", "string", Value::I32(42)).unwrap(), Value::from("42"));
        assert_eq!(convert("string", "i32", Value::from(" 42 ")).unwrap(), Value::I32(42));
        assert_eq!(convert("string", "bool", Value::from("True")).unwrap(), Value::Bool(true));
        assert_eq!(convert("string", "char", Value::from("x")).unwrap(), Value::Char('x'));
        assert_eq!(convert("bool", "i32", Value::Bool(true)).unwrap(), Value::I32(1));

        let err = convert("string", "i32", Value::from("forty")).unwrap_err();
        assert!(matches!(err, crate::Error::Format { .. }));
        let err = convert("string", "char", Value::from("xy")).unwrap_err();
        assert!(matches!(err, crate::Error::Format { .. }));
    }

    #[test]
    fn test_uuid_round_trips_through_text() {
        let id = Uuid::parse_str("2f1d4c8e-5b7a-4e39-a0d2-9c3e1f6b8a47").unwrap();
        let text = convert("uuid", "string", Value::Uuid(id)).unwrap();
        assert_eq!(text, Value::from("2f1d4c8e-5b7a-4e39-a0d2-9c3e1f6b8a47"));
        assert_eq!(convert("string", "uuid", text).unwrap(), Value::Uuid(id));

        let err = convert("string", "uuid", Value::from("not-a-guid")).unwrap_err();
        assert!(matches!(err, crate::Error::Format { .. }));
    }

    #[test]
    fn test_datetime_parsing() {
        let expected = NaiveDate::from_ymd_opt(2014, 5, 23)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        for text in ["2014-05-23T10:30:00", "2014-05-23 10:30:00", "2014-05-23T10:30:00Z"] {
            assert_eq!(
                convert("string", "datetime", Value::from(text)).unwrap(),
                Value::DateTime(expected),
                "parsing {}",
                text
            );
        }
        let midnight = convert("string", "datetime", Value::from("2014-05-23")).unwrap();
        assert_eq!(midnight.to_string(), "2014-05-23T00:00:00");
    }

    #[test]
    fn test_integer_code_to_enum() {
        let value = convert("i32", "Priority", Value::I32(10)).unwrap();
        let e = value.as_enum().unwrap();
        assert_eq!(e.variant, "High");
        assert_eq!(e.discriminant, 10);

        assert!(convert("i32", "Priority", Value::I32(3)).unwrap_err().is_conversion());
    }

    #[test]
    fn test_text_to_enum() {
        assert_eq!(
            convert("string", "Priority", Value::from("medium")).unwrap().as_enum().unwrap().variant,
            "Medium"
        );
        assert_eq!(
            convert("string", "Priority", Value::from("5")).unwrap().as_enum().unwrap().variant,
            "Medium"
        );
    }

    #[test]
    fn test_enum_to_scalars_and_other_enum() {
        let high = convert("i32", "Priority", Value::I32(10)).unwrap();
        assert_eq!(convert("Priority", "i64", high.clone()).unwrap(), Value::I64(10));
        assert_eq!(convert("Priority", "string", high.clone()).unwrap(), Value::from("High"));

        let level = convert("Priority", "Level", high).unwrap();
        assert_eq!(level.as_enum().unwrap().discriminant, 1);
    }

    #[test]
    fn test_null_converts_to_null() {
        assert_eq!(convert("string", "uuid", Value::Null).unwrap(), Value::Null);
        assert_eq!(convert("i32", "Priority", Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_convert_to_runtime_type() {
        let registry = registry();
        let dest: TypeRef = "i16".parse().unwrap();
        assert_eq!(convert_to(Value::I64(12), &dest, &registry).unwrap(), Value::I16(12));
        assert_eq!(convert_to(Value::I16(12), &dest, &registry).unwrap(), Value::I16(12));
        assert!(convert_to(Value::Uuid(Uuid::nil()), &dest, &registry).is_err());
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(built_in::round_half_even(0.5), 0.0);
        assert_eq!(built_in::round_half_even(1.5), 2.0);
        assert_eq!(built_in::round_half_even(1.4), 1.0);
        assert_eq!(built_in::round_half_even(-1.5), -2.0);
    }
}
