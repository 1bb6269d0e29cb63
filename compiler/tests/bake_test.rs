#![cfg(test)]

use cfgbake_compiler::parse_and_resolve;
use cfgbake_schema::{
    bake_record, dict, seq_dict, BakeError, Baked, DynValue, Item, Record, Scalar,
    TranslationUnit,
};

fn compiled(source: &str) -> TranslationUnit {
    parse_and_resolve(source).expect("parse_and_resolve failed")
}

fn first_record(unit: &TranslationUnit) -> &Record {
    for item in &unit.items {
        if let Item::Record(id) = item {
            return unit.record(*id).expect("first item is a record");
        }
    }
    panic!("no record declared");
}

#[test]
fn test_required_and_optional_fields() {
    let unit = compiled(
        r#"
        [bake("settings")]
        struct Settings {
            int value;
            Optional<bool> flag;
        }
        "#,
    );
    let record = first_record(&unit);

    // A stored double bakes into an int by truncation; the absent optional
    // stays absent.
    let stored = dict(vec![("value", DynValue::Double(5.9))]);
    let baked = bake_record(&unit, record, &stored).unwrap();
    assert_eq!(baked.name, "settings");
    assert_eq!(baked.field("value"), Some(&Baked::Int(5)));
    assert!(baked.is_absent("flag"));

    // A missing required field is fatal and names the field.
    let err = bake_record(&unit, record, &dict(Vec::<(&str, DynValue)>::new())).unwrap_err();
    match err {
        BakeError::MissingField(name) => assert_eq!(name, "value"),
        other => panic!("expected MissingField, got {:?}", other),
    }
}

#[test]
fn test_numeric_coercions() {
    let unit = compiled(
        r#"
        struct Numbers {
            int count;
            float ratio;
            double exact;
        }
        "#,
    );
    let record = first_record(&unit);
    let stored = dict(vec![
        ("count", DynValue::Int(7)),
        ("ratio", DynValue::Double(0.5)),
        ("exact", DynValue::Int(3)),
    ]);
    let baked = bake_record(&unit, record, &stored).unwrap();
    assert_eq!(baked.field("count"), Some(&Baked::Int(7)));
    assert_eq!(baked.field("ratio"), Some(&Baked::Float(0.5)));
    assert_eq!(baked.field("exact"), Some(&Baked::Double(3.0)));

    // A string is never a number.
    let stored = dict(vec![
        ("count", DynValue::from("7")),
        ("ratio", DynValue::Double(0.5)),
        ("exact", DynValue::Int(3)),
    ]);
    let err = bake_record(&unit, record, &stored).unwrap_err();
    assert!(matches!(err, BakeError::TypeMismatch { .. }), "{:?}", err);
}

#[test]
fn test_sequence_requires_contiguous_keys() {
    let unit = compiled("struct Tags { Sequence<string> tags; }");
    let record = first_record(&unit);

    let stored = dict(vec![(
        "tags",
        seq_dict(vec![DynValue::from("a"), DynValue::from("b")]),
    )]);
    let baked = bake_record(&unit, record, &stored).unwrap();
    assert_eq!(
        baked.field("tags"),
        Some(&Baked::List(vec![
            Baked::String("a".to_string()),
            Baked::String("b".to_string()),
        ]))
    );

    // Keys {"1","2","4"} leave a gap at "3".
    let stored = dict(vec![(
        "tags",
        dict(vec![
            ("1", DynValue::from("a")),
            ("2", DynValue::from("b")),
            ("4", DynValue::from("d")),
        ]),
    )]);
    let err = bake_record(&unit, record, &stored).unwrap_err();
    match err {
        BakeError::MissingKey { table, key } => {
            assert_eq!(table, "tags");
            assert_eq!(key, "3");
        }
        other => panic!("expected MissingKey, got {:?}", other),
    }
}

#[test]
fn test_fixed_array_enforces_exact_size() {
    let unit = compiled("struct Tint { FixedArray<float, 4> tint; }");
    let record = first_record(&unit);

    let stored = dict(vec![(
        "tint",
        seq_dict(vec![
            DynValue::Double(1.0),
            DynValue::Double(0.5),
            DynValue::Double(0.25),
        ]),
    )]);
    let err = bake_record(&unit, record, &stored).unwrap_err();
    assert!(
        matches!(err, BakeError::WrongLength { expected: 4, found: 3, .. }),
        "{:?}",
        err
    );
}

#[test]
fn test_mapping_keeps_keys_in_order() {
    let unit = compiled("struct Anchors { Mapping<string, vec2> anchors; }");
    let record = first_record(&unit);

    let stored = dict(vec![(
        "anchors",
        dict(vec![
            ("center", DynValue::Components(vec![0.5, 0.5])),
            ("origin", DynValue::Components(vec![0.0, 0.0])),
        ]),
    )]);
    let baked = bake_record(&unit, record, &stored).unwrap();
    match baked.field("anchors") {
        Some(Baked::Map(entries)) => {
            let keys: Vec<&str> = entries.keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["center", "origin"]);
        }
        other => panic!("expected a map, got {:?}", other),
    }
}

#[test]
fn test_variant_takes_first_matching_alternative() {
    let unit = compiled("struct Extent { Variant<dvec2, mat2, string> extent; }");
    let record = first_record(&unit);

    // 2 components match the vector alternative.
    let stored = dict(vec![("extent", DynValue::Components(vec![3.0, 4.0]))]);
    let baked = bake_record(&unit, record, &stored).unwrap();
    assert_eq!(
        baked.field("extent"),
        Some(&Baked::Vector { scalar: Scalar::Double, comps: vec![3.0, 4.0] })
    );

    // 4 components skip the vector and match the matrix.
    let stored = dict(vec![(
        "extent",
        DynValue::Components(vec![1.0, 0.0, 0.0, 1.0]),
    )]);
    let baked = bake_record(&unit, record, &stored).unwrap();
    assert!(matches!(
        baked.field("extent"),
        Some(Baked::Matrix { rows: 2, cols: 2, .. })
    ));

    // 3 components match nothing.
    let stored = dict(vec![("extent", DynValue::Components(vec![1.0, 2.0, 3.0]))]);
    let err = bake_record(&unit, record, &stored).unwrap_err();
    match err {
        BakeError::NoVariantMatch(key) => assert_eq!(key, "extent"),
        other => panic!("expected NoVariantMatch, got {:?}", other),
    }
}

#[test]
fn test_nested_record_bakes_recursively() {
    let unit = compiled(
        r#"
        struct Outer {
            struct Inner {
                int x;
                Optional<int> y;
            }
            Inner inner;
            string name;
        }
        "#,
    );
    let record = first_record(&unit);

    let stored = dict(vec![
        ("inner", dict(vec![("x", DynValue::Int(1))])),
        ("name", DynValue::from("outer")),
    ]);
    let baked = bake_record(&unit, record, &stored).unwrap();
    match baked.field("inner") {
        Some(Baked::Record(inner)) => {
            assert_eq!(inner.field("x"), Some(&Baked::Int(1)));
            assert!(inner.is_absent("y"));
        }
        other => panic!("expected a record, got {:?}", other),
    }

    // A scalar where the nested dictionary should be is a mismatch.
    let stored = dict(vec![
        ("inner", DynValue::Int(3)),
        ("name", DynValue::from("outer")),
    ]);
    let err = bake_record(&unit, record, &stored).unwrap_err();
    assert!(matches!(err, BakeError::TypeMismatch { .. }), "{:?}", err);
}

#[test]
fn test_enum_field_bakes_from_external_name() {
    let unit = compiled(
        r#"
        struct Job {
            [stringify]
            enum Mode { Fast, Careful = "slow" }
            Mode mode;
        }
        "#,
    );
    let record = first_record(&unit);

    let stored = dict(vec![("mode", DynValue::from("slow"))]);
    let baked = bake_record(&unit, record, &stored).unwrap();
    assert_eq!(
        baked.field("mode"),
        Some(&Baked::EnumValue {
            enum_name: "Mode".to_string(),
            element:   "slow".to_string(),
        })
    );

    // The declared element name also matches when no override shadows it.
    let stored = dict(vec![("mode", DynValue::from("Fast"))]);
    let baked = bake_record(&unit, record, &stored).unwrap();
    assert!(matches!(baked.field("mode"), Some(Baked::EnumValue { .. })));

    let stored = dict(vec![("mode", DynValue::from("Sideways"))]);
    let err = bake_record(&unit, record, &stored).unwrap_err();
    match err {
        BakeError::InvalidEnumName { enum_name, value } => {
            assert_eq!(enum_name, "Mode");
            assert_eq!(value, "Sideways");
        }
        other => panic!("expected InvalidEnumName, got {:?}", other),
    }
}

#[test]
fn test_external_key_overrides_field_name() {
    let unit = compiled(
        r#"
        struct S {
            [key("Fullscreen")]
            bool fullscreen;
        }
        "#,
    );
    let record = first_record(&unit);
    let stored = dict(vec![("Fullscreen", DynValue::Bool(true))]);
    let baked = bake_record(&unit, record, &stored).unwrap();
    assert_eq!(baked.field("Fullscreen"), Some(&Baked::Bool(true)));
}

#[test]
fn test_vector_scalar_truncation() {
    let unit = compiled("struct P { ivec2 cell; }");
    let record = first_record(&unit);
    let stored = dict(vec![("cell", DynValue::Components(vec![1.9, -2.9]))]);
    let baked = bake_record(&unit, record, &stored).unwrap();
    assert_eq!(
        baked.field("cell"),
        Some(&Baked::Vector { scalar: Scalar::Int, comps: vec![1.0, -2.0] })
    );
}
