#![cfg(test)]

use cfgbake_compiler::{bake_source, compile, docs_source, lua_source, CompileError};

#[test]
fn test_docs_entries_and_builder_text() {
    let result = compile(
        r#"
        [bake("window")]
        struct Window {
            /// Width in pixels.
            [greater(0), not_eq(13)]
            int width;
            Optional<bool> fullscreen;
            [non_empty]
            string title;
        }
        "#,
    )
    .unwrap();

    assert_eq!(result.docs.len(), 1);
    let docs = &result.docs[0];
    assert_eq!(docs.name, "Window");
    assert_eq!(docs.entries.len(), 3);

    let width = &docs.entries[0];
    assert_eq!(width.key, "width");
    assert!(width.required);
    assert_eq!(width.expr, "VerifyNotEqual(VerifyGreater(VerifyInt(), 0), 13)");
    assert_eq!(width.label, "int");
    assert_eq!(width.doc, "Width in pixels.");

    let fullscreen = &docs.entries[1];
    assert!(!fullscreen.required);
    assert_eq!(fullscreen.expr, "VerifyOptional(VerifyBool())");
    assert_eq!(fullscreen.label, "Optional<bool>");

    assert_eq!(docs.entries[2].expr, "VerifyNonEmptyString()");

    let text = &docs.text;
    assert!(text.contains("VerifierTable GetDocs_Window()"), "{}", text);
    assert!(text.contains("VerifierTable table(\"window\");"), "{}", text);
    assert!(
        text.contains(
            "table.Add(\"width\", VerifyNotEqual(VerifyGreater(VerifyInt(), 0), 13), true, \"Width in pixels.\");"
        ),
        "{}",
        text
    );
}

#[test]
fn test_docs_qualifier_order_ignores_source_order() {
    // not_eq written first still wraps outermost.
    let result = compile(
        r#"
        struct S {
            [not_eq(13), less(100)]
            int n;
        }
        "#,
    )
    .unwrap();
    assert_eq!(
        result.docs[0].entries[0].expr,
        "VerifyNotEqual(VerifyLess(VerifyInt(), 100), 13)"
    );
}

#[test]
fn test_docs_variant_label_and_expr() {
    let result = compile(
        r#"
        struct S {
            Variant<dvec2, mat2, string> extent;
        }
        "#,
    )
    .unwrap();
    let entry = &result.docs[0].entries[0];
    assert_eq!(entry.label, "Vector2<double>, Matrix2x2<float> or String");
    assert_eq!(
        entry.expr,
        "VerifyOr(VerifyVector2Double(), VerifyMatrix2x2Float(), VerifyString())"
    );
}

#[test]
fn test_docs_nested_record_emitted_before_parent() {
    let result = compile(
        r#"
        struct Outer {
            struct Inner { int x; }
            Inner inner;
        }
        "#,
    )
    .unwrap();
    assert_eq!(result.docs.len(), 2);
    assert_eq!(result.docs[0].name, "Outer_Inner");
    assert_eq!(result.docs[1].name, "Outer");
    assert_eq!(result.docs[1].entries[0].expr, "GetDocs_Outer_Inner()");

    let stream = docs_source(&result);
    let inner = stream.find("VerifierTable GetDocs_Outer_Inner()").unwrap();
    let outer = stream.find("VerifierTable GetDocs_Outer()").unwrap();
    assert!(inner < outer, "{}", stream);
}

#[test]
fn test_unsupported_attribute_fails_generation() {
    let err = compile(
        r#"
        struct S {
            [greater(0)]
            bool flag;
        }
        "#,
    )
    .unwrap_err();
    match err {
        CompileError::UnsupportedAttribute { type_name, attribute } => {
            assert_eq!(type_name, "bool");
            assert_eq!(attribute, "greater");
        }
        other => panic!("expected UnsupportedAttribute, got {:?}", other),
    }
}

#[test]
fn test_exclusive_string_attributes_fail_generation() {
    let err = compile(
        r#"
        struct S {
            [non_empty, in_list("a", "b")]
            string mode;
        }
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::ExclusiveAttributes(_)), "{:?}", err);
}

#[test]
fn test_non_empty_never_swallows_another_constraint() {
    // The non_empty override replaces the whole verifier expression, so a
    // co-set not_in_list must fail instead of disappearing from the output.
    let err = compile(
        r#"
        struct S {
            [non_empty, not_in_list("a", "b")]
            string mode;
        }
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::ExclusiveAttributes(_)), "{:?}", err);

    let err = compile(
        r#"
        struct S {
            [annotation("see docs"), not_in_list("a", "b")]
            string mode;
        }
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::ExclusiveAttributes(_)), "{:?}", err);
}

#[test]
fn test_bake_routine_text() {
    let result = compile(
        r#"
        [bake("actor")]
        struct Actor {
            vec3 position;
            Optional<string> label;
            Sequence<int> tags;
            Variant<dvec2, mat2> extent;
        }
        "#,
    )
    .unwrap();

    let text = &result.bakes[0].text;
    assert!(
        text.contains("void Bake_Actor(const ConfigDict &dict, Actor &out)"),
        "{}",
        text
    );
    assert!(
        text.contains("out.position = dict.GetVector3f(\"position\");"),
        "{}",
        text
    );
    // Optional fields only read when the key is present.
    assert!(text.contains("if (dict.Has(\"label\")) {"), "{}", text);
    assert!(text.contains("out.label = dict.GetString(\"label\");"), "{}", text);
    // Sequences iterate the contiguous decimal keys.
    assert!(
        text.contains("const ConfigDict &items0 = dict.GetDict(\"tags\");"),
        "{}",
        text
    );
    assert!(
        text.contains("for (int i0 = 1; i0 <= items0.Size(); i0++) {"),
        "{}",
        text
    );
    // Variant probes in declared order; 4 components resolve as the matrix.
    assert!(text.contains("if (stored0.IsComponents(2)) {"), "{}", text);
    assert!(text.contains("} else if (stored0.IsComponents(4)) {"), "{}", text);
    assert!(
        text.contains("BakeFail(\"extent\", \"no variant alternative matches\");"),
        "{}",
        text
    );
}

#[test]
fn test_bake_nested_record_calls_sub_routine() {
    let result = compile(
        r#"
        struct Outer {
            struct Inner { int x; }
            Inner inner;
        }
        "#,
    )
    .unwrap();
    assert_eq!(result.bakes[0].name, "Outer_Inner");
    let outer = &result.bakes[1].text;
    assert!(
        outer.contains("Bake_Outer_Inner(dict.GetDict(\"inner\"), out.inner);"),
        "{}",
        outer
    );
}

#[test]
fn test_bake_source_includes_enum_conversions() {
    let result = compile(
        r#"
        [stringify]
        enum Mode { Fast, Careful = "slow" }

        struct Job {
            Mode mode;
        }
        "#,
    )
    .unwrap();
    let stream = bake_source(&result);
    assert!(stream.contains("const char *ModeToString(Mode value)"), "{}", stream);
    assert!(stream.contains("Mode ModeFromString(const String &text)"), "{}", stream);
    assert!(
        stream.contains("out.mode = ModeFromString(dict.GetString(\"mode\"));"),
        "{}",
        stream
    );
}

#[test]
fn test_lua_wrapper_text_and_signature() {
    let result = compile(
        r#"
        /// Spawns a wave of actors.
        [export]
        fn SpawnWave(int count = 4, vec2 origin = vec2(0, 0), Optional<string> label) -> bool;
        "#,
    )
    .unwrap();

    let binding = &result.bindings[0];
    assert_eq!(
        binding.signature,
        "SpawnWave(count: int = 4, origin: vec2 = vec2(0, 0), label: String?) -> bool"
    );

    let text = &binding.text;
    assert!(text.contains("static int LuaWrap_SpawnWave(lua_State *L)"), "{}", text);
    assert!(
        text.contains("int count = (top >= 1) ? ReadInt(L, 1) : (4);"),
        "{}",
        text
    );
    assert!(
        text.contains("Vector2f origin = (top >= 2) ? ReadVector2f(L, 2) : (vec2(0, 0));"),
        "{}",
        text
    );
    assert!(
        text.contains(
            "std::optional<String> label = (top >= 3) ? std::optional<String>(ReadString(L, 3)) : std::nullopt;"
        ),
        "{}",
        text
    );
    assert!(text.contains("bool result = SpawnWave(count, origin, label);"), "{}", text);
    assert!(text.contains("PushBool(L, result);"), "{}", text);

    let stream = lua_source(&result);
    assert!(
        stream.contains("{ \"SpawnWave\", LuaWrap_SpawnWave,"),
        "{}",
        stream
    );
}

#[test]
fn test_duplicate_enum_external_name_fails() {
    let err = compile(
        r#"
        [stringify]
        enum Mode { A = "same", B = "same" }
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::DuplicateEnumName { .. }), "{:?}", err);
}
