//! Enums, subranges, aliases, array types, recursion limits and options

use super::harness::*;

#[test]
fn test_enum_members_and_intrinsics() {
    let program = Program::new()
        .decl(EnumDecl::new("TColor", &["Red", "Green", "Blue"]))
        .stmt(let_("c", member(ident("TColor"), "Green")))
        .stmt(let_("ord", call_fn("Ord", vec![ident("c")])))
        .stmt(let_("value", member(ident("c"), "Value")))
        .stmt(let_("name", member(ident("c"), "Name")));
    let interp = run_ok(&program);
    assert_eq!(interp.global("ord"), Some(Value::Integer(1)));
    assert_eq!(interp.global("value"), Some(Value::Integer(1)));
    assert_eq!(interp.global("name"), Some(Value::string("Green")));
}

#[test]
fn test_subrange_rejects_out_of_range_values() {
    let program = Program::new()
        .decl(SubrangeDecl {
            name: "TDigit".into(),
            low: 0,
            high: 9,
            span: Span::default(),
        })
        .stmt(var_init("d", ty("TDigit"), int(12)));
    expect_error(&program, "out of range");
}

#[test]
fn test_subrange_accepts_in_range_values() {
    let program = Program::new()
        .decl(SubrangeDecl {
            name: "TDigit".into(),
            low: 0,
            high: 9,
            span: Span::default(),
        })
        .stmt(var_init("d", ty("TDigit"), int(7)));
    expect_i64(&program, "d", 7);
}

#[test]
fn test_type_alias_zero_value() {
    let program = Program::new()
        .decl(TypeAliasDecl {
            name: "TName".into(),
            target: ty("String"),
            span: Span::default(),
        })
        .stmt(var("n", ty("TName")));
    expect_string(&program, "n", "");
}

#[test]
fn test_static_array_type_bounds() {
    let program = Program::new()
        .decl(ArrayTypeDecl {
            name: "TTriple".into(),
            ty: static_array(ty("Integer"), 1, 3),
            span: Span::default(),
        })
        .stmt(var("t", ty("TTriple")))
        .stmt(assign(index(ident("t"), vec![int(3)]), int(8)))
        .stmt(let_("last", index(ident("t"), vec![int(3)])))
        .stmt(let_("low", member(ident("t"), "Low")));
    let interp = run_ok(&program);
    assert_eq!(interp.global("last"), Some(Value::Integer(8)));
    assert_eq!(interp.global("low"), Some(Value::Integer(1)));
}

#[test]
fn test_duplicate_type_name() {
    let program = Program::new()
        .decl(EnumDecl::new("TKind", &["A"]))
        .decl(EnumDecl::new("TKind", &["B"]));
    expect_error(&program, "already declared");
}

// ============================================================================
// Engine limits and options
// ============================================================================

#[test]
fn test_runaway_recursion_is_fatal() {
    let program = Program::new()
        .decl(
            FunctionDecl::function("Dive", ty("Integer"))
                .param("N", ty("Integer"))
                .body(vec![result(call_fn("Dive", vec![add(ident("N"), int(1))]))]),
        )
        .stmt(let_("r", call_fn("Dive", vec![int(0)])));
    let options = EngineOptions::default().with_max_recursion_depth(16);
    let err = match run_with(options, &program) {
        Ok(_) => panic!("Expected recursion to be cut off"),
        Err(e) => e,
    };
    assert!(err.is_fatal());
    assert!(err.to_string().contains("maximum recursion depth exceeded"));
}

#[test]
fn test_options_from_json_disable_tobject() {
    let options = EngineOptions::from_json(r#"{"implicit_tobject": false}"#).unwrap();
    assert_eq!(options.max_recursion_depth, 256);
    let interp = Interpreter::with_options(options);
    assert!(interp.lookup_type("TObject").is_none());
}

#[test]
fn test_options_reject_unknown_fields() {
    assert!(EngineOptions::from_json(r#"{"verbose": true}"#).is_err());
}
