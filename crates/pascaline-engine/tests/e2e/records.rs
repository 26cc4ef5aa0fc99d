//! Record value semantics

use super::harness::*;

fn point_record() -> RecordDecl {
    RecordDecl::new("TPoint")
        .field(FieldDecl::new("X", ty("Integer")))
        .field(FieldDecl::new("Y", ty("Integer")))
        .method(
            FunctionDecl::procedure("Move")
                .param("DX", ty("Integer"))
                .param("DY", ty("Integer"))
                .body(vec![
                    set("X", add(ident("X"), ident("DX"))),
                    set("Y", add(ident("Y"), ident("DY"))),
                ]),
        )
        .method(
            FunctionDecl::function("Origin", ty("TPoint"))
                .class_method()
                .body(vec![result(record("TPoint", vec![("X", int(0)), ("Y", int(0))]))]),
        )
        .property(PropertyDecl::new("Sum", ty("Integer")).read_expr(add(ident("X"), ident("Y"))))
        .constant(ConstDecl::new("Dims", int(2)))
}

#[test]
fn test_method_mutation_is_written_back() {
    let program = Program::new()
        .decl(point_record())
        .stmt(var("p", ty("TPoint")))
        .stmt(assign(member(ident("p"), "X"), int(1)))
        .stmt(expr(method_call(ident("p"), "Move", vec![int(2), int(3)])))
        .stmt(let_("px", member(ident("p"), "X")))
        .stmt(let_("py", member(ident("p"), "Y")));
    let interp = run_ok(&program);
    assert_eq!(interp.global("px"), Some(Value::Integer(3)));
    assert_eq!(interp.global("py"), Some(Value::Integer(3)));
}

#[test]
fn test_assignment_copies() {
    let program = Program::new()
        .decl(point_record())
        .stmt(var("p", ty("TPoint")))
        .stmt(assign(member(ident("p"), "X"), int(5)))
        .stmt(let_("q", ident("p")))
        .stmt(assign(member(ident("q"), "X"), int(100)))
        .stmt(let_("px", member(ident("p"), "X")))
        .stmt(let_("qx", member(ident("q"), "X")));
    let interp = run_ok(&program);
    assert_eq!(interp.global("px"), Some(Value::Integer(5)));
    assert_eq!(interp.global("qx"), Some(Value::Integer(100)));
}

#[test]
fn test_record_literal_and_expression_property() {
    let program = Program::new()
        .decl(point_record())
        .stmt(let_("p", record("TPoint", vec![("X", int(2)), ("Y", int(5))])))
        .stmt(let_("s", member(ident("p"), "Sum")));
    expect_i64(&program, "s", 7);
}

#[test]
fn test_static_method_and_constant() {
    let program = Program::new()
        .decl(point_record())
        .stmt(let_("o", method_call(ident("TPoint"), "Origin", vec![])))
        .stmt(let_("ox", member(ident("o"), "X")))
        .stmt(let_("dims", member(ident("TPoint"), "Dims")));
    let interp = run_ok(&program);
    assert_eq!(interp.global("ox"), Some(Value::Integer(0)));
    assert_eq!(interp.global("dims"), Some(Value::Integer(2)));
}

// ============================================================================
// Receivers that are temporary copies
// ============================================================================

#[test]
fn test_record_field_in_object_is_not_written_back() {
    let program = Program::new()
        .decl(point_record())
        .decl(ClassDecl::new("TSprite").field(FieldDecl::new("Pos", ty("TPoint"))))
        .stmt(let_("s", method_call(ident("TSprite"), "Create", vec![])))
        .stmt(expr(method_call(member(ident("s"), "Pos"), "Move", vec![int(4), int(1)])))
        .stmt(let_("x", member(member(ident("s"), "Pos"), "X")));
    expect_i64(&program, "x", 0);
}

#[test]
fn test_method_on_array_element_leaves_array_unchanged() {
    let program = Program::new()
        .decl(point_record())
        .stmt(var("pts", static_array(ty("TPoint"), 0, 1)))
        .stmt(expr(method_call(index(ident("pts"), vec![int(0)]), "Move", vec![int(5), int(5)])))
        .stmt(let_("x", member(index(ident("pts"), vec![int(0)]), "X")));
    expect_i64(&program, "x", 0);
}

#[test]
fn test_method_on_function_result_leaves_source_unchanged() {
    let program = Program::new()
        .decl(point_record())
        .stmt(let_("g", record("TPoint", vec![("X", int(1)), ("Y", int(1))])))
        .decl(FunctionDecl::function("Current", ty("TPoint")).body(vec![result(ident("g"))]))
        .stmt(expr(method_call(call_fn("Current", vec![]), "Move", vec![int(3), int(3)])))
        .stmt(let_("gx", member(ident("g"), "X")));
    expect_i64(&program, "gx", 1);
}

// ============================================================================
// Self inside record methods
// ============================================================================

#[test]
fn test_self_sees_field_updates_before_nested_call() {
    let program = Program::new()
        .decl(
            RecordDecl::new("TR")
                .field(FieldDecl::new("X", ty("Integer")))
                .method(FunctionDecl::procedure("Inc1").body(vec![set("X", add(ident("X"), int(1)))]))
                .method(FunctionDecl::procedure("Inc2").body(vec![
                    set("X", int(5)),
                    expr(method_call(self_(), "Inc1", vec![])),
                ])),
        )
        .stmt(var("a", ty("TR")))
        .stmt(expr(method_call(ident("a"), "Inc2", vec![])))
        .stmt(let_("ax", member(ident("a"), "X")));
    expect_i64(&program, "ax", 6);
}

#[test]
fn test_unknown_record_field_in_literal() {
    let program = Program::new()
        .decl(point_record())
        .stmt(let_("p", record("TPoint", vec![("Z", int(1))])));
    expect_error(&program, "field 'Z' not found in record 'TPoint'");
}
