//! Operator overloads and conversions

use super::harness::*;

fn vec_class() -> ClassDecl {
    ClassDecl::new("TVec")
        .field(FieldDecl::new("X", ty("Integer")))
        .method(
            FunctionDecl::constructor("Create")
                .param("AX", ty("Integer"))
                .body(vec![set("X", ident("AX"))]),
        )
        .method(
            FunctionDecl::function("Add", ty("TVec"))
                .param("Other", ty("TVec"))
                .body(vec![result(method_call(
                    ident("TVec"),
                    "Create",
                    vec![add(ident("X"), member(ident("Other"), "X"))],
                ))]),
        )
        .method(
            FunctionDecl::function("SameAs", ty("Boolean"))
                .param("Other", ty("TVec"))
                .body(vec![result(eq(ident("X"), member(ident("Other"), "X")))]),
        )
        .operator(OperatorDecl::class("+", vec![ty("TVec"), ty("TVec")], "Add").returns(ty("TVec")))
        .operator(OperatorDecl::class("=", vec![ty("TVec"), ty("TVec")], "SameAs").returns(ty("Boolean")))
}

fn repeat_fn() -> FunctionDecl {
    FunctionDecl::function("Repeat", ty("String"))
        .param("S", ty("String"))
        .param("N", ty("Integer"))
        .body(vec![
            result(string("")),
            for_to("i", int(1), ident("N"), set("Result", add(ident("Result"), ident("S")))),
        ])
}

// ============================================================================
// Class operators
// ============================================================================

#[test]
fn test_class_operator_dispatches_on_left_operand() {
    let program = Program::new()
        .decl(vec_class())
        .stmt(let_("a", method_call(ident("TVec"), "Create", vec![int(2)])))
        .stmt(let_("b", method_call(ident("TVec"), "Create", vec![int(5)])))
        .stmt(let_("c", add(ident("a"), ident("b"))))
        .stmt(let_("x", member(ident("c"), "X")));
    expect_i64(&program, "x", 7);
}

#[test]
fn test_not_equal_falls_back_to_negated_equality() {
    let program = Program::new()
        .decl(vec_class())
        .stmt(let_("a", method_call(ident("TVec"), "Create", vec![int(1)])))
        .stmt(let_("b", method_call(ident("TVec"), "Create", vec![int(2)])))
        .stmt(let_("same", eq(ident("a"), ident("b"))))
        .stmt(let_("differ", binary(BinaryOp::Ne, ident("a"), ident("b"))));
    let interp = run_ok(&program);
    assert_eq!(interp.global("same"), Some(Value::Boolean(false)));
    assert_eq!(interp.global("differ"), Some(Value::Boolean(true)));
}

#[test]
fn test_class_operator_applies_to_descendants() {
    let program = Program::new()
        .decl(vec_class())
        .decl(ClassDecl::new("TVec2").parent("TVec"))
        .stmt(let_("a", method_call(ident("TVec2"), "Create", vec![int(3)])))
        .stmt(let_("b", method_call(ident("TVec2"), "Create", vec![int(4)])))
        .stmt(let_("x", member(add(ident("a"), ident("b")), "X")));
    expect_i64(&program, "x", 7);
}

#[test]
fn test_class_operator_signature_is_exact() {
    let point = ClassDecl::new("TPoint")
        .field(FieldDecl::new("X", ty("Integer")).init(int(1)))
        .method(
            FunctionDecl::function("Shift", ty("Integer"))
                .param("N", ty("Integer"))
                .body(vec![result(add(ident("X"), ident("N")))]),
        )
        .operator(OperatorDecl::class("+", vec![ty("Integer")], "Shift").returns(ty("Integer")));

    let exact = Program::new()
        .decl(point.clone())
        .stmt(let_("p", method_call(ident("TPoint"), "Create", vec![])))
        .stmt(let_("r", add(ident("p"), int(2))));
    expect_i64(&exact, "r", 3);

    let float_operand = Program::new()
        .decl(point.clone())
        .stmt(let_("p", method_call(ident("TPoint"), "Create", vec![])))
        .stmt(let_("r", add(ident("p"), float(2.5))));
    expect_error(&float_operand, "operator '+' not applicable");

    let swapped = Program::new()
        .decl(point)
        .stmt(let_("p", method_call(ident("TPoint"), "Create", vec![])))
        .stmt(let_("r", add(int(2), ident("p"))));
    expect_error(&swapped, "operator '+' not applicable");
}

#[test]
fn test_class_in_operator_takes_class_as_right_operand() {
    let program = Program::new()
        .decl(
            ClassDecl::new("TRange")
                .field(FieldDecl::new("Limit", ty("Integer")).init(int(10)))
                .method(
                    FunctionDecl::function("Contains", ty("Boolean"))
                        .param("N", ty("Integer"))
                        .body(vec![result(lt(ident("N"), ident("Limit")))]),
                )
                .operator(OperatorDecl::class("in", vec![ty("Integer")], "Contains").returns(ty("Boolean"))),
        )
        .stmt(let_("r", method_call(ident("TRange"), "Create", vec![])))
        .stmt(let_("inside", binary(BinaryOp::In, int(3), ident("r"))))
        .stmt(let_("outside", binary(BinaryOp::In, int(12), ident("r"))));
    let interp = run_ok(&program);
    assert_eq!(interp.global("inside"), Some(Value::Boolean(true)));
    assert_eq!(interp.global("outside"), Some(Value::Boolean(false)));
}

// ============================================================================
// Global operators
// ============================================================================

#[test]
fn test_global_operator_exact_operand_order() {
    let program = Program::new()
        .decl(repeat_fn())
        .decl(OperatorDecl::global("*", vec![ty("String"), ty("Integer")], "Repeat").returns(ty("String")))
        .stmt(let_("s", mul(string("ab"), int(3))));
    expect_string(&program, "s", "ababab");

    let reversed = Program::new()
        .decl(repeat_fn())
        .decl(OperatorDecl::global("*", vec![ty("String"), ty("Integer")], "Repeat").returns(ty("String")))
        .stmt(let_("s", mul(int(3), string("ab"))));
    expect_error(&reversed, "not applicable");
}

#[test]
fn test_operator_bound_to_unknown_function() {
    let program = Program::new().decl(OperatorDecl::global(
        "+",
        vec![ty("String"), ty("Boolean")],
        "NoSuchFunction",
    ));
    expect_error(&program, "bound to unknown function");
}

// ============================================================================
// Conversions
// ============================================================================

fn money() -> Program {
    Program::new()
        .decl(RecordDecl::new("TMoney").field(FieldDecl::new("Cents", ty("Integer"))))
        .decl(
            FunctionDecl::function("IntToMoney", ty("TMoney"))
                .param("N", ty("Integer"))
                .body(vec![result(record("TMoney", vec![("Cents", mul(ident("N"), int(100)))]))]),
        )
        .decl(OperatorDecl::conversion(true, ty("Integer"), ty("TMoney"), "IntToMoney"))
}

#[test]
fn test_implicit_conversion_on_typed_declaration() {
    let program = money()
        .stmt(var_init("m", ty("TMoney"), int(5)))
        .stmt(let_("c", member(ident("m"), "Cents")));
    expect_i64(&program, "c", 500);
}

#[test]
fn test_explicit_cast_uses_conversion() {
    let program = money()
        .stmt(let_("m", call_fn("TMoney", vec![int(7)])))
        .stmt(let_("c", member(ident("m"), "Cents")));
    expect_i64(&program, "c", 700);
}

#[test]
fn test_primitive_casts() {
    let program = Program::new()
        .stmt(let_("i", call_fn("Integer", vec![float(3.9)])))
        .stmt(let_("s", call_fn("String", vec![int(42)])));
    let interp = run_ok(&program);
    assert_eq!(interp.global("i"), Some(Value::Integer(3)));
    assert_eq!(interp.global("s"), Some(Value::string("42")));
}
