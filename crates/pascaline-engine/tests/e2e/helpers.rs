//! Helpers: user helpers on scalars and classes, intrinsic helpers

use super::harness::*;

#[test]
fn test_integer_helper_method() {
    let program = Program::new()
        .decl(
            HelperDecl::new("TIntExtras", ty("Integer"))
                .method(FunctionDecl::function("Double", ty("Integer")).body(vec![result(mul(self_(), int(2)))])),
        )
        .stmt(let_("n", int(21)))
        .stmt(let_("d", method_call(ident("n"), "Double", vec![])));
    expect_i64(&program, "d", 42);
}

#[test]
fn test_intrinsic_array_and_string_helpers() {
    let program = Program::new()
        .stmt(let_("a", array(vec![int(1), int(2), int(3)])))
        .stmt(let_("len", member(ident("a"), "Length")))
        .stmt(let_("high", member(ident("a"), "High")))
        .stmt(let_("up", method_call(string("abc"), "ToUpper", vec![])));
    let interp = run_ok(&program);
    assert_eq!(interp.global("len"), Some(Value::Integer(3)));
    assert_eq!(interp.global("high"), Some(Value::Integer(2)));
    assert_eq!(interp.global("up"), Some(Value::string("ABC")));
}

#[test]
fn test_array_add_through_helper() {
    let program = Program::new()
        .stmt(var("a", array_of(ty("Integer"))))
        .stmt(expr(method_call(ident("a"), "Add", vec![int(9)])))
        .stmt(let_("first", index(ident("a"), vec![int(0)])));
    expect_i64(&program, "first", 9);
}

#[test]
fn test_class_helper_sees_fields() {
    let program = Program::new()
        .decl(ClassDecl::new("TUser").field(FieldDecl::new("Name", ty("String")).init(string("ada"))))
        .decl(
            HelperDecl::new("TUserHelper", ty("TUser")).method(
                FunctionDecl::function("Greeting", ty("String"))
                    .body(vec![result(add(string("hi "), member(self_(), "Name")))]),
            ),
        )
        .stmt(let_("u", method_call(ident("TUser"), "Create", vec![])))
        .stmt(let_("g", method_call(ident("u"), "Greeting", vec![])));
    expect_string(&program, "g", "hi ada");
}

#[test]
fn test_helper_class_var_and_property() {
    let program = Program::new()
        .decl(
            HelperDecl::new("TStrStats", ty("String"))
                .class_var(FieldDecl::new("Calls", ty("Integer")))
                .method(
                    FunctionDecl::function("Tracked", ty("String"))
                        .body(vec![set("Calls", add(ident("Calls"), int(1))), result(self_())]),
                )
                .property(PropertyDecl::new("Seen", ty("Integer")).read("Calls")),
        )
        .stmt(expr(method_call(string("x"), "Tracked", vec![])))
        .stmt(expr(method_call(string("y"), "Tracked", vec![])))
        .stmt(let_("seen", member(string("z"), "Seen")));
    expect_i64(&program, "seen", 2);
}

#[test]
fn test_helper_inheritance() {
    let program = Program::new()
        .decl(
            HelperDecl::new("TBaseInt", ty("Integer"))
                .method(FunctionDecl::function("Inc1", ty("Integer")).body(vec![result(add(self_(), int(1)))])),
        )
        .decl(
            HelperDecl::new("TMoreInt", ty("Integer"))
                .parent("TBaseInt")
                .method(FunctionDecl::function("Inc2", ty("Integer")).body(vec![result(add(self_(), int(2)))])),
        )
        .stmt(let_("n", method_call(int(1), "Inc1", vec![])));
    expect_i64(&program, "n", 2);
}
