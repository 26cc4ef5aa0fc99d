//! Interfaces, `is` and `as`

use super::harness::*;

fn shape_program() -> Program {
    Program::new()
        .decl(InterfaceDecl::new("IShape").method(FunctionDecl::function("Area", ty("Integer"))))
        .decl(InterfaceDecl::new("INamed").method(FunctionDecl::function("Name", ty("String"))))
        .decl(
            ClassDecl::new("TSquare")
                .implements("IShape")
                .field(FieldDecl::new("Side", ty("Integer")).init(int(3)))
                .method(FunctionDecl::function("Area", ty("Integer")).body(vec![result(mul(ident("Side"), ident("Side")))])),
        )
        .decl(ClassDecl::new("TBigSquare").parent("TSquare"))
}

#[test]
fn test_missing_interface_method() {
    let program = Program::new()
        .decl(InterfaceDecl::new("IShape").method(FunctionDecl::function("Area", ty("Integer"))))
        .decl(ClassDecl::new("TBlob").implements("IShape"));
    expect_error(&program, "does not implement interface method");
}

#[test]
fn test_is_checks_classes_and_interfaces() {
    let program = shape_program()
        .stmt(let_("b", method_call(ident("TBigSquare"), "Create", vec![])))
        .stmt(let_("is_shape", is(ident("b"), "IShape")))
        .stmt(let_("is_square", is(ident("b"), "TSquare")))
        .stmt(let_("is_named", is(ident("b"), "INamed")));
    let interp = run_ok(&program);
    assert_eq!(interp.global("is_shape"), Some(Value::Boolean(true)));
    assert_eq!(interp.global("is_square"), Some(Value::Boolean(true)));
    assert_eq!(interp.global("is_named"), Some(Value::Boolean(false)));
}

#[test]
fn test_as_interface_then_call() {
    let program = shape_program()
        .stmt(let_("s", method_call(ident("TSquare"), "Create", vec![])))
        .stmt(let_("shape", as_(ident("s"), "IShape")))
        .stmt(let_("area", method_call(ident("shape"), "Area", vec![])));
    expect_i64(&program, "area", 9);
}

#[test]
fn test_invalid_cast() {
    let program = shape_program()
        .stmt(let_("s", method_call(ident("TSquare"), "Create", vec![])))
        .stmt(let_("n", as_(ident("s"), "INamed")));
    expect_error(&program, "invalid class cast");
}

#[test]
fn test_interface_parent_methods_are_required() {
    let program = Program::new()
        .decl(InterfaceDecl::new("IBase").method(FunctionDecl::procedure("Reset")))
        .decl(InterfaceDecl::new("IChild").parent("IBase").method(FunctionDecl::procedure("Step")))
        .decl(
            ClassDecl::new("TStepper")
                .implements("IChild")
                .method(FunctionDecl::procedure("Step").body(vec![])),
        );
    expect_error(&program, "interface method 'IChild.Reset'");
}

#[test]
fn test_is_unknown_type() {
    let program = shape_program()
        .stmt(let_("s", method_call(ident("TSquare"), "Create", vec![])))
        .stmt(let_("x", is(ident("s"), "IMissing")));
    expect_error(&program, "type 'IMissing' not found");
}
