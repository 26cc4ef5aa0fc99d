//! Classes: construction, fields, class members, lifecycle

use super::harness::*;

fn point_class() -> ClassDecl {
    ClassDecl::new("TPoint")
        .field(FieldDecl::new("X", ty("Integer")))
        .field(FieldDecl::new("Y", ty("Integer")))
        .method(
            FunctionDecl::constructor("Create")
                .param("AX", ty("Integer"))
                .param("AY", ty("Integer"))
                .body(vec![set("X", ident("AX")), set("Y", ident("AY"))]),
        )
        .method(FunctionDecl::function("Sum", ty("Integer")).body(vec![result(add(ident("X"), ident("Y")))]))
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_constructor_sets_fields() {
    let program = Program::new()
        .decl(point_class())
        .stmt(let_("p", method_call(ident("TPoint"), "Create", vec![int(3), int(4)])))
        .stmt(let_("s", method_call(ident("p"), "Sum", vec![])));
    expect_i64(&program, "s", 7);
}

#[test]
fn test_field_initializer_and_class_name() {
    let program = Program::new()
        .decl(ClassDecl::new("TBox").field(FieldDecl::new("Size", ty("Integer")).init(int(12))))
        .stmt(let_("b", method_call(ident("TBox"), "Create", vec![])))
        .stmt(let_("size", member(ident("b"), "Size")))
        .stmt(let_("name", member(ident("b"), "ClassName")));
    let interp = run_ok(&program);
    assert_eq!(interp.global("size"), Some(Value::Integer(12)));
    assert_eq!(interp.global("name"), Some(Value::string("TBox")));
}

#[test]
fn test_abstract_class_cannot_be_instantiated() {
    let program = Program::new()
        .decl(ClassDecl::new("TShape").abstract_())
        .stmt(let_("s", method_call(ident("TShape"), "Create", vec![])));
    expect_error(&program, "cannot instantiate abstract class");
}

#[test]
fn test_abstract_method_makes_class_abstract() {
    let program = Program::new()
        .decl(ClassDecl::new("TShape").method(
            FunctionDecl::function("Area", ty("Integer")).virtual_().abstract_(),
        ))
        .stmt(let_("s", method_call(ident("TShape"), "Create", vec![])));
    expect_error(&program, "cannot instantiate abstract class 'TShape'");
}

#[test]
fn test_child_constructor_hides_parent_with_same_signature() {
    let program = Program::new()
        .decl(
            ClassDecl::new("TBase")
                .field(FieldDecl::new("X", ty("Integer")))
                .method(
                    FunctionDecl::constructor("Make")
                        .param("A", ty("Integer"))
                        .body(vec![set("X", ident("A"))]),
                ),
        )
        .decl(
            ClassDecl::new("TDerived").parent("TBase").method(
                FunctionDecl::constructor("Make")
                    .param("A", ty("Integer"))
                    .body(vec![set("X", mul(ident("A"), int(10)))]),
            ),
        )
        .stmt(let_("d", method_call(ident("TDerived"), "Make", vec![int(2)])))
        .stmt(let_("b", method_call(ident("TBase"), "Make", vec![int(2)])))
        .stmt(let_("dx", member(ident("d"), "X")))
        .stmt(let_("bx", member(ident("b"), "X")));
    let interp = run_ok(&program);
    assert_eq!(interp.global("dx"), Some(Value::Integer(20)));
    assert_eq!(interp.global("bx"), Some(Value::Integer(2)));
}

#[test]
fn test_constructor_added_to_partial_parent_reaches_child() {
    let program = Program::new()
        .decl(ClassDecl::new("TPart").partial().field(FieldDecl::new("X", ty("Integer"))))
        .decl(ClassDecl::new("TChild").parent("TPart"))
        .decl(
            ClassDecl::new("TPart").partial().method(
                FunctionDecl::constructor("Make")
                    .param("A", ty("Integer"))
                    .body(vec![set("X", ident("A"))]),
            ),
        )
        .stmt(let_("c", method_call(ident("TChild"), "Make", vec![int(9)])))
        .stmt(let_("cx", member(ident("c"), "X")))
        .stmt(let_("name", member(ident("c"), "ClassName")));
    let interp = run_ok(&program);
    assert_eq!(interp.global("cx"), Some(Value::Integer(9)));
    assert_eq!(interp.global("name"), Some(Value::string("TChild")));
}

// ============================================================================
// Partial classes
// ============================================================================

#[test]
fn test_partial_class_declarations_merge() {
    let program = Program::new()
        .decl(ClassDecl::new("TMerged").partial().field(FieldDecl::new("A", ty("Integer")).init(int(1))))
        .decl(
            ClassDecl::new("TMerged")
                .partial()
                .field(FieldDecl::new("B", ty("Integer")).init(int(2)))
                .method(FunctionDecl::function("Total", ty("Integer")).body(vec![result(add(ident("A"), ident("B")))])),
        )
        .stmt(let_("m", method_call(ident("TMerged"), "Create", vec![])))
        .stmt(let_("t", method_call(ident("m"), "Total", vec![])));
    expect_i64(&program, "t", 3);
}

#[test]
fn test_duplicate_class_is_rejected() {
    let program = Program::new()
        .decl(ClassDecl::new("TOnce"))
        .decl(ClassDecl::new("TOnce"));
    expect_error(&program, "class 'TOnce' already declared");
}

// ============================================================================
// Class members
// ============================================================================

#[test]
fn test_class_var_shared_between_instances() {
    let program = Program::new()
        .decl(
            ClassDecl::new("TTracked")
                .field(FieldDecl::new("Count", ty("Integer")).class_var())
                .method(FunctionDecl::constructor("Create").body(vec![set("Count", add(ident("Count"), int(1)))])),
        )
        .stmt(let_("a", method_call(ident("TTracked"), "Create", vec![])))
        .stmt(let_("b", method_call(ident("TTracked"), "Create", vec![])))
        .stmt(let_("n", member(ident("TTracked"), "Count")));
    expect_i64(&program, "n", 2);
}

#[test]
fn test_class_method_on_class_reference() {
    let program = Program::new()
        .decl(ClassDecl::new("TMath").method(
            FunctionDecl::function("Twice", ty("Integer"))
                .class_method()
                .param("N", ty("Integer"))
                .body(vec![result(mul(ident("N"), int(2)))]),
        ))
        .stmt(let_("r", method_call(ident("TMath"), "Twice", vec![int(21)])));
    expect_i64(&program, "r", 42);
}

#[test]
fn test_instance_method_needs_instance() {
    let program = Program::new()
        .decl(point_class())
        .stmt(let_("s", method_call(ident("TPoint"), "Sum", vec![])));
    expect_error(&program, "without an instance");
}

#[test]
fn test_class_constants() {
    let program = Program::new()
        .decl(
            ClassDecl::new("TLimits")
                .constant(ConstDecl::new("Max", int(10)))
                .constant(ConstDecl::new("Double", mul(ident("Max"), int(2)))),
        )
        .stmt(let_("d", member(ident("TLimits"), "Double")));
    expect_i64(&program, "d", 20);
}

#[test]
fn test_assigning_constant_fails() {
    let program = Program::new()
        .decl(ClassDecl::new("TLimits").constant(ConstDecl::new("Max", int(10))))
        .stmt(assign(member(ident("TLimits"), "Max"), int(3)));
    expect_error(&program, "cannot assign to constant");
}

#[test]
fn test_nested_class() {
    let program = Program::new()
        .decl(
            ClassDecl::new("TOuter").nested(
                ClassDecl::new("TInner")
                    .method(FunctionDecl::function("Tag", ty("String")).body(vec![result(string("inner"))])),
            ),
        )
        .stmt(let_("i", method_call(member(ident("TOuter"), "TInner"), "Create", vec![])))
        .stmt(let_("t", method_call(ident("i"), "Tag", vec![])));
    expect_string(&program, "t", "inner");
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_free_runs_destructor() {
    let program = Program::new()
        .stmt(let_("log", int(0)))
        .decl(ClassDecl::new("TRes").method(
            FunctionDecl::destructor("Destroy")
                .override_()
                .body(vec![set("log", add(ident("log"), int(1)))]),
        ))
        .stmt(let_("r", method_call(ident("TRes"), "Create", vec![])))
        .stmt(expr(method_call(ident("r"), "Free", vec![])));
    expect_i64(&program, "log", 1);
}

#[test]
fn test_access_after_free_fails() {
    let program = Program::new()
        .decl(point_class())
        .stmt(let_("p", method_call(ident("TPoint"), "Create", vec![int(1), int(2)])))
        .stmt(expr(method_call(ident("p"), "Free", vec![])))
        .stmt(let_("x", member(ident("p"), "X")));
    expect_error(&program, "object already destroyed");
}

#[test]
fn test_unknown_parent_is_a_declaration_error() {
    let program = Program::new().decl(ClassDecl::new("TChild").parent("TMissing"));
    expect_error(&program, "parent class 'TMissing' not found");
}
