//! Property access: field and method backed, indexed, default, class level

use super::harness::*;

fn counter() -> ClassDecl {
    ClassDecl::new("TCounter")
        .field(FieldDecl::new("FCount", ty("Integer")))
        .method(
            FunctionDecl::procedure("SetCount")
                .param("Value", ty("Integer"))
                .body(vec![set("FCount", mul(ident("Value"), int(2)))]),
        )
        .property(PropertyDecl::new("Count", ty("Integer")).read("FCount").write("SetCount"))
        .property(PropertyDecl::new("Peek", ty("Integer")).read("FCount"))
}

fn squares() -> ClassDecl {
    ClassDecl::new("TSquares")
        .field(FieldDecl::new("FLast", ty("Integer")))
        .method(
            FunctionDecl::function("GetItem", ty("Integer"))
                .param("I", ty("Integer"))
                .body(vec![result(mul(ident("I"), ident("I")))]),
        )
        .method(
            FunctionDecl::procedure("SetItem")
                .param("I", ty("Integer"))
                .param("V", ty("Integer"))
                .body(vec![set("FLast", add(ident("I"), ident("V")))]),
        )
        .property(
            PropertyDecl::new("Items", ty("Integer"))
                .index_param("I", ty("Integer"))
                .read("GetItem")
                .write("SetItem")
                .default_(),
        )
}

// ============================================================================
// Simple properties
// ============================================================================

#[test]
fn test_field_read_and_setter_write() {
    let program = Program::new()
        .decl(counter())
        .stmt(let_("c", method_call(ident("TCounter"), "Create", vec![])))
        .stmt(assign(member(ident("c"), "Count"), int(5)))
        .stmt(let_("n", member(ident("c"), "Count")));
    expect_i64(&program, "n", 10);
}

#[test]
fn test_read_only_property() {
    let program = Program::new()
        .decl(counter())
        .stmt(let_("c", method_call(ident("TCounter"), "Create", vec![])))
        .stmt(assign(member(ident("c"), "Peek"), int(1)));
    expect_error(&program, "property 'Peek' is read-only");
}

#[test]
fn test_circular_getter_is_detected() {
    let program = Program::new()
        .decl(
            ClassDecl::new("TLoop")
                .method(FunctionDecl::function("GetX", ty("Integer")).body(vec![result(ident("X"))]))
                .property(PropertyDecl::new("X", ty("Integer")).read("GetX")),
        )
        .stmt(let_("o", method_call(ident("TLoop"), "Create", vec![])))
        .stmt(let_("x", member(ident("o"), "X")));
    expect_error(&program, "circular property reference detected");
}

#[test]
fn test_mutually_reading_getters_are_detected() {
    let program = Program::new()
        .decl(
            ClassDecl::new("TPair")
                .method(FunctionDecl::function("GetA", ty("Integer")).body(vec![result(ident("B"))]))
                .method(FunctionDecl::function("GetB", ty("Integer")).body(vec![result(ident("A"))]))
                .property(PropertyDecl::new("A", ty("Integer")).read("GetA"))
                .property(PropertyDecl::new("B", ty("Integer")).read("GetB")),
        )
        .stmt(let_("o", method_call(ident("TPair"), "Create", vec![])))
        .stmt(let_("a", member(ident("o"), "A")));
    expect_error(&program, "circular property reference detected");
}

#[test]
fn test_write_only_property_read_fails() {
    let program = Program::new()
        .decl(counter().property(PropertyDecl::new("Sink", ty("Integer")).write("SetCount")))
        .stmt(let_("c", method_call(ident("TCounter"), "Create", vec![])))
        .stmt(assign(member(ident("c"), "Sink"), int(3)))
        .stmt(let_("n", member(ident("c"), "Sink")));
    expect_error(&program, "property 'Sink' is write-only");
}

#[test]
fn test_write_only_class_property_read_fails() {
    let program = Program::new()
        .decl(
            ClassDecl::new("TStats")
                .field(FieldDecl::new("FTotal", ty("Integer")).class_var())
                .property(PropertyDecl::new("Total", ty("Integer")).write("FTotal").class_property()),
        )
        .stmt(assign(member(ident("TStats"), "Total"), int(4)))
        .stmt(let_("t", member(ident("TStats"), "Total")));
    expect_error(&program, "property 'Total' is write-only");
}

#[test]
fn test_identifier_accessor_prefers_class_var_then_constant() {
    let shared = ClassDecl::new("TShadow")
        .field(FieldDecl::new("V", ty("Integer")).init(int(1)))
        .constant(ConstDecl::new("V", int(2)))
        .property(PropertyDecl::new("P", ty("Integer")).read("V"));
    let with_class_var = Program::new()
        .decl(shared.clone().field(FieldDecl::new("V", ty("Integer")).init(int(3)).class_var()))
        .stmt(let_("o", method_call(ident("TShadow"), "Create", vec![])))
        .stmt(let_("p", member(ident("o"), "P")));
    expect_i64(&with_class_var, "p", 3);

    let without_class_var = Program::new()
        .decl(shared)
        .stmt(let_("o", method_call(ident("TShadow"), "Create", vec![])))
        .stmt(let_("p", member(ident("o"), "P")));
    expect_i64(&without_class_var, "p", 2);
}

#[test]
fn test_expression_getter() {
    let program = Program::new()
        .decl(
            ClassDecl::new("TRect")
                .field(FieldDecl::new("W", ty("Integer")).init(int(3)))
                .field(FieldDecl::new("H", ty("Integer")).init(int(4)))
                .property(PropertyDecl::new("Area", ty("Integer")).read_expr(mul(ident("W"), ident("H")))),
        )
        .stmt(let_("r", method_call(ident("TRect"), "Create", vec![])))
        .stmt(let_("a", member(ident("r"), "Area")));
    expect_i64(&program, "a", 12);
}

// ============================================================================
// Indexed and default properties
// ============================================================================

#[test]
fn test_default_property_matches_named_access() {
    let program = Program::new()
        .decl(squares())
        .stmt(let_("l", method_call(ident("TSquares"), "Create", vec![])))
        .stmt(let_("a", index(member(ident("l"), "Items"), vec![int(3)])))
        .stmt(let_("b", index(ident("l"), vec![int(3)])));
    let interp = run_ok(&program);
    assert_eq!(interp.global("a"), Some(Value::Integer(9)));
    assert_eq!(interp.global("b"), Some(Value::Integer(9)));
}

#[test]
fn test_default_property_setter() {
    let program = Program::new()
        .decl(squares())
        .stmt(let_("l", method_call(ident("TSquares"), "Create", vec![])))
        .stmt(assign(index(ident("l"), vec![int(2)]), int(5)))
        .stmt(let_("last", member(ident("l"), "FLast")));
    expect_i64(&program, "last", 7);
}

#[test]
fn test_index_directive_passes_constant() {
    let program = Program::new()
        .decl(
            ClassDecl::new("TSlots")
                .method(
                    FunctionDecl::function("GetSlot", ty("Integer"))
                        .param("Index", ty("Integer"))
                        .body(vec![result(mul(ident("Index"), int(10)))]),
                )
                .property(PropertyDecl::new("First", ty("Integer")).read("GetSlot").index(int(1)))
                .property(PropertyDecl::new("Second", ty("Integer")).read("GetSlot").index(int(2))),
        )
        .stmt(let_("s", method_call(ident("TSlots"), "Create", vec![])))
        .stmt(let_("total", add(member(ident("s"), "First"), member(ident("s"), "Second"))));
    expect_i64(&program, "total", 30);
}

#[test]
fn test_class_property_backed_by_class_var() {
    let program = Program::new()
        .decl(
            ClassDecl::new("TStats")
                .field(FieldDecl::new("FTotal", ty("Integer")).class_var())
                .property(
                    PropertyDecl::new("Total", ty("Integer"))
                        .read("FTotal")
                        .write("FTotal")
                        .class_property(),
                ),
        )
        .stmt(assign(member(ident("TStats"), "Total"), int(4)))
        .stmt(let_("t", member(ident("TStats"), "Total")));
    expect_i64(&program, "t", 4);
}

#[test]
fn test_inherited_property() {
    let program = Program::new()
        .decl(counter())
        .decl(ClassDecl::new("TSubCounter").parent("TCounter"))
        .stmt(let_("c", method_call(ident("TSubCounter"), "Create", vec![])))
        .stmt(assign(member(ident("c"), "Count"), int(2)))
        .stmt(let_("n", member(ident("c"), "Count")));
    expect_i64(&program, "n", 4);
}

#[test]
fn test_indexed_property_cannot_be_field_backed() {
    let program = Program::new()
        .decl(
            ClassDecl::new("TGrid")
                .field(FieldDecl::new("FCells", ty("Integer")))
                .property(
                    PropertyDecl::new("Cells", ty("Integer"))
                        .index_param("I", ty("Integer"))
                        .read("FCells")
                        .write("FCells"),
                ),
        )
        .stmt(let_("g", method_call(ident("TGrid"), "Create", vec![])))
        .stmt(let_("c", index(member(ident("g"), "Cells"), vec![int(0)])));
    expect_error(&program, "property 'Cells' has index arguments and cannot be field-backed");

    let write = Program::new()
        .decl(
            ClassDecl::new("TGrid")
                .field(FieldDecl::new("FCells", ty("Integer")).class_var())
                .property(
                    PropertyDecl::new("Cells", ty("Integer"))
                        .index_param("I", ty("Integer"))
                        .write("FCells"),
                ),
        )
        .stmt(let_("g", method_call(ident("TGrid"), "Create", vec![])))
        .stmt(assign(index(member(ident("g"), "Cells"), vec![int(0)]), int(1)));
    expect_error(&write, "property 'Cells' has index arguments and cannot be field-backed");
}
