//! Virtual dispatch, `inherited` and late method implementations

use super::harness::*;

fn animal() -> ClassDecl {
    ClassDecl::new("TAnimal")
        .method(FunctionDecl::function("Speak", ty("String")).virtual_().body(vec![result(string("..."))]))
        .method(
            FunctionDecl::function("Describe", ty("String"))
                .body(vec![result(add(string("I say "), call_fn("Speak", vec![])))]),
        )
}

fn dog() -> ClassDecl {
    ClassDecl::new("TDog")
        .parent("TAnimal")
        .method(FunctionDecl::function("Speak", ty("String")).override_().body(vec![result(string("woof"))]))
}

#[test]
fn test_override_reached_from_base_method() {
    let program = Program::new()
        .decl(animal())
        .decl(dog())
        .stmt(let_("d", method_call(ident("TDog"), "Create", vec![])))
        .stmt(let_("s", method_call(ident("d"), "Describe", vec![])));
    expect_string(&program, "s", "I say woof");
}

#[test]
fn test_base_instance_keeps_base_implementation() {
    let program = Program::new()
        .decl(animal())
        .decl(dog())
        .stmt(let_("a", method_call(ident("TAnimal"), "Create", vec![])))
        .stmt(let_("s", method_call(ident("a"), "Describe", vec![])));
    expect_string(&program, "s", "I say ...");
}

#[test]
fn test_inherited_call_binds_parent_statically() {
    let program = Program::new()
        .decl(animal())
        .decl(
            ClassDecl::new("TLoudDog").parent("TAnimal").method(
                FunctionDecl::function("Speak", ty("String"))
                    .override_()
                    .body(vec![result(add(inherited_call("Speak", vec![]), string("!")))]),
            ),
        )
        .stmt(let_("d", method_call(ident("TLoudDog"), "Create", vec![])))
        .stmt(let_("s", method_call(ident("d"), "Speak", vec![])));
    expect_string(&program, "s", "...!");
}

#[test]
fn test_out_of_line_implementation_reaches_descendants() {
    let program = Program::new()
        .decl(ClassDecl::new("TBase").method(FunctionDecl::function("Name", ty("String")).virtual_()))
        .decl(ClassDecl::new("TDerived").parent("TBase"))
        .decl(
            FunctionDecl::function("Name", ty("String"))
                .of("TBase")
                .body(vec![result(string("base"))]),
        )
        .stmt(let_("d", method_call(ident("TDerived"), "Create", vec![])))
        .stmt(let_("s", method_call(ident("d"), "Name", vec![])));
    expect_string(&program, "s", "base");
}

#[test]
fn test_inherited_constructor_chain() {
    let program = Program::new()
        .decl(
            ClassDecl::new("TBase")
                .field(FieldDecl::new("Level", ty("Integer")))
                .method(FunctionDecl::constructor("Create").body(vec![set("Level", int(1))])),
        )
        .decl(
            ClassDecl::new("TChild").parent("TBase").method(
                FunctionDecl::constructor("Create")
                    .body(vec![expr(inherited()), set("Level", add(ident("Level"), int(10)))]),
            ),
        )
        .stmt(let_("c", method_call(ident("TChild"), "Create", vec![])))
        .stmt(let_("level", member(ident("c"), "Level")));
    expect_i64(&program, "level", 11);
}

#[test]
fn test_calling_abstract_method_through_base() {
    let program = Program::new()
        .decl(
            ClassDecl::new("TShape")
                .method(FunctionDecl::function("Area", ty("Integer")).virtual_().abstract_()),
        )
        .decl(
            ClassDecl::new("TSquare")
                .parent("TShape")
                .method(FunctionDecl::function("Area", ty("Integer")).override_().body(vec![result(int(16))])),
        )
        .stmt(let_("s", method_call(ident("TSquare"), "Create", vec![])))
        .stmt(let_("a", method_call(ident("s"), "Area", vec![])));
    expect_i64(&program, "a", 16);
}

#[test]
fn test_overloads_pick_by_argument_type() {
    let program = Program::new()
        .decl(
            ClassDecl::new("TFmt")
                .method(
                    FunctionDecl::function("Show", ty("String"))
                        .overload()
                        .param("V", ty("Integer"))
                        .body(vec![result(string("int"))]),
                )
                .method(
                    FunctionDecl::function("Show", ty("String"))
                        .overload()
                        .param("V", ty("String"))
                        .body(vec![result(string("str"))]),
                ),
        )
        .stmt(let_("f", method_call(ident("TFmt"), "Create", vec![])))
        .stmt(let_("a", method_call(ident("f"), "Show", vec![int(1)])))
        .stmt(let_("b", method_call(ident("f"), "Show", vec![string("x")])));
    let interp = run_ok(&program);
    assert_eq!(interp.global("a"), Some(Value::string("int")));
    assert_eq!(interp.global("b"), Some(Value::string("str")));
}
