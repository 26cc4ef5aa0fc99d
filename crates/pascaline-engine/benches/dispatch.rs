use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pascaline_engine::ast::build::*;
use pascaline_engine::ast::{ClassDecl, FieldDecl, FunctionDecl, Program, PropertyDecl};
use pascaline_engine::Interpreter;

fn hierarchy(depth: usize) -> Program {
    let mut program = Program::new().decl(
        ClassDecl::new("TLevel0")
            .field(FieldDecl::new("FValue", ty("Integer")).init(int(1)))
            .method(FunctionDecl::function("Value", ty("Integer")).virtual_().body(vec![result(int(0))]))
            .property(PropertyDecl::new("Stored", ty("Integer")).read("FValue"))
            .property(PropertyDecl::new("Computed", ty("Integer")).read("Value")),
    );
    for level in 1..=depth {
        program = program.decl(
            ClassDecl::new(format!("TLevel{}", level))
                .parent(format!("TLevel{}", level - 1))
                .method(
                    FunctionDecl::function("Value", ty("Integer"))
                        .override_()
                        .body(vec![result(int(level as i64))]),
                ),
        );
    }
    program.stmt(let_(
        "obj",
        method_call(ident(&format!("TLevel{}", depth)), "Create", vec![]),
    ))
}

fn setup(depth: usize) -> Interpreter {
    let mut interp = Interpreter::new();
    interp.run(&hierarchy(depth)).unwrap();
    interp
}

fn bench_virtual_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("virtual_dispatch");
    let call = method_call(ident("obj"), "Value", vec![]);

    for depth in [1usize, 4, 16] {
        let mut interp = setup(depth);
        group.bench_with_input(BenchmarkId::new("depth", depth), &call, |b, call| {
            b.iter(|| interp.eval(black_box(call)).unwrap());
        });
    }

    group.finish();
}

fn bench_property_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("property_reads");
    let mut interp = setup(4);

    let stored = member(ident("obj"), "Stored");
    group.bench_function("field_backed", |b| {
        b.iter(|| interp.eval(black_box(&stored)).unwrap());
    });

    let computed = member(ident("obj"), "Computed");
    group.bench_function("method_backed", |b| {
        b.iter(|| interp.eval(black_box(&computed)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_virtual_dispatch, bench_property_reads);
criterion_main!(benches);
