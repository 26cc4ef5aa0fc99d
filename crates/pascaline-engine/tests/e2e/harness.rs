//! Test harness for end-to-end execution
//!
//! Provides utilities for running assembled programs and checking the
//! globals they define.

#![allow(dead_code)]

pub use pascaline_engine::ast::build::*;
pub use pascaline_engine::ast::{
    ArrayTypeDecl, BinaryOp, ClassDecl, ConstDecl, EnumDecl, FieldDecl, FunctionDecl,
    HelperDecl, InterfaceDecl, OperatorDecl, Program, PropertyDecl, RecordDecl, Span,
    SubrangeDecl, TypeAliasDecl,
};
pub use pascaline_engine::{EngineOptions, Interpreter, RuntimeError, Value};

/// Result of an end-to-end run
pub type E2EResult<T> = Result<T, RuntimeError>;

/// Run a program with custom options
pub fn run_with(options: EngineOptions, program: &Program) -> E2EResult<Interpreter> {
    let mut interp = Interpreter::with_options(options);
    interp.run(program)?;
    Ok(interp)
}

/// Run a program with default options
pub fn run(program: &Program) -> E2EResult<Interpreter> {
    run_with(EngineOptions::default(), program)
}

/// Run a program that must succeed
pub fn run_ok(program: &Program) -> Interpreter {
    match run(program) {
        Ok(interp) => interp,
        Err(e) => panic!("Execution failed: {}\nProgram:\n{:#?}", e.describe(), program),
    }
}

/// Run a program and read one global
pub fn global(program: &Program, name: &str) -> Value {
    let interp = run_ok(program);
    interp
        .global(name)
        .unwrap_or_else(|| panic!("Global '{}' is not defined", name))
}

/// Run a program, expecting an integer global
pub fn expect_i64(program: &Program, name: &str, expected: i64) {
    match global(program, name) {
        Value::Integer(actual) => assert_eq!(actual, expected, "Wrong value for '{}'", name),
        other => panic!("Expected integer in '{}', got {:?}", name, other),
    }
}

/// Run a program, expecting a float global (within epsilon)
pub fn expect_f64(program: &Program, name: &str, expected: f64) {
    match global(program, name) {
        Value::Float(actual) => assert!(
            (actual - expected).abs() < 1e-10,
            "Expected {} in '{}', got {}",
            expected,
            name,
            actual
        ),
        other => panic!("Expected float in '{}', got {:?}", name, other),
    }
}

/// Run a program, expecting a string global
pub fn expect_string(program: &Program, name: &str, expected: &str) {
    match global(program, name) {
        Value::String(actual) => assert_eq!(actual.as_str(), expected, "Wrong value for '{}'", name),
        other => panic!("Expected string in '{}', got {:?}", name, other),
    }
}

/// Run a program, expecting a boolean global
pub fn expect_bool(program: &Program, name: &str, expected: bool) {
    match global(program, name) {
        Value::Boolean(actual) => assert_eq!(actual, expected, "Wrong value for '{}'", name),
        other => panic!("Expected boolean in '{}', got {:?}", name, other),
    }
}

/// Run a program that must fail with a message containing `fragment`
pub fn expect_error(program: &Program, fragment: &str) -> RuntimeError {
    match run(program) {
        Ok(_) => panic!("Expected an error containing '{}'", fragment),
        Err(e) => {
            assert!(
                e.to_string().contains(fragment),
                "Expected error containing '{}', got: {}",
                fragment,
                e
            );
            e
        }
    }
}
