//! Integration tests for end-to-end compilation.
//!
//! These tests run the complete pipeline, from source text through
//! tokenization, parsing and lowering, then execute the lowered functions
//! with LLVM's JIT.

use helang::{
    compile_source,
    compiler::compiler::CompileOptions,
    errors::errors::{Error, ErrorImpl},
    render_error,
};
use indoc::indoc;
use inkwell::{
    context::Context,
    targets::{InitializationConfig, Target},
    OptimizationLevel,
};
use pretty_assertions::assert_eq;

/// Compiles `source` and calls its nullary function `function`.
fn run_i32(source: &str, function: &str) -> i32 {
    Target::initialize_native(&InitializationConfig::default()).unwrap();

    let context = Context::create();
    let compiler = compile_source(source, "test", &context, &CompileOptions::default()).unwrap();
    let engine = compiler
        .module
        .create_jit_execution_engine(OptimizationLevel::None)
        .unwrap();

    unsafe {
        let compiled = engine
            .get_function::<unsafe extern "C" fn() -> i32>(function)
            .unwrap();
        compiled.call()
    }
}

fn compile_error(source: &str) -> Error {
    let context = Context::create();
    let error = match compile_source(source, "test", &context, &CompileOptions::default()) {
        Ok(_) => panic!("expected compilation to fail"),
        Err(error) => error,
    };
    error
}

#[test]
fn test_priority_table() {
    assert_eq!(run_i32("fn f() -> i32 { 1 + 2 * 3 }", "f"), 7);
    assert_eq!(run_i32("fn f() -> i32 { (1 + 2) * 3 }", "f"), 9);
    assert_eq!(run_i32("fn f() -> i32 { 8 / 2 - 1 }", "f"), 3);
}

#[test]
fn test_mutable_variable() {
    let source = "fn f() -> i32 { mut i32 x = 0; x = x + 1; x }";

    assert_eq!(run_i32(source, "f"), 1);
}

#[test]
fn test_mutable_variable_without_initializer() {
    let source = indoc! {"
        fn f() -> i32 {
            mut i32 x;
            x = 40;
            x = x + 2;
            x
        }
    "};

    assert_eq!(run_i32(source, "f"), 42);
}

#[test]
fn test_if_else() {
    let source = "fn f() -> i32 { if (1 == 0) { 1 } else { 2 } }";

    assert_eq!(run_i32(source, "f"), 2);
}

#[test]
fn test_elif_is_checked_before_else() {
    let source = "fn f() -> i32 { if (1 == 0) { 1 } elif (1 == 1) { 3 } else { 2 } }";

    assert_eq!(run_i32(source, "f"), 3);
}

#[test]
fn test_if_value_is_not_truncated_to_first_branch() {
    let source = "fn f() -> i32 { if (1 == 0) { 1 == 1 } else { 7 } }";

    assert_eq!(run_i32(source, "f"), 7);
}

#[test]
fn test_if_as_statement() {
    let source = indoc! {"
        fn f() -> i32 {
            mut i32 x = 1;
            if (x != 0) { x = x * 10; }
            if (x == 0) { x = 0; } else { x = x + 5; }
            x
        }
    "};

    assert_eq!(run_i32(source, "f"), 15);
}

#[test]
fn test_nested_if() {
    let source = indoc! {"
        fn pick(i32 a, i32 b) -> i32 {
            if (a) {
                if (b) { 1 } else { 2 }
            } else {
                3
            }
        }
        fn f() -> i32 { pick(1, 0) * 10 + pick(0, 1) }
    "};

    assert_eq!(run_i32(source, "f"), 23);
}

#[test]
fn test_calls_and_entry_function() {
    let source = indoc! {"
        # adds two numbers
        fn add(i32 a, i32 b) -> i32 { a + b }
        fn main() -> i32 { add(add(1, 2), 4) }
        fn twice() -> i32 { main() * 2 }
    "};

    assert_eq!(run_i32(source, "__he_entry_main"), 7);
    assert_eq!(run_i32(source, "twice"), 14);
}

#[test]
fn test_calls_before_definition() {
    let source = "fn f() -> i32 { g(5) } fn g(i32 n) -> i32 { n - 1 }";

    assert_eq!(run_i32(source, "f"), 4);
}

#[test]
fn test_default_return_value() {
    assert_eq!(run_i32("fn f() -> i32 { i32 x = 5; }", "f"), 0);
    assert_eq!(run_i32("fn f() -> i32 { }", "f"), 0);
}

#[test]
fn test_byte_packing() {
    Target::initialize_native(&InitializationConfig::default()).unwrap();

    let context = Context::create();
    let compiler = compile_source(
        "fn f() -> u8 { 1 | 2 | 3 }",
        "test",
        &context,
        &CompileOptions::default(),
    )
    .unwrap();
    let engine = compiler
        .module
        .create_jit_execution_engine(OptimizationLevel::None)
        .unwrap();

    let value = unsafe {
        engine
            .get_function::<unsafe extern "C" fn() -> u64>("f")
            .unwrap()
            .call()
    };

    assert_eq!(value, (1 << 16) | (2 << 8) | 3);
}

#[test]
fn test_parameters() {
    Target::initialize_native(&InitializationConfig::default()).unwrap();

    let context = Context::create();
    let compiler = compile_source(
        "fn pow2(i32 n) -> i32 { i32 m = n * n; m }",
        "test",
        &context,
        &CompileOptions::default(),
    )
    .unwrap();
    let engine = compiler
        .module
        .create_jit_execution_engine(OptimizationLevel::None)
        .unwrap();

    let value = unsafe {
        engine
            .get_function::<unsafe extern "C" fn(i32) -> i32>("pow2")
            .unwrap()
            .call(12)
    };

    assert_eq!(value, 144);
}

#[test]
fn test_undeclared_function() {
    let error = compile_error("fn f() -> i32 { missing(1) }");

    assert_eq!(
        error.get_kind(),
        &ErrorImpl::FunctionNotDeclared {
            function: String::from("missing")
        }
    );
    assert!(error.to_string().contains("\"missing\""));
}

#[test]
fn test_argument_count_mismatch() {
    let error = compile_error("fn g(i32 a, i32 b) -> i32 { a } fn f() -> i32 { g(1) }");

    assert_eq!(
        error.get_kind(),
        &ErrorImpl::ArgumentCountMismatch {
            expected: 2,
            received: 1
        }
    );
    assert_eq!(error.get_function(), Some("f"));
    assert!(error
        .to_string()
        .contains("function call expects 2 arguments but 1 were found"));
}

#[test]
fn test_redeclaration_in_one_function() {
    let sources = [
        "fn f() -> i32 { mut i32 x = 1; i32 x = 2; x }",
        "fn f() -> i32 { i32 x = 1; mut i32 x = 2; x }",
        "fn f() -> i32 { i32 x = 1; i32 x = 2; x }",
        "fn f() -> i32 { mut i32 x = 1; mut i32 x = 2; x }",
        "fn f(i32 x) -> i32 { mut i32 x = 1; x }",
    ];

    for source in sources {
        assert_eq!(
            compile_error(source).get_kind(),
            &ErrorImpl::VariableAlreadyDeclared {
                variable: String::from("x")
            },
            "{}",
            source
        );
    }
}

#[test]
fn test_same_name_in_different_functions() {
    let source = indoc! {"
        fn f() -> i32 { i32 x = 1; x }
        fn g() -> i32 { mut i32 x = 2; x + f() }
    "};

    assert_eq!(run_i32(source, "g"), 3);
}

#[test]
fn test_first_error_stops_compilation() {
    let error = compile_error(indoc! {"
        fn f() -> i32 { a }
        fn g() -> i32 { b }
    "});

    assert_eq!(
        error.get_kind(),
        &ErrorImpl::VariableNotDeclared {
            variable: String::from("a")
        }
    );
}

#[test]
fn test_render_lowering_error() {
    let source = indoc! {"
        fn f() -> i32 {
            y + 1
        }
    "};
    let error = compile_error(source);

    assert_eq!(
        render_error(&error, source),
        indoc! {"
            Error: codegen error in function `f` at (2:4-5): undefined variable \"y\" (variables of enclosing scopes are not visible here)
              |
            2 |     y + 1
              |     ^
        "}
    );
}

#[test]
fn test_render_parser_error() {
    let source = "fn f() -> i32 { (1 + 2 }";
    let error = compile_error(source);
    let rendered = render_error(&error, source);

    assert!(rendered.starts_with("Error: parser error at (1:16-17)"));
    assert!(rendered.contains("check that every bracket is closed"));
}

#[test]
fn test_emit_object_file() {
    let context = Context::create();
    let compiler = compile_source(
        "extern fn print_i32(i32 n); fn main() -> i32 { print_i32(7); 0 }",
        "test",
        &context,
        &CompileOptions::default(),
    )
    .unwrap();

    let path = std::env::temp_dir().join(format!("helang_test_{}.o", std::process::id()));
    compiler.write_object_file(&path).unwrap();

    let metadata = std::fs::metadata(&path).unwrap();
    assert!(metadata.len() > 0);
    std::fs::remove_file(&path).unwrap();
}
