//! Unit tests for lowering.
//!
//! These check the emitted module and the errors of the lowering pass.
//! Execution of lowered code is covered by the integration tests.

use indoc::indoc;
use inkwell::{context::Context, values::InstructionOpcode};
use pretty_assertions::assert_eq;

use super::compiler::{CompileOptions, Compiler};
use crate::{
    compile_source,
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
    parser::parser::parse,
};

fn lower_error(source: &str) -> Error {
    let context = Context::create();
    let error = match compile_source(source, "test", &context, &CompileOptions::default()) {
        Ok(_) => panic!("expected lowering to fail"),
        Err(error) => error,
    };
    error
}

#[test]
fn test_main_is_renamed() {
    let context = Context::create();
    let compiler = compile_source(
        "fn main() -> i32 { 0 } fn again() -> i32 { main() }",
        "test",
        &context,
        &CompileOptions::default(),
    )
    .unwrap();

    assert!(compiler.module.get_function("__he_entry_main").is_some());
    assert!(compiler.module.get_function("main").is_none());
    assert_eq!(Compiler::symbol_name("main"), "__he_entry_main");
    assert_eq!(Compiler::symbol_name("f"), "f");
}

#[test]
fn test_extern_prototypes() {
    let context = Context::create();
    let compiler = compile_source(
        "extern fn print_u8(u8 value); fn main() -> i32 { print_u8(1 | 2); 0 }",
        "test",
        &context,
        &CompileOptions::default(),
    )
    .unwrap();

    let print = compiler.module.get_function("print_u8").unwrap();
    assert_eq!(print.count_basic_blocks(), 0);
    assert_eq!(
        print
            .get_first_param()
            .unwrap()
            .into_int_value()
            .get_type()
            .get_bit_width(),
        64
    );
}

#[test]
fn test_unknown_types() {
    let error = lower_error("fn f(i64 x) {}");
    assert_eq!(
        error.get_kind(),
        &ErrorImpl::UnknownType {
            type_: String::from("i64")
        }
    );
    assert_eq!(error.get_function(), Some("f"));

    let error = lower_error("fn f(void x) {}");
    assert_eq!(
        error.get_kind(),
        &ErrorImpl::UnknownType {
            type_: String::from("void")
        }
    );

    let error = lower_error("fn f() -> bool {}");
    assert_eq!(
        error.get_kind(),
        &ErrorImpl::UnknownType {
            type_: String::from("bool")
        }
    );
}

#[test]
fn test_function_declared_twice() {
    for source in ["fn f() {} fn f() {}", "extern fn f(); fn f() {}"] {
        assert_eq!(
            lower_error(source).get_kind(),
            &ErrorImpl::FunctionAlreadyDeclared {
                function: String::from("f")
            }
        );
    }
}

#[test]
fn test_repeated_argument() {
    assert_eq!(
        lower_error("fn f(i32 a, u8 a) {}").get_kind(),
        &ErrorImpl::RepeatedArgument {
            argument: String::from("a")
        }
    );
}

#[test]
fn test_immutable_binding_needs_initializer() {
    assert_eq!(
        lower_error("fn f() { i32 x; }").get_kind(),
        &ErrorImpl::MissingInitializer {
            variable: String::from("x")
        }
    );
}

#[test]
fn test_wide_int_has_no_default_return() {
    let error = lower_error("fn f() -> u8 { mut u8 x = 1; }");

    assert_eq!(
        error.get_kind(),
        &ErrorImpl::NoDefaultReturnValue {
            type_: String::from("u8")
        }
    );
}

#[test]
fn test_assign_to_immutable() {
    assert_eq!(
        lower_error("fn f() { i32 x = 1; x = 2; }").get_kind(),
        &ErrorImpl::ImmutableAssignment {
            variable: String::from("x")
        }
    );
}

#[test]
fn test_assign_to_undeclared() {
    assert_eq!(
        lower_error("fn f() { y = 2; }").get_kind(),
        &ErrorImpl::VariableNotDeclared {
            variable: String::from("y")
        }
    );
}

#[test]
fn test_unsupported_operator() {
    assert_eq!(
        lower_error("fn f() -> i32 { 1 . 2 }").get_kind(),
        &ErrorImpl::UnsupportedOperator {
            operator: String::from(".")
        }
    );
}

#[test]
fn test_number_out_of_range() {
    assert_eq!(
        lower_error("fn f() -> i32 { 99999999999 }").get_kind(),
        &ErrorImpl::NumberParseError {
            token: String::from("99999999999")
        }
    );
}

#[test]
fn test_void_call_has_no_value() {
    assert_eq!(
        lower_error("extern fn g(); fn f() -> i32 { g() + 1 }").get_kind(),
        &ErrorImpl::ExpectedValue
    );
}

#[test]
fn test_enclosing_function_bindings_are_not_visible() {
    let error = lower_error(indoc! {"
        fn f() -> i32 { i32 x = 1; x }
        fn g() -> i32 { x }
    "});

    assert_eq!(
        error.get_kind(),
        &ErrorImpl::VariableNotDeclared {
            variable: String::from("x")
        }
    );
    assert_eq!(error.get_function(), Some("g"));
    assert!(error.to_string().contains("(2:16-17)"));
}

#[test]
fn test_failed_function_is_removed() {
    let context = Context::create();
    let unit = parse(tokenize("fn f() -> i32 { y }").unwrap()).unwrap();
    let mut compiler = Compiler::new(&context, "test", CompileOptions::default());

    compiler
        .declare_prototype(&unit.functions[0].signature)
        .unwrap();
    let error = compiler.compile_function(&unit.functions[0]).unwrap_err();

    assert_eq!(error.get_function(), Some("f"));
    assert!(compiler.module.get_function("f").is_none());
    assert_eq!(compiler.scopes.len(), 1);
}

#[test]
fn test_allocas_are_placed_in_entry_block() {
    let context = Context::create();
    let compiler = compile_source(
        indoc! {"
            fn f(i32 n) -> i32 {
                if (n == 0) { mut i32 x = 1; x } else { mut u8 y = 2; y }
            }
        "},
        "test",
        &context,
        &CompileOptions::default(),
    )
    .unwrap();

    let function = compiler.module.get_function("f").unwrap();
    let entry = function.get_first_basic_block().unwrap();
    let mut instruction = entry.get_first_instruction();
    let mut allocas = 0;
    while let Some(current) = instruction {
        if current.get_opcode() == InstructionOpcode::Alloca {
            allocas += 1;
        }
        instruction = current.get_next_instruction();
    }

    assert_eq!(allocas, 2);
}

#[test]
fn test_if_with_values_yields_phi() {
    let context = Context::create();
    let compiler = compile_source(
        "fn f(i32 n) -> i32 { if (n) { 1 } elif (n == 2) { 2 } else { 3 } }",
        "test",
        &context,
        &CompileOptions::default(),
    )
    .unwrap();

    let ir = compiler.ir();
    assert!(ir.contains("phi i32"));
    assert!(ir.contains("icmp ne i32"));
}

#[test]
fn test_unknown_target_triple() {
    let context = Context::create();
    let options = CompileOptions {
        dump_ir: false,
        target_triple: Some(String::from("not-a-real-target")),
    };
    let error = compile_source("fn f() {}", "test", &context, &options)
        .err()
        .unwrap();

    assert_eq!(error.get_error_name(), "Backend");
}

#[test]
fn test_if_value_takes_widest_branch_type() {
    let context = Context::create();
    let compiler = compile_source(
        "fn f(i32 n) -> u8 { if (n) { 1 == 1 } elif (n == 2) { 7 } else { 1 | 2 } }",
        "test",
        &context,
        &CompileOptions::default(),
    )
    .unwrap();

    let ir = compiler.ir();
    assert!(ir.contains("phi i64"));
    assert!(!ir.contains("phi i1"));
}

#[test]
fn test_verifier_rejection_removes_function() {
    let context = Context::create();
    let source = "fn g(i32 a) -> i32 { if (a) { i32 x = a + 1; } x }";
    let unit = parse(tokenize(source).unwrap()).unwrap();
    let mut compiler = Compiler::new(&context, "test", CompileOptions::default());

    compiler
        .declare_prototype(&unit.functions[0].signature)
        .unwrap();
    let error = compiler.compile_function(&unit.functions[0]).unwrap_err();

    assert_eq!(error.get_error_name(), "VerificationFailed");
    assert_eq!(error.get_function(), Some("g"));
    assert!(error.to_string().contains("(1:47-48)"));
    assert!(error.get_tip().to_string().contains("`if` branch"));
    assert!(compiler.module.get_function("g").is_none());
    assert_eq!(compiler.scopes.len(), 1);
}

#[test]
fn test_verifier_rejection_aborts_unit() {
    let error = lower_error(indoc! {"
        fn g(i32 a) -> i32 { if (a) { i32 x = a + 1; } x }
        fn h() -> i32 { y }
    "});

    assert!(matches!(
        error.get_kind(),
        ErrorImpl::VerificationFailed { .. }
    ));
    assert_eq!(error.get_function(), Some("g"));
}

#[test]
fn test_target_machine_can_be_created_repeatedly() {
    let context = Context::create();
    let compiler = Compiler::new(&context, "test", CompileOptions::default());

    let first = compiler.target_machine().unwrap();
    let second = compiler.target_machine().unwrap();

    assert_eq!(
        first.get_triple().as_str().to_string_lossy().into_owned(),
        second.get_triple().as_str().to_string_lossy().into_owned()
    );
}
