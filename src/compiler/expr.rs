use inkwell::{
    values::{BasicMetadataValueEnum, BasicValueEnum, IntValue},
    IntPredicate,
};

use crate::{
    ast::{
        ast::Node,
        expressions::{BinaryOp, Call, NumberLiteral, VariableRef},
    },
    errors::errors::{Error, ErrorImpl},
};

use super::{
    compiler::{backend_error, Compiler},
    stmt::{gen_assign, gen_declare, gen_if},
};

/// Generates LLVM IR for any node.
///
/// Returns the node's value, or `None` for nodes that produce none
/// (declarations, assignments, void calls, ifs without a value).
pub fn gen_node<'a>(
    compiler: &mut Compiler<'a>,
    node: &Node,
) -> Result<Option<BasicValueEnum<'a>>, Error> {
    match node {
        Node::Number(number) => gen_number(compiler, number).map(|value| Some(value.into())),
        Node::Variable(variable) => gen_variable(compiler, variable).map(Some),
        Node::Binary(binary) => gen_binary(compiler, binary).map(|value| Some(value.into())),
        Node::Call(call) => gen_call(compiler, call),
        Node::Assign(assign) => gen_assign(compiler, assign).map(|_| None),
        Node::Declare(declare) => gen_declare(compiler, declare).map(|_| None),
        Node::If(construct) => gen_if(compiler, construct),
    }
}

/// Generates a node that must produce an integer value.
pub fn gen_value<'a>(compiler: &mut Compiler<'a>, node: &Node) -> Result<IntValue<'a>, Error> {
    match gen_node(compiler, node)? {
        Some(BasicValueEnum::IntValue(value)) => Ok(value),
        _ => Err(Error::new(ErrorImpl::ExpectedValue, node.span())),
    }
}

fn gen_number<'a>(compiler: &Compiler<'a>, number: &NumberLiteral) -> Result<IntValue<'a>, Error> {
    let value: i32 = number.value.parse().map_err(|_| {
        Error::new(
            ErrorImpl::NumberParseError {
                token: number.value.clone(),
            },
            number.span,
        )
    })?;

    Ok(compiler.context.i32_type().const_int(value as u64, false))
}

/// Immutable bindings are used directly; mutable variables are loaded.
/// Only the innermost frame is searched.
fn gen_variable<'a>(
    compiler: &Compiler<'a>,
    variable: &VariableRef,
) -> Result<BasicValueEnum<'a>, Error> {
    let scope = compiler.current_scope();

    if let Some(value) = scope.value(&variable.name) {
        return Ok(value);
    }
    if let Some(slot) = scope.variable(&variable.name) {
        return compiler
            .builder
            .build_load(slot.pointer, &variable.name)
            .map_err(backend_error(variable.span));
    }

    Err(Error::new(
        ErrorImpl::VariableNotDeclared {
            variable: variable.name.clone(),
        },
        variable.span,
    ))
}

fn gen_binary<'a>(compiler: &mut Compiler<'a>, binary: &BinaryOp) -> Result<IntValue<'a>, Error> {
    let operator = binary.operator.as_str();
    if !matches!(operator, "+" | "-" | "*" | "/" | "==" | "!=" | "|") {
        return Err(Error::new(
            ErrorImpl::UnsupportedOperator {
                operator: binary.operator.clone(),
            },
            binary.span,
        ));
    }

    let left = gen_value(compiler, &binary.left)?;
    let right = gen_value(compiler, &binary.right)?;
    let on_error = backend_error(binary.span);

    if operator == "|" {
        // (lhs << 8) | rhs, both widened to 64 bits.
        let i64_type = compiler.context.i64_type();
        let shifted = compiler
            .builder
            .build_left_shift(left, left.get_type().const_int(8, false), "")
            .map_err(&on_error)?;
        let high = compiler.convert_int(shifted, i64_type, binary.span)?;
        let low = compiler.convert_int(right, i64_type, binary.span)?;
        return compiler.builder.build_or(high, low, "").map_err(on_error);
    }

    let (left, right) = widen(compiler, left, right, binary)?;
    let builder = &compiler.builder;
    match operator {
        "+" => builder.build_int_add(left, right, ""),
        "-" => builder.build_int_sub(left, right, ""),
        "*" => builder.build_int_mul(left, right, ""),
        "/" => builder.build_int_unsigned_div(left, right, ""),
        "==" => builder.build_int_compare(IntPredicate::EQ, left, right, ""),
        _ => builder.build_int_compare(IntPredicate::NE, left, right, ""),
    }
    .map_err(on_error)
}

/// Zero-extends the narrower operand to the width of the wider one.
fn widen<'a>(
    compiler: &Compiler<'a>,
    left: IntValue<'a>,
    right: IntValue<'a>,
    binary: &BinaryOp,
) -> Result<(IntValue<'a>, IntValue<'a>), Error> {
    let left_width = left.get_type().get_bit_width();
    let right_width = right.get_type().get_bit_width();

    if left_width < right_width {
        Ok((compiler.convert_int(left, right.get_type(), binary.span)?, right))
    } else if right_width < left_width {
        Ok((left, compiler.convert_int(right, left.get_type(), binary.span)?))
    } else {
        Ok((left, right))
    }
}

/// Arguments are lowered left to right and converted to the parameter types.
fn gen_call<'a>(
    compiler: &mut Compiler<'a>,
    call: &Call,
) -> Result<Option<BasicValueEnum<'a>>, Error> {
    let symbol = Compiler::symbol_name(&call.callee);
    let function = compiler.module.get_function(&symbol).ok_or_else(|| {
        Error::new(
            ErrorImpl::FunctionNotDeclared {
                function: call.callee.clone(),
            },
            call.span,
        )
    })?;

    let expected = function.count_params() as usize;
    if call.arguments.len() != expected {
        return Err(Error::new(
            ErrorImpl::ArgumentCountMismatch {
                expected,
                received: call.arguments.len(),
            },
            call.span,
        ));
    }

    let mut arguments: Vec<BasicMetadataValueEnum<'a>> = vec![];
    for (argument, parameter) in call.arguments.iter().zip(function.get_param_iter()) {
        let value = gen_value(compiler, argument)?;
        let value = compiler.convert_int(value, parameter.into_int_value().get_type(), argument.span())?;
        arguments.push(value.into());
    }

    let value = compiler
        .builder
        .build_call(function, &arguments, "")
        .map_err(backend_error(call.span))?
        .try_as_basic_value()
        .left();

    Ok(value)
}
