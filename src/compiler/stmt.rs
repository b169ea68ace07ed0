use inkwell::{
    basic_block::BasicBlock,
    values::{BasicValue, BasicValueEnum, IntValue},
};
use tracing::debug;

use crate::{
    ast::{
        ast::{Body, Node},
        statements::{Assign, Declare, If},
    },
    errors::errors::{Error, ErrorImpl},
};

use super::{
    compiler::{backend_error, Compiler},
    expr::{gen_node, gen_value},
    scope::Variable,
};

/// Lowers the statements of a body and returns the value of its tail.
pub fn gen_body<'a>(
    compiler: &mut Compiler<'a>,
    body: &Body,
) -> Result<Option<BasicValueEnum<'a>>, Error> {
    for statement in &body.statements {
        gen_node(compiler, statement)?;
    }

    match &body.tail {
        Some(tail) => gen_node(compiler, tail),
        None => Ok(None),
    }
}

/// Immutable declarations bind the initializer's value directly; `mut`
/// declarations get a stack slot in the entry block.
pub fn gen_declare<'a>(compiler: &mut Compiler<'a>, declare: &Declare) -> Result<(), Error> {
    let already_declared = || {
        Error::new(
            ErrorImpl::VariableAlreadyDeclared {
                variable: declare.name.clone(),
            },
            declare.span,
        )
    };

    if !declare.mutable {
        let Some(initializer) = &declare.initializer else {
            return Err(Error::new(
                ErrorImpl::MissingInitializer {
                    variable: declare.name.clone(),
                },
                declare.span,
            ));
        };
        let ty = compiler.value_type(&declare.type_name, declare.span)?;
        let value = gen_value(compiler, initializer)?;
        let value = compiler.convert_int(value, ty, initializer.span())?;

        if !compiler.current_scope_mut().insert_value(&declare.name, value.into()) {
            return Err(already_declared());
        }
        return Ok(());
    }

    let initial = match &declare.initializer {
        Some(initializer) => Some((gen_value(compiler, initializer)?, initializer.span())),
        None => None,
    };

    if compiler.current_scope().is_declared(&declare.name) {
        return Err(already_declared());
    }
    let ty = compiler.value_type(&declare.type_name, declare.span)?;
    let pointer = compiler.create_entry_alloca(ty, &declare.name, declare.span)?;
    compiler
        .current_scope_mut()
        .insert_variable(&declare.name, Variable { pointer, ty });

    if let Some((value, span)) = initial {
        let value = compiler.convert_int(value, ty, span)?;
        compiler
            .builder
            .build_store(pointer, value)
            .map_err(backend_error(span))?;
    }

    debug!(name = %declare.name, "declared variable");
    Ok(())
}

pub fn gen_assign<'a>(compiler: &mut Compiler<'a>, assign: &Assign) -> Result<(), Error> {
    let value = gen_value(compiler, &assign.value)?;

    let scope = compiler.current_scope();
    let Some(slot) = scope.variable(&assign.target) else {
        let error = if scope.value(&assign.target).is_some() {
            ErrorImpl::ImmutableAssignment {
                variable: assign.target.clone(),
            }
        } else {
            ErrorImpl::VariableNotDeclared {
                variable: assign.target.clone(),
            }
        };
        return Err(Error::new(error, assign.span));
    };

    let value = compiler.convert_int(value, slot.ty, assign.value.span())?;
    compiler
        .builder
        .build_store(slot.pointer, value)
        .map_err(backend_error(assign.span))?;
    Ok(())
}

/// Lowers an if/elif/else chain.
///
/// Each condition gets a `then` block and a continuation block: the next
/// condition, the `else` block or the merge block. Branch bodies share the
/// enclosing function's frame. When an `else` exists and every branch ends
/// with a value, the construct yields a `phi` of those values, zero-extended
/// to the widest of them.
pub fn gen_if<'a>(
    compiler: &mut Compiler<'a>,
    construct: &If,
) -> Result<Option<BasicValueEnum<'a>>, Error> {
    let function = compiler.current_function(construct.span)?;
    let context = compiler.context;
    let on_error = backend_error(construct.span);

    let mut branches: Vec<(&Node, &Body)> =
        vec![(construct.condition.as_ref(), &construct.then_body)];
    branches.extend(
        construct
            .elifs
            .iter()
            .map(|branch| (&branch.condition, &branch.body)),
    );

    let then_blocks: Vec<BasicBlock<'a>> = branches
        .iter()
        .map(|_| context.append_basic_block(function, "then"))
        .collect();
    let mut continuations: Vec<BasicBlock<'a>> = (1..branches.len())
        .map(|_| context.append_basic_block(function, "elif"))
        .collect();
    let else_block = construct
        .else_body
        .as_ref()
        .map(|_| context.append_basic_block(function, "else"));
    let merge_block = context.append_basic_block(function, "endif");
    continuations.push(else_block.unwrap_or(merge_block));

    // Branch bodies are left unterminated until the result type is known.
    let mut ends: Vec<(BasicBlock<'a>, Option<BasicValueEnum<'a>>)> = vec![];

    for (index, (condition, body)) in branches.iter().enumerate() {
        let value = gen_value(compiler, condition)?;
        let value = compiler.to_condition(value, condition.span())?;
        compiler
            .builder
            .build_conditional_branch(value, then_blocks[index], continuations[index])
            .map_err(&on_error)?;

        compiler.builder.position_at_end(then_blocks[index]);
        let result = gen_body(compiler, body)?;
        let end = compiler.builder.get_insert_block().unwrap_or(then_blocks[index]);
        ends.push((end, result));

        compiler.builder.position_at_end(continuations[index]);
    }

    if let (Some(body), Some(block)) = (&construct.else_body, else_block) {
        let result = gen_body(compiler, body)?;
        let end = compiler.builder.get_insert_block().unwrap_or(block);
        ends.push((end, result));
    }

    // The widest branch value decides the phi type.
    let result_type = if else_block.is_some() {
        ends.iter()
            .map(|(_, value)| match value {
                Some(BasicValueEnum::IntValue(value)) => Some(value.get_type()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .and_then(|types| types.into_iter().max_by_key(|ty| ty.get_bit_width()))
    } else {
        None
    };

    let mut incoming: Vec<(IntValue<'a>, BasicBlock<'a>)> = vec![];
    for (block, value) in ends {
        compiler.builder.position_at_end(block);
        if let (Some(ty), Some(BasicValueEnum::IntValue(value))) = (result_type, value) {
            let value = compiler.convert_int(value, ty, construct.span)?;
            incoming.push((value, block));
        }
        compiler
            .builder
            .build_unconditional_branch(merge_block)
            .map_err(&on_error)?;
    }

    compiler.builder.position_at_end(merge_block);

    let Some(ty) = result_type else {
        return Ok(None);
    };
    let phi = compiler.builder.build_phi(ty, "ifvalue").map_err(&on_error)?;
    let incoming: Vec<(&dyn BasicValue<'a>, BasicBlock<'a>)> = incoming
        .iter()
        .map(|(value, block)| (value as &dyn BasicValue<'a>, *block))
        .collect();
    phi.add_incoming(&incoming);

    Ok(Some(phi.as_basic_value()))
}
