//! Main compiler module.
//!
//! This module contains the core Compiler structure and drives lowering of
//! a translation unit into an LLVM module: prototypes first, then function
//! bodies in declaration order. It also owns the target configuration used
//! to emit object files.

use std::{path::Path, sync::Once};

use inkwell::{
    attributes::{Attribute, AttributeLoc},
    builder::{Builder, BuilderError},
    context::Context,
    module::{Linkage, Module},
    targets::{
        CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine, TargetTriple,
    },
    types::{BasicMetadataTypeEnum, IntType},
    values::{FunctionValue, IntValue, PointerValue},
    IntPredicate, OptimizationLevel,
};
use tracing::debug;

use crate::{
    ast::{
        ast::{Function, Signature, TranslationUnit},
        types::PrimitiveType,
    },
    errors::errors::{Error, ErrorImpl},
    Span,
};

use super::{scope::Scope, stmt::gen_body};

/// Prefix given to the entry function so it does not clash with the C
/// runtime's `main`.
pub const ENTRY_PREFIX: &str = "__he_entry_";
pub const ENTRY: &str = "main";

static TARGETS_INITIALIZED: Once = Once::new();

/// Options controlling a compilation, filled in by the driver.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Print the module's IR after lowering succeeds.
    pub dump_ir: bool,
    /// Target triple to emit for; the host triple when unset.
    pub target_triple: Option<String>,
}

/// Maps a builder failure to an error at `span`.
pub fn backend_error(span: Span) -> impl Fn(BuilderError) -> Error {
    move |error| {
        Error::new(
            ErrorImpl::Backend {
                message: format!("{:?}", error),
            },
            span,
        )
    }
}

/// The main compiler structure that holds the state of the lowering pass.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the LLVM context
pub struct Compiler<'a> {
    /// Reference to the LLVM context
    pub context: &'a Context,
    /// The LLVM module being built
    pub module: Module<'a>,
    /// The LLVM IR builder
    pub builder: Builder<'a>,
    /// Scope stack; the bottom frame is the global one and is never popped
    pub scopes: Vec<Scope<'a>>,
    pub options: CompileOptions,
}

impl<'a> Compiler<'a> {
    pub fn new(context: &'a Context, module_name: &str, options: CompileOptions) -> Self {
        Compiler {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            scopes: vec![Scope::global()],
            options,
        }
    }

    /// Symbol a source function name is emitted under.
    pub fn symbol_name(name: &str) -> String {
        if name == ENTRY {
            format!("{}{}", ENTRY_PREFIX, name)
        } else {
            name.to_string()
        }
    }

    pub fn push_scope(&mut self, function: &str, function_value: FunctionValue<'a>) {
        self.scopes.push(Scope::new(function, function_value));
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn current_scope(&self) -> &Scope<'a> {
        // The global frame is pushed on construction and never popped.
        &self.scopes[self.scopes.len() - 1]
    }

    pub fn current_scope_mut(&mut self) -> &mut Scope<'a> {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// The function whose body is being lowered.
    pub fn current_function(&self, span: Span) -> Result<FunctionValue<'a>, Error> {
        self.current_scope().function_value.ok_or_else(|| {
            Error::new(
                ErrorImpl::Backend {
                    message: String::from("no function is being lowered"),
                },
                span,
            )
        })
    }

    pub fn resolve_type(&self, name: &str, span: Span) -> Result<PrimitiveType, Error> {
        PrimitiveType::from_name(name).ok_or_else(|| {
            Error::new(
                ErrorImpl::UnknownType {
                    type_: name.to_string(),
                },
                span,
            )
        })
    }

    /// LLVM integer type of a primitive, `None` for `void`.
    pub fn int_type(&self, ty: PrimitiveType) -> Option<IntType<'a>> {
        ty.bit_width()
            .map(|width| self.context.custom_width_int_type(width))
    }

    /// Resolves a type name that must denote a value, so `void` is rejected.
    pub fn value_type(&self, name: &str, span: Span) -> Result<IntType<'a>, Error> {
        let ty = self.resolve_type(name, span)?;
        self.int_type(ty).ok_or_else(|| {
            Error::new(
                ErrorImpl::UnknownType {
                    type_: name.to_string(),
                },
                span,
            )
        })
    }

    /// Value returned by a function whose body has no tail value.
    ///
    /// `void` returns nothing, `i32` returns zero and `u8` has no default.
    pub fn default_return(
        &self,
        ty: PrimitiveType,
        span: Span,
    ) -> Result<Option<IntValue<'a>>, Error> {
        match ty {
            PrimitiveType::Void => Ok(None),
            PrimitiveType::Int32 => Ok(Some(self.context.i32_type().const_zero())),
            PrimitiveType::WideInt => Err(Error::new(
                ErrorImpl::NoDefaultReturnValue {
                    type_: ty.to_string(),
                },
                span,
            )),
        }
    }

    /// Converts an integer to `target`, zero-extending or truncating.
    pub fn convert_int(
        &self,
        value: IntValue<'a>,
        target: IntType<'a>,
        span: Span,
    ) -> Result<IntValue<'a>, Error> {
        if value.get_type().get_bit_width() == target.get_bit_width() {
            return Ok(value);
        }
        self.builder
            .build_int_cast_sign_flag(value, target, false, "")
            .map_err(backend_error(span))
    }

    /// Turns an integer into an `i1` branch condition by comparing it to zero.
    pub fn to_condition(&self, value: IntValue<'a>, span: Span) -> Result<IntValue<'a>, Error> {
        if value.get_type().get_bit_width() == 1 {
            return Ok(value);
        }
        self.builder
            .build_int_compare(
                IntPredicate::NE,
                value,
                value.get_type().const_zero(),
                "cond",
            )
            .map_err(backend_error(span))
    }

    /// Allocates a stack slot at the start of the current function's entry
    /// block, wherever the builder currently is.
    pub fn create_entry_alloca(
        &self,
        ty: IntType<'a>,
        name: &str,
        span: Span,
    ) -> Result<PointerValue<'a>, Error> {
        let function = self.current_function(span)?;
        let entry = function.get_first_basic_block().ok_or_else(|| {
            Error::new(
                ErrorImpl::Backend {
                    message: String::from("function has no entry block"),
                },
                span,
            )
        })?;

        let builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(instruction) => builder.position_before(&instruction),
            None => builder.position_at_end(entry),
        }

        builder.build_alloca(ty, name).map_err(backend_error(span))
    }

    /// Adds the prototype of a definition or extern to the module.
    pub fn declare_prototype(&self, signature: &Signature) -> Result<FunctionValue<'a>, Error> {
        let symbol = Compiler::symbol_name(&signature.name);
        if self.module.get_function(&symbol).is_some() {
            return Err(Error::new(
                ErrorImpl::FunctionAlreadyDeclared {
                    function: signature.name.clone(),
                },
                signature.span,
            ));
        }

        let mut parameter_types: Vec<BasicMetadataTypeEnum> = vec![];
        for parameter in &signature.parameters {
            parameter_types.push(self.value_type(&parameter.type_name, parameter.span)?.into());
        }

        let function_type = match self.resolve_type(&signature.return_type, signature.span)? {
            PrimitiveType::Void => self.context.void_type().fn_type(&parameter_types, false),
            ty => match self.int_type(ty) {
                Some(int_type) => int_type.fn_type(&parameter_types, false),
                None => self.context.void_type().fn_type(&parameter_types, false),
            },
        };

        let function = self
            .module
            .add_function(&symbol, function_type, Some(Linkage::External));
        for (parameter, value) in signature.parameters.iter().zip(function.get_param_iter()) {
            value.into_int_value().set_name(&parameter.name);
        }

        debug!(name = %symbol, "declared prototype");
        Ok(function)
    }

    /// Lowers one function definition.
    ///
    /// The function gets its own scope frame, popped whether or not lowering
    /// succeeds. On failure the partially emitted function is removed from
    /// the module.
    pub fn compile_function(&mut self, function: &Function) -> Result<(), Error> {
        let signature = &function.signature;
        let symbol = Compiler::symbol_name(&signature.name);
        let function_value = self.module.get_function(&symbol).ok_or_else(|| {
            Error::new(
                ErrorImpl::FunctionNotDeclared {
                    function: signature.name.clone(),
                },
                signature.span,
            )
        })?;

        self.push_scope(&signature.name, function_value);
        let result = self.lower_function(function, function_value);
        self.pop_scope();

        if let Err(error) = result {
            self.builder.clear_insertion_position();
            unsafe { function_value.delete() };
            return Err(error.in_function(signature.name.as_str()));
        }

        debug!(name = %symbol, "lowered function");
        Ok(())
    }

    fn lower_function(
        &mut self,
        function: &Function,
        function_value: FunctionValue<'a>,
    ) -> Result<(), Error> {
        let signature = &function.signature;

        let entry = self.context.append_basic_block(function_value, "entry");
        self.builder.position_at_end(entry);

        let nounwind = self
            .context
            .create_enum_attribute(Attribute::get_named_enum_kind_id("nounwind"), 0);
        function_value.add_attribute(AttributeLoc::Function, nounwind);

        for (parameter, value) in signature.parameters.iter().zip(function_value.get_param_iter()) {
            if !self.current_scope_mut().insert_value(&parameter.name, value) {
                return Err(Error::new(
                    ErrorImpl::RepeatedArgument {
                        argument: parameter.name.clone(),
                    },
                    parameter.span,
                ));
            }
        }

        let tail = gen_body(self, &function.body)?;
        let return_type = self.resolve_type(&signature.return_type, signature.span)?;
        let span = function
            .body
            .tail
            .as_ref()
            .map_or(signature.span, |tail| tail.span());

        match (self.int_type(return_type), tail) {
            (None, _) => {
                self.builder
                    .build_return(None)
                    .map_err(backend_error(span))?;
            }
            (Some(int_type), Some(value)) => {
                let value = self.convert_int(value.into_int_value(), int_type, span)?;
                self.builder
                    .build_return(Some(&value))
                    .map_err(backend_error(span))?;
            }
            (Some(_), None) => {
                let value = self.default_return(return_type, span)?;
                match value {
                    Some(value) => self.builder.build_return(Some(&value)),
                    None => self.builder.build_return(None),
                }
                .map_err(backend_error(span))?;
            }
        }

        if !function_value.verify(false) {
            let message = match self.module.verify() {
                Err(message) => message.to_string(),
                Ok(()) => format!("function `{}` is malformed", signature.name),
            };
            return Err(Error::new(ErrorImpl::VerificationFailed { message }, span));
        }

        Ok(())
    }

    /// Creates a target machine for the configured triple, or the host's.
    pub fn target_machine(&self) -> Result<TargetMachine, Error> {
        TARGETS_INITIALIZED.call_once(|| Target::initialize_all(&InitializationConfig::default()));

        let triple = match &self.options.target_triple {
            Some(triple) => TargetTriple::create(triple),
            None => TargetMachine::get_default_triple(),
        };
        let target = Target::from_triple(&triple).map_err(|message| {
            Error::new(
                ErrorImpl::Backend {
                    message: message.to_string(),
                },
                Span::default(),
            )
        })?;

        target
            .create_target_machine(
                &triple,
                "generic",
                "",
                OptimizationLevel::Default,
                RelocMode::PIC,
                CodeModel::Default,
            )
            .ok_or_else(|| {
                Error::new(
                    ErrorImpl::Backend {
                        message: format!(
                            "cannot create a target machine for {}",
                            triple.as_str().to_string_lossy()
                        ),
                    },
                    Span::default(),
                )
            })
    }

    /// Textual IR of the module.
    pub fn ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Saves the LLVM module as textual IR.
    pub fn save_module_to_file(&self, output_file: &Path) -> Result<(), Error> {
        self.module.print_to_file(output_file).map_err(|message| {
            Error::new(
                ErrorImpl::Backend {
                    message: message.to_string(),
                },
                Span::default(),
            )
        })
    }

    /// Emits an object file for the configured target.
    pub fn write_object_file(&self, output_file: &Path) -> Result<(), Error> {
        let target_machine = self.target_machine()?;
        target_machine
            .write_to_file(&self.module, FileType::Object, output_file)
            .map_err(|message| {
                Error::new(
                    ErrorImpl::Backend {
                        message: message.to_string(),
                    },
                    Span::default(),
                )
            })
    }
}

/// Lowers a parsed translation unit into a fresh LLVM module.
///
/// Every function prototype is declared before any extern, then function
/// bodies are lowered in declaration order. The first error aborts the unit.
///
/// # Arguments
///
/// * `unit` - The parsed translation unit
/// * `context` - Reference to the LLVM context
/// * `module_name` - Name of the LLVM module, usually the source file name
/// * `options` - Target and IR dump settings
///
/// # Returns
///
/// Returns a Result containing the Compiler instance or an Error.
pub fn compile<'a>(
    unit: &TranslationUnit,
    context: &'a Context,
    module_name: &str,
    options: &CompileOptions,
) -> Result<Compiler<'a>, Error> {
    let mut compiler = Compiler::new(context, module_name, options.clone());

    let target_machine = compiler.target_machine()?;
    compiler.module.set_triple(&target_machine.get_triple());
    compiler
        .module
        .set_data_layout(&target_machine.get_target_data().get_data_layout());

    for signature in unit
        .functions
        .iter()
        .map(|function| &function.signature)
        .chain(unit.externs.iter())
    {
        compiler
            .declare_prototype(signature)
            .map_err(|error| error.in_function(signature.name.as_str()))?;
    }

    for function in &unit.functions {
        compiler.compile_function(function)?;
    }

    if compiler.options.dump_ir {
        println!("{}", compiler.ir());
    }
    debug!(
        module = module_name,
        functions = unit.functions.len(),
        externs = unit.externs.len(),
        "lowered translation unit"
    );

    Ok(compiler)
}
