use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use clap::Parser;
use helang::{compile_source, compiler::compiler::CompileOptions, render_error};
use inkwell::context::Context;
use tracing::{info, Level};

/// helang - compiles helang sources to native object files
#[derive(Parser, Debug)]
#[command(name = "helang")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source files to compile
    #[arg(short, long = "compile", required = true, num_args = 1..)]
    compile: Vec<PathBuf>,

    /// Object files to write, one per input; defaults to `<input>.o`
    #[arg(short, long, num_args = 1..)]
    output: Vec<PathBuf>,

    /// Print the LLVM IR of each module after lowering
    #[arg(short, long)]
    dump: bool,

    /// Also save the textual IR next to the object file as `.ll`
    #[arg(long)]
    emit_llvm: bool,

    /// Target triple to emit for instead of the host's
    #[arg(long)]
    target: Option<String>,

    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn options(&self) -> CompileOptions {
        CompileOptions {
            dump_ir: self.dump,
            target_triple: self.target.clone(),
        }
    }

    fn output_for(&self, index: usize, input: &Path) -> PathBuf {
        match self.output.get(index) {
            Some(output) => output.clone(),
            None => {
                let mut output = input.as_os_str().to_owned();
                output.push(".o");
                PathBuf::from(output)
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let options = cli.options();
    let mut failed = false;

    for (index, input) in cli.compile.iter().enumerate() {
        let output = cli.output_for(index, input);
        if let Err(message) = compile_file(input, &output, &options, cli.emit_llvm) {
            eprintln!("{}", message);
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Compiles one source file into an object file.
///
/// Each file gets its own LLVM context. The returned message is ready to
/// print.
fn compile_file(
    input: &Path,
    output: &Path,
    options: &CompileOptions,
    emit_llvm: bool,
) -> Result<(), String> {
    let source = read_to_string(input)
        .map_err(|error| format!("Error: failed to read {}: {}", input.display(), error))?;
    let module_name = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("module"));

    let start = Instant::now();
    let context = Context::create();
    let compiler = compile_source(&source, &module_name, &context, options)
        .map_err(|error| format!("-> {}\n{}", input.display(), render_error(&error, &source)))?;
    info!(file = %input.display(), elapsed = ?start.elapsed(), "lowered");

    if emit_llvm {
        let ir_path = output.with_extension("ll");
        compiler
            .save_module_to_file(&ir_path)
            .map_err(|error| format!("Error: {}", error))?;
        info!(file = %ir_path.display(), "saved IR");
    }

    compiler
        .write_object_file(output)
        .map_err(|error| format!("Error: {}", error))?;
    info!(
        file = %output.display(),
        elapsed = ?start.elapsed(),
        "wrote object file"
    );

    Ok(())
}
