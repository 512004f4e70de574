/// The tokenizer, the dictionary, the interpret/compile state machine, the threaded-code
/// builder, and the sectioned item/render model.
mod compiler;

/// The `CompileError`/`ErrorKind` types shared across the whole front end.
mod error;

/// The fixed runtime kernel and base-words library text assets, and the CLI-facing parameters
/// that get substituted into the runtime before it's parsed.
mod assets;

/// The input cursor and tokenizer.
mod lang;

use clap::Parser;
use compiler::Compiler;
use std::path::Path;
use std::process::ExitCode;

/// Cross-compile a dialect of a stack-based, concatenative language to 6502 assembly text.
///
/// Reads SOURCE_FILE, compiles it together with the fixed runtime kernel and base-words
/// library, and writes the resulting assembly to stdout. On any parse or compile error, a
/// single-line diagnostic is written to stderr instead and nothing is printed to stdout.
#[derive(Parser)]
#[command(name = "forth6502", version, about, long_about = None)]
struct Cli {
    /// Source file to compile.
    source_file: String,

    /// Parameter-stack base address, as an assembler literal (hex with a leading `$`, or
    /// decimal).
    #[arg(short = 'p', long = "pstack-bottom", default_value = "$600")]
    pstack_bottom: String,

    /// Parameter-stack size in bytes. Masked to 8 bits before it reaches the runtime template,
    /// matching the target's byte-wide size register.
    #[arg(short = 'S', long = "pstack-size", default_value_t = 256)]
    pstack_size: u32,

    /// Comma-separated section emission order.
    #[arg(short = 's', long = "sections", default_value = "init,boot,data,text")]
    sections: String,

    /// After a successful compile, also print a per-word thread listing to stderr.
    #[arg(long)]
    dump: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(assembly) => {
            print!("{}", assembly);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

/// Build the full assembly text: the runtime kernel, the base-words library, then the user's
/// source file, in that order, all parsed by the same front end. Returns the rendered assembly
/// on success; no partial output is produced on failure, since the caller only prints the `Ok`
/// value.
fn run(cli: &Cli) -> error::Result<String> {
    let source_path = Path::new(&cli.source_file);
    let source = std::fs::read_to_string(source_path)?;

    let sections: Vec<String> = cli
        .sections
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    let runtime_params = assets::RuntimeParams {
        pstack_bottom: cli.pstack_bottom.clone(),
        pstack_size: (cli.pstack_size & 0xFF) as u8,
    };

    let mut compiler = Compiler::new(sections);
    let here = Path::new(".");

    compiler.compile_source("<runtime>", &assets::render_runtime(&runtime_params), here)?;
    compiler.compile_source("<base-words>", assets::base_words::BASE_WORDS_SOURCE, here)?;

    let base_dir = compiler::engine::parent_dir(source_path);
    let display_path = source_path.to_string_lossy().into_owned();
    compiler.compile_source(&display_path, &source, &base_dir)?;

    compiler.verify_and_mark()?;

    if cli.dump {
        eprintln!("{}", compiler.dump_threads());
    }

    Ok(compiler.render())
}
