//! The `dipper` command line front end.
//!
//! `dipper [-pci] file.dip [args...]` — parses and compiles the file,
//! optionally dumping the AST (`-p`) or the compiled module (`-c`), then
//! executes it. `-i` enables interpreter tracing. The remaining arguments
//! (starting with the script filename) become the `argv` list passed to
//! `main`.

use std::env;
use std::fs;
use std::process::ExitCode;

use dipper::{ast, parse, report, Module, StdStreams, VirtualMachine};
use log::LevelFilter;

struct Options {
    dump_ast: bool,
    dump_module: bool,
    trace: bool,
    filename: String,
    dip_args: Vec<String>,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(options) = parse_args(&args) else {
        eprintln!("Usage: {} [-pci] <filename>.dip", args.first().map_or("dipper", String::as_str));
        eprintln!();
        eprintln!("    -p: Debug parser/ast");
        eprintln!("    -c: Debug compiler/bytecode");
        eprintln!("    -i: Debug interpreter/execution");
        return ExitCode::FAILURE;
    };

    let mut logger = env_logger::Builder::from_default_env();
    if options.trace {
        logger.filter_module("dipper", LevelFilter::Trace);
    }
    logger.init();

    let source = match fs::read_to_string(&options.filename) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error reading {}: {err}", options.filename);
            return ExitCode::FAILURE;
        }
    };

    let items = match parse(&source) {
        Ok(items) => items,
        Err(err) => {
            eprintln!("{}", report::render_parse(&options.filename, &source, &err));
            return ExitCode::FAILURE;
        }
    };
    if options.dump_ast {
        print!("{}", ast::render_program(&items));
    }

    let module = match Module::from_items(&options.filename, "globals", &items) {
        Ok(module) => module,
        Err(err) => {
            eprintln!("{}", report::render_compile(&options.filename, &source, &err));
            return ExitCode::FAILURE;
        }
    };
    if options.dump_module {
        print!("{}", module.dump());
    }

    let vm = VirtualMachine::new(module, options.dip_args);
    match vm.run(&mut StdStreams) {
        Ok(status) => ExitCode::from(status.clamp(0, 255) as u8),
        Err(err) => {
            eprintln!("{}", report::render_runtime(&options.filename, &source, &err));
            ExitCode::FAILURE
        }
    }
}

/// Splits `[-pci] <filename> [args...]`. Returns `None` when no filename
/// was given. The `argv` passed to the program starts with the script
/// filename itself.
fn parse_args(args: &[String]) -> Option<Options> {
    let mut options = Options {
        dump_ast: false,
        dump_module: false,
        trace: false,
        filename: String::new(),
        dip_args: Vec::new(),
    };

    let mut rest = &args[1..];
    if let Some(first) = rest.first() {
        if let Some(flags) = first.strip_prefix('-') {
            for flag in flags.chars() {
                match flag {
                    'p' => options.dump_ast = true,
                    'c' => options.dump_module = true,
                    'i' => options.trace = true,
                    _ => return None,
                }
            }
            rest = &rest[1..];
        }
    }

    let filename = rest.first()?;
    options.filename = filename.clone();
    options.dip_args = rest.to_vec();
    Some(options)
}
