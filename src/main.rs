//! Marmoset CLI: run a script, evaluate a string, or start the REPL.

use std::env;
use std::fs;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

enum Command {
    /// Run a script file
    Run { file: String },
    /// Evaluate a string and print the result
    Eval { code: String },
    /// Start the REPL
    Repl,
}

struct Options {
    command: Command,
    dump_bytecode: bool,
}

fn print_usage() {
    eprintln!("Marmoset {}", VERSION);
    eprintln!();
    eprintln!("Usage: marmoset [options] [script.mar]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -e <code>        Evaluate code and print the result");
    eprintln!("  --disassemble    Dump bytecode before running");
    eprintln!("  -h, --help       Show this help");
    eprintln!();
    eprintln!("With no script, an interactive session is started.");
}

fn parse_args() -> Result<Options, String> {
    let mut args = env::args().skip(1);
    let mut command = None;
    let mut dump_bytecode = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(String::new()),
            "--disassemble" => dump_bytecode = true,
            "-e" => {
                let code = args
                    .next()
                    .ok_or_else(|| "-e requires an argument".to_string())?;
                command = Some(Command::Eval { code });
            }
            other if other.starts_with('-') => {
                return Err(format!("unknown option: {}", other));
            }
            file => {
                command = Some(Command::Run {
                    file: file.to_string(),
                });
            }
        }
    }

    Ok(Options {
        command: command.unwrap_or(Command::Repl),
        dump_bytecode,
    })
}

fn main() {
    let options = match parse_args() {
        Ok(options) => options,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
                eprintln!();
            }
            print_usage();
            process::exit(if message.is_empty() { 0 } else { 1 });
        }
    };

    match options.command {
        Command::Repl => marmoset::repl::start(),
        Command::Run { file } => {
            let source = match fs::read_to_string(&file) {
                Ok(source) => source,
                Err(err) => {
                    eprintln!("failed to read '{}': {}", file, err);
                    process::exit(1);
                }
            };
            if let Err(err) = marmoset::run_with_options(&source, options.dump_bytecode) {
                eprintln!("{}", err);
                process::exit(1);
            }
        }
        Command::Eval { code } => match marmoset::run_with_options(&code, options.dump_bytecode) {
            Ok(value) => println!("{}", value),
            Err(err) => {
                eprintln!("{}", err);
                process::exit(1);
            }
        },
    }
}
