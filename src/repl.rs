//! Interactive REPL with persistent state across lines.

use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::builtins::BUILTINS;
use crate::bytecode::vm::GLOBALS_SIZE;
use crate::bytecode::{Compiler, SymbolTable, Vm};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::Value;

const PROMPT: &str = ">> ";
const HISTORY_FILE: &str = ".marmoset_history";

/// REPL session state. Constants, globals and the top-level symbol table
/// are threaded through every line, so `let` bindings persist.
pub struct Repl {
    symbol_table: SymbolTable,
    constants: Vec<Value>,
    globals: Vec<Value>,
}

impl Repl {
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (i, builtin) in BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(i, builtin.name);
        }

        Self {
            symbol_table,
            constants: Vec::new(),
            globals: vec![Value::Null; GLOBALS_SIZE],
        }
    }

    pub fn run(mut self) {
        println!("Marmoset {}", env!("CARGO_PKG_VERSION"));

        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(err) => {
                eprintln!("failed to initialise line editor: {}", err);
                return;
            }
        };
        let history_path = history_path();
        let _ = editor.load_history(&history_path);

        loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = editor.add_history_entry(line);
                    self.eval_line(line);
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("read error: {}", err);
                    break;
                }
            }
        }

        let _ = editor.save_history(&history_path);
    }

    fn eval_line(&mut self, line: &str) {
        let tokens = Lexer::new(line).tokenize();
        let program = match Parser::new(tokens).parse() {
            Ok(program) => program,
            Err(errors) => {
                eprintln!("parser errors:");
                for err in errors {
                    eprintln!("\t{}", err);
                }
                return;
            }
        };

        let symbol_table = std::mem::take(&mut self.symbol_table);
        let constants = std::mem::take(&mut self.constants);
        let mut compiler = Compiler::with_state(symbol_table, constants);
        let compiled = compiler.compile(&program);
        let bytecode = compiler.bytecode();
        (self.symbol_table, self.constants) = compiler.into_state();

        if let Err(err) = compiled {
            eprintln!("compilation failed: {}", err);
            return;
        }

        let globals = std::mem::take(&mut self.globals);
        let mut machine = Vm::with_global_state(bytecode, globals);
        let outcome = machine.run();
        match outcome {
            Ok(()) => println!("{}", machine.last_popped_stack_elem()),
            Err(err) => eprintln!("executing bytecode failed: {}", err),
        }
        self.globals = machine.into_global_state();
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

fn history_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(HISTORY_FILE),
        None => PathBuf::from(HISTORY_FILE),
    }
}

/// Start an interactive session on stdin/stdout.
pub fn start() {
    Repl::new().run();
}
