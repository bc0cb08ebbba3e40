//! Marmoset: a small dynamically-typed expression language, compiled to
//! bytecode and executed on a stack virtual machine.
//!
//! The pipeline is `source → Lexer → Parser → Compiler → Vm`. The compiler
//! lowers the AST to a compact instruction stream with a constant pool; the
//! VM runs it on a single value stack that doubles as the local-variable
//! store of each call frame. First-class functions, closures, arrays,
//! hashes and a fixed builtin registry are supported.

pub mod ast;
pub mod builtins;
pub mod bytecode;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod value;

use bytecode::{Bytecode, Compiler, Vm};
use error::MarmosetError;
use lexer::Lexer;
use parser::Parser;
use value::Value;

/// Parse source text into an AST without compiling.
pub fn parse(source: &str) -> Result<ast::Program, MarmosetError> {
    let tokens = Lexer::new(source).tokenize();
    Parser::new(tokens).parse().map_err(MarmosetError::Parser)
}

/// Compile source text to bytecode without executing.
pub fn compile(source: &str) -> Result<Bytecode, MarmosetError> {
    let program = parse(source)?;
    let mut compiler = Compiler::new();
    compiler.compile(&program)?;
    Ok(compiler.bytecode())
}

/// Disassemble compiled bytecode to a string.
pub fn disassemble(bytecode: &Bytecode) -> String {
    bytecode::disassemble(&bytecode.instructions)
}

/// Compile and run a program, returning its final value.
pub fn run(source: &str) -> Result<Value, MarmosetError> {
    run_with_options(source, false)
}

/// Compile and run; optionally dump the disassembly to stdout first.
pub fn run_with_options(source: &str, dump_bytecode: bool) -> Result<Value, MarmosetError> {
    let bytecode = compile(source)?;
    if dump_bytecode {
        print!("{}", disassemble(&bytecode));
        println!("---");
    }

    let mut machine = Vm::new(bytecode);
    machine.run()?;
    Ok(machine.last_popped_stack_elem().clone())
}
