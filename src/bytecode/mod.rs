//! Bytecode compilation and execution.
//!
//! # Architecture
//!
//! - `instruction`: opcode definitions and the encode/decode primitives
//! - `disassembler`: human-readable bytecode listings
//! - `symbol_table`: lexically scoped name resolution, free-variable capture
//! - `compiler`: single-pass AST-to-bytecode lowering
//! - `vm`: frame-based stack machine executing the result

pub mod compiler;
pub mod disassembler;
pub mod instruction;
pub mod symbol_table;
pub mod vm;

pub use compiler::{Bytecode, Compiler};
pub use disassembler::disassemble;
pub use instruction::{make, read_operands, Instructions, OpCode};
pub use symbol_table::{Symbol, SymbolScope, SymbolTable};
pub use vm::Vm;
