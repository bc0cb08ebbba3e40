//! Error types for all phases of the pipeline.

use std::fmt::Write;

use thiserror::Error;

/// Parser errors. The parser keeps going after an error and reports
/// everything it found, so callers usually receive a `Vec` of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error("expected next token to be {expected}, got {found} at {line}:{column}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: u32,
        column: u32,
    },

    #[error("could not parse {0} as integer")]
    InvalidInteger(String),

    #[error("no prefix parse rule for {0}")]
    NoPrefixRule(String),

    #[error("unexpected character '{0}'")]
    IllegalCharacter(char),
}

/// Bytecode compilation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("unknown operator: {0}")]
    UnknownOperator(String),
}

/// Errors raised by the virtual machine while executing bytecode.
///
/// Builtin-level failures are not listed here: those travel on the value
/// stack as ordinary `Value::Error` values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("Stack overflow")]
    StackOverflow,

    #[error("unknown opcode: {0}")]
    UnknownOpcode(u8),

    #[error("unsupported types for binary operation: {0} {1}")]
    UnsupportedBinaryTypes(&'static str, &'static str),

    #[error("unsupported type for negation: {0}")]
    UnsupportedNegation(&'static str),

    #[error("unknown integer operator: {0}")]
    UnknownIntegerOperator(&'static str),

    #[error("unknown string operation: {0}")]
    UnknownStringOperation(&'static str),

    #[error("unknown operator: {op} ({left} {right})")]
    UnknownOperator {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("index operator is not supported: {0}")]
    IndexNotSupported(&'static str),

    #[error("unusable as hash key: {0}")]
    UnusableHashKey(&'static str),

    #[error("calling a non-closure and non-built-in")]
    CallingNonFunction,

    #[error("wrong number of arguments: want={want}, got={got}")]
    WrongNumberOfArguments { want: usize, got: usize },

    #[error("not a function: {0}")]
    NotAFunction(&'static str),
}

/// A unified error type for the whole pipeline.
#[derive(Debug, Error)]
pub enum MarmosetError {
    #[error("{}", format_parser_errors(.0))]
    Parser(Vec<ParserError>),

    #[error("compilation failed: {0}")]
    Compile(#[from] CompileError),

    #[error("executing bytecode failed: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_parser_errors(errors: &[ParserError]) -> String {
    let mut out = String::from("parser errors:");
    for err in errors {
        let _ = write!(out, "\n\t{}", err);
    }
    out
}
