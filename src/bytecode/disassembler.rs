//! Textual disassembly of instruction streams, for debugging and tests.

use std::fmt;
use std::fmt::Write;

use crate::bytecode::instruction::{read_operands, Definition, Instructions, OpCode};

/// Disassemble a whole instruction stream.
///
/// Malformed input produces clearly marked `ERROR:` lines instead of
/// aborting, so partial bytecode can still be inspected.
pub fn disassemble(ins: &Instructions) -> String {
    let mut out = String::new();
    let bytes = &ins.0;
    let mut offset = 0;

    while offset < bytes.len() {
        let op = match OpCode::from_u8(bytes[offset]) {
            Some(op) => op,
            None => {
                let _ = writeln!(out, "ERROR: opcode {} undefined", bytes[offset]);
                offset += 1;
                continue;
            }
        };

        let def = op.definition();
        let width: usize = def.operand_widths.iter().sum();
        if offset + 1 + width > bytes.len() {
            let _ = writeln!(out, "ERROR: truncated operand for {}", def.name);
            break;
        }

        let (operands, read) = read_operands(def, &bytes[offset + 1..]);
        let _ = writeln!(out, "{:04} {}", offset, fmt_instruction(def, &operands));
        offset += 1 + read;
    }
    out
}

fn fmt_instruction(def: &Definition, operands: &[usize]) -> String {
    let operand_count = def.operand_widths.len();
    if operands.len() != operand_count {
        return format!(
            "ERROR: operand len {} does not match defined {}",
            operands.len(),
            operand_count
        );
    }

    match operand_count {
        0 => def.name.to_string(),
        1 => format!("{} {}", def.name, operands[0]),
        2 => format!("{} {} {}", def.name, operands[0], operands[1]),
        _ => format!("ERROR: unhandled operand count for {}", def.name),
    }
}

impl fmt::Display for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&disassemble(self))
    }
}
