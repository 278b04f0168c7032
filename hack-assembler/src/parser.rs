//! Line-level parser for Hack assembly.
//!
//! Each source line is a label pseudo-instruction, a real instruction, or
//! nothing (blank / comment). Mnemonic fields are resolved to their bit
//! encodings at parse time so code generation cannot fail.

use crate::encoder::{comp_bits, dest_bits, jump_bits};
use crate::error::{AsmError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    AValue(u16),
    ASymbol(String),
    CInstruction { dest: u8, comp: u8, jump: u8 },
}

/// Instruction with every symbol replaced by its RAM/ROM address.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedInstruction {
    AValue(u16),
    CInstruction { dest: u8, comp: u8, jump: u8 },
}

impl Instruction {
    pub fn resolve(self, addr: u16) -> ResolvedInstruction {
        match self {
            Instruction::AValue(v) => ResolvedInstruction::AValue(v),
            Instruction::ASymbol(_) => ResolvedInstruction::AValue(addr),
            Instruction::CInstruction { dest, comp, jump } => {
                ResolvedInstruction::CInstruction { dest, comp, jump }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Instruction(Instruction),
    Label(String),
    Empty,
}

/// Strip a trailing `//` comment and surrounding whitespace.
fn clean_line(line: &str) -> &str {
    line.split("//").next().unwrap_or("").trim()
}

fn parse_a_instruction(line: &str, line_num: usize) -> Result<Instruction> {
    let value_str = &line[1..];

    if value_str.is_empty() {
        return Err(AsmError::InvalidSyntax {
            line: line_num,
            text: line.to_string(),
        });
    }

    if value_str.bytes().all(|b| b.is_ascii_digit()) {
        let value: u32 = value_str.parse().map_err(|_| AsmError::InvalidAValue {
            line: line_num,
            value: value_str.to_string(),
        })?;
        if value > 32767 {
            return Err(AsmError::InvalidAValue {
                line: line_num,
                value: value_str.to_string(),
            });
        }
        Ok(Instruction::AValue(value as u16))
    } else {
        Ok(Instruction::ASymbol(value_str.to_string()))
    }
}

fn parse_c_instruction(line: &str, line_num: usize) -> Result<Instruction> {
    let (dest_str, rest) = match line.find('=') {
        Some(eq) => (&line[..eq], &line[eq + 1..]),
        None => ("", line),
    };

    let (comp_str, jump_str) = match rest.find(';') {
        Some(semi) => (&rest[..semi], &rest[semi + 1..]),
        None => (rest, ""),
    };

    let dest = dest_bits(dest_str);

    let comp = comp_bits(comp_str).ok_or_else(|| AsmError::InvalidComp {
        line: line_num,
        comp: comp_str.to_string(),
    })?;

    let jump = jump_bits(jump_str).ok_or_else(|| AsmError::InvalidJump {
        line: line_num,
        jump: jump_str.to_string(),
    })?;

    Ok(Instruction::CInstruction { dest, comp, jump })
}

/// Parse one source line. `line_num` is 1-based and only used for errors.
pub fn parse_line(line: &str, line_num: usize) -> Result<Line> {
    let clean = clean_line(line);

    if clean.is_empty() {
        return Ok(Line::Empty);
    }

    if clean.starts_with('(') {
        if !clean.ends_with(')') || clean.len() < 3 {
            return Err(AsmError::InvalidSyntax {
                line: line_num,
                text: line.to_string(),
            });
        }
        return Ok(Line::Label(clean[1..clean.len() - 1].to_string()));
    }

    if clean.starts_with('@') {
        return Ok(Line::Instruction(parse_a_instruction(clean, line_num)?));
    }

    Ok(Line::Instruction(parse_c_instruction(clean, line_num)?))
}
