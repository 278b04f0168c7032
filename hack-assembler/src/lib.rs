//! Hack assembler: symbolic `.asm` source to 16-bit binary `.hack` text.
//!
//! Two passes over a fully buffered source. Pass 1 parses every line and
//! binds `(LABEL)` pseudo-instructions to ROM addresses; pass 2 resolves
//! `@symbol` references (allocating RAM for fresh variables from address 16)
//! and emits one ASCII binary word per real instruction.

pub mod encoder;
pub mod error;
pub mod parser;
pub mod symbols;

use encoder::{encode_a, encode_c};
use error::{AsmError, Result};
use parser::{Instruction, Line, ResolvedInstruction, parse_line};
use symbols::SymbolTable;

/// Assemble Hack assembly source to binary text, one LF-terminated
/// 16-character line per instruction.
pub fn assemble(source: &str) -> Result<String> {
    let lines: Vec<&str> = source.lines().collect();

    let mut symbol_table = SymbolTable::new();
    let mut parsed_lines = Vec::with_capacity(lines.len());
    let mut rom_address = 0u16;

    // Pass 1: parse and bind labels. Labels occupy no ROM.
    for (line_num, line) in lines.iter().enumerate() {
        let parsed = parse_line(line, line_num + 1)?;

        match &parsed {
            Line::Label(label) => {
                symbol_table
                    .add_label(label.clone(), rom_address)
                    .map_err(|dup| AsmError::DuplicateLabel {
                        line: line_num + 1,
                        label: dup,
                    })?;
            }
            Line::Instruction(_) => {
                rom_address += 1;
            }
            Line::Empty => {}
        }

        parsed_lines.push(parsed);
    }

    // Pass 2: resolve symbols and emit. 17 bytes per output line.
    let mut output = String::with_capacity(parsed_lines.len() * 17);

    for parsed in parsed_lines {
        if let Line::Instruction(inst) = parsed {
            let resolved = match inst {
                Instruction::ASymbol(symbol) => {
                    let addr = symbol_table.get_or_allocate(&symbol);
                    ResolvedInstruction::AValue(addr)
                }
                other => other.resolve(0),
            };

            match resolved {
                ResolvedInstruction::AValue(value) => encode_a(value, &mut output),
                ResolvedInstruction::CInstruction { dest, comp, jump } => {
                    encode_c(dest, comp, jump, &mut output)
                }
            }
            output.push('\n');
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_straight_line_program() {
        let source = "@2\nD=A\n@3\nD=D+A\n@0\nM=D\n";
        let result = assemble(source).unwrap();
        assert_eq!(
            result,
            "0000000000000010\n\
             1110110000010000\n\
             0000000000000011\n\
             1110000010010000\n\
             0000000000000000\n\
             1110001100001000\n"
        );
    }

    #[test]
    fn labels_do_not_occupy_rom() {
        let source = r#"
            @i
            M=1
        (LOOP)
            @i
            D=M
            @10
            D=D-A
            @END
            D;JGT
            @i
            M=M+1
            @LOOP
            0;JMP
        (END)
            @END
            0;JMP
        "#;

        let output = assemble(source).unwrap();
        assert_eq!(output.lines().count(), 14);

        // (LOOP) binds to instruction 2, (END) to instruction 12.
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[10], "0000000000000010"); // @LOOP
        assert_eq!(lines[12], "0000000000001100"); // @END
    }

    #[test]
    fn predefined_symbols_resolve() {
        let source = "@R0\nD=M\n@SP\nM=D\n@SCREEN\nD=A\n@KBD\nD=A\n";
        let output = assemble(source).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "0000000000000000"); // R0
        assert_eq!(lines[2], "0000000000000000"); // SP
        assert_eq!(lines[4], "0100000000000000"); // SCREEN = 16384
        assert_eq!(lines[6], "0110000000000000"); // KBD = 24576
    }

    #[test]
    fn variables_allocate_in_encounter_order() {
        let source = "@i\nM=1\n@j\nM=1\n@i\nD=M\n";
        let output = assemble(source).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "0000000000010000"); // i = 16
        assert_eq!(lines[2], "0000000000010001"); // j = 17
        assert_eq!(lines[4], "0000000000010000"); // i again
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let source = "// leading comment\n@2     // inline\nD=A\n\n// trailing\n";
        let output = assemble(source).unwrap();
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let source = "(LOOP)\n@i\nM=1\n(LOOP)\n@i\nM=2\n";
        match assemble(source).unwrap_err() {
            AsmError::DuplicateLabel { label, .. } => assert_eq!(label, "LOOP"),
            other => panic!("expected DuplicateLabel, got {}", other),
        }
    }

    #[test]
    fn empty_input_produces_empty_output() {
        assert_eq!(assemble("").unwrap(), "");
        assert_eq!(assemble("// only a comment\n").unwrap(), "");
    }
}
