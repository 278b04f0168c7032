//! End-to-end assembler tests over complete programs.

use hack_assembler::assemble;
use hack_assembler::error::AsmError;

/// Labelled countdown program with a forward reference: exact binary output.
#[test]
fn test_forward_label_program() {
    let source = "@5\nD=A\n@7\nD=D+A\n(END)\n@END\n0;JMP\n";
    let output = assemble(source).unwrap();
    assert_eq!(
        output,
        "0000000000000101\n\
         1110110000010000\n\
         0000000000000111\n\
         1110000010010000\n\
         0000000000000100\n\
         1110101010000111\n"
    );
}

#[test]
fn test_every_line_is_a_16_bit_word() {
    let source = r#"
        @sum
        M=0
        @i
        M=1
    (LOOP)
        @i
        D=M
        @100
        D=D-A
        @DONE
        D;JGT
        @i
        D=M
        @sum
        M=D+M
        @i
        M=M+1
        @LOOP
        0;JMP
    (DONE)
        @DONE
        0;JMP
    "#;

    let output = assemble(source).unwrap();
    assert!(!output.is_empty());
    for line in output.lines() {
        assert_eq!(line.len(), 16);
        assert!(line.bytes().all(|b| b == b'0' || b == b'1'));
    }
    assert!(output.ends_with('\n'));
}

#[test]
fn test_mixed_predefined_and_user_symbols() {
    // User variables start at 16 even when predefined symbols appear first.
    let source = "@SP\nM=0\n@counter\nM=0\n@R13\nM=0\n@flag\nM=0\n";
    let output = assemble(source).unwrap();
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines[0], "0000000000000000"); // SP
    assert_eq!(lines[2], "0000000000010000"); // counter = 16
    assert_eq!(lines[4], "0000000000001101"); // R13
    assert_eq!(lines[6], "0000000000010001"); // flag = 17
}

#[test]
fn test_label_referenced_before_and_after_definition() {
    let source = "@MID\n0;JMP\n(MID)\n@MID\n0;JMP\n";
    let output = assemble(source).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    // MID binds to instruction 2 for both references.
    assert_eq!(lines[0], "0000000000000010");
    assert_eq!(lines[2], "0000000000000010");
}

#[test]
fn test_malformed_input_reports_line() {
    let source = "@2\nD=A\nD==M\n";
    match assemble(source).unwrap_err() {
        AsmError::InvalidComp { line, .. } => assert_eq!(line, 3),
        other => panic!("expected InvalidComp, got {}", other),
    }
}

#[test]
fn test_unknown_jump_is_fatal() {
    assert!(matches!(
        assemble("D;JJJ\n").unwrap_err(),
        AsmError::InvalidJump { .. }
    ));
}
