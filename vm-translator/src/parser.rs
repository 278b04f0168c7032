//! Line-oriented VM command parser.
//!
//! Each non-blank, non-comment line splits on whitespace into
//! `op [arg1 [arg2]]` and maps onto one of the nine command variants.
//! Validation (segments, indices, label shapes) happens here so the code
//! generator never sees a malformed command.

use crate::error::{Result, VmError};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl ArithmeticOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Neg => "neg",
            ArithmeticOp::Eq => "eq",
            ArithmeticOp::Gt => "gt",
            ArithmeticOp::Lt => "lt",
            ArithmeticOp::And => "and",
            ArithmeticOp::Or => "or",
            ArithmeticOp::Not => "not",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    This,
    That,
    Pointer,
    Temp,
    Static,
}

impl Segment {
    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
            Segment::Static => "static",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmCommand {
    Arithmetic(ArithmeticOp),
    Push { segment: Segment, index: u16 },
    Pop { segment: Segment, index: u16 },
    Label { name: String },
    Goto { label: String },
    IfGoto { label: String },
    Function { name: String, num_locals: u16 },
    Call { name: String, num_args: u16 },
    Return,
}

impl fmt::Display for VmCommand {
    /// Canonical one-line serialization; inverse of [`parse_line`] for
    /// well-formed commands.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmCommand::Arithmetic(op) => f.write_str(op.as_str()),
            VmCommand::Push { segment, index } => {
                write!(f, "push {} {}", segment.as_str(), index)
            }
            VmCommand::Pop { segment, index } => {
                write!(f, "pop {} {}", segment.as_str(), index)
            }
            VmCommand::Label { name } => write!(f, "label {}", name),
            VmCommand::Goto { label } => write!(f, "goto {}", label),
            VmCommand::IfGoto { label } => write!(f, "if-goto {}", label),
            VmCommand::Function { name, num_locals } => {
                write!(f, "function {} {}", name, num_locals)
            }
            VmCommand::Call { name, num_args } => write!(f, "call {} {}", name, num_args),
            VmCommand::Return => f.write_str("return"),
        }
    }
}

/// Labels must match `[A-Za-z_.:][A-Za-z0-9_.:]+` (two characters minimum).
fn is_valid_label(name: &str) -> bool {
    let mut bytes = name.bytes();
    let Some(first) = bytes.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || matches!(first, b'_' | b'.' | b':')) {
        return false;
    }
    let mut rest = 0usize;
    for b in bytes {
        if !(b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b':')) {
            return false;
        }
        rest += 1;
    }
    rest >= 1
}

/// Parse a single line. `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str, line_num: usize, filename: &str) -> Result<Option<VmCommand>> {
    let line = line.split("//").next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split_whitespace().collect();

    match parts[0] {
        "add" => Ok(Some(VmCommand::Arithmetic(ArithmeticOp::Add))),
        "sub" => Ok(Some(VmCommand::Arithmetic(ArithmeticOp::Sub))),
        "neg" => Ok(Some(VmCommand::Arithmetic(ArithmeticOp::Neg))),
        "eq" => Ok(Some(VmCommand::Arithmetic(ArithmeticOp::Eq))),
        "gt" => Ok(Some(VmCommand::Arithmetic(ArithmeticOp::Gt))),
        "lt" => Ok(Some(VmCommand::Arithmetic(ArithmeticOp::Lt))),
        "and" => Ok(Some(VmCommand::Arithmetic(ArithmeticOp::And))),
        "or" => Ok(Some(VmCommand::Arithmetic(ArithmeticOp::Or))),
        "not" => Ok(Some(VmCommand::Arithmetic(ArithmeticOp::Not))),

        "push" => parse_push(&parts, line_num, filename),
        "pop" => parse_pop(&parts, line_num, filename),

        "label" => parse_branch(&parts, line_num, filename, |name| VmCommand::Label { name }),
        "goto" => parse_branch(&parts, line_num, filename, |label| VmCommand::Goto { label }),
        "if-goto" => parse_branch(&parts, line_num, filename, |label| VmCommand::IfGoto {
            label,
        }),

        "function" => parse_function(&parts, line_num, filename),
        "call" => parse_call(&parts, line_num, filename),
        "return" => Ok(Some(VmCommand::Return)),

        other => Err(VmError::InvalidCommand {
            line: line_num,
            file: filename.to_string(),
            command: other.to_string(),
        }),
    }
}

fn require_args(
    parts: &[&str],
    count: usize,
    line_num: usize,
    filename: &str,
) -> Result<()> {
    if parts.len() < count + 1 {
        return Err(VmError::MissingArgument {
            line: line_num,
            file: filename.to_string(),
            command: parts[0].to_string(),
        });
    }
    Ok(())
}

fn parse_push(parts: &[&str], line_num: usize, filename: &str) -> Result<Option<VmCommand>> {
    require_args(parts, 2, line_num, filename)?;
    let segment = parse_segment(parts[1], line_num, filename)?;
    let index = parse_index(parts[2], line_num, filename)?;
    validate_segment_index(segment, index, line_num, filename)?;
    Ok(Some(VmCommand::Push { segment, index }))
}

fn parse_pop(parts: &[&str], line_num: usize, filename: &str) -> Result<Option<VmCommand>> {
    require_args(parts, 2, line_num, filename)?;
    let segment = parse_segment(parts[1], line_num, filename)?;

    if segment == Segment::Constant {
        return Err(VmError::PopToConstant {
            line: line_num,
            file: filename.to_string(),
        });
    }

    let index = parse_index(parts[2], line_num, filename)?;
    validate_segment_index(segment, index, line_num, filename)?;
    Ok(Some(VmCommand::Pop { segment, index }))
}

fn parse_branch(
    parts: &[&str],
    line_num: usize,
    filename: &str,
    build: impl FnOnce(String) -> VmCommand,
) -> Result<Option<VmCommand>> {
    require_args(parts, 1, line_num, filename)?;

    let name = parts[1];
    if !is_valid_label(name) {
        return Err(VmError::InvalidLabelName {
            line: line_num,
            file: filename.to_string(),
            name: name.to_string(),
        });
    }

    Ok(Some(build(name.to_string())))
}

fn parse_function(parts: &[&str], line_num: usize, filename: &str) -> Result<Option<VmCommand>> {
    require_args(parts, 2, line_num, filename)?;

    let name = parts[1].to_string();
    if name.is_empty() {
        return Err(VmError::InvalidFunctionName {
            line: line_num,
            file: filename.to_string(),
            name,
        });
    }

    let num_locals = parse_index(parts[2], line_num, filename)?;
    Ok(Some(VmCommand::Function { name, num_locals }))
}

fn parse_call(parts: &[&str], line_num: usize, filename: &str) -> Result<Option<VmCommand>> {
    require_args(parts, 2, line_num, filename)?;
    let name = parts[1].to_string();
    let num_args = parse_index(parts[2], line_num, filename)?;
    Ok(Some(VmCommand::Call { name, num_args }))
}

fn parse_segment(s: &str, line_num: usize, filename: &str) -> Result<Segment> {
    match s {
        "constant" => Ok(Segment::Constant),
        "argument" => Ok(Segment::Argument),
        "local" => Ok(Segment::Local),
        "this" => Ok(Segment::This),
        "that" => Ok(Segment::That),
        "pointer" => Ok(Segment::Pointer),
        "temp" => Ok(Segment::Temp),
        "static" => Ok(Segment::Static),
        _ => Err(VmError::InvalidSegment {
            line: line_num,
            file: filename.to_string(),
            segment: s.to_string(),
        }),
    }
}

fn parse_index(s: &str, line_num: usize, filename: &str) -> Result<u16> {
    s.parse::<u16>().map_err(|_| VmError::InvalidNumber {
        line: line_num,
        file: filename.to_string(),
        value: s.to_string(),
    })
}

fn validate_segment_index(
    segment: Segment,
    index: u16,
    line_num: usize,
    filename: &str,
) -> Result<()> {
    match segment {
        Segment::Pointer if index > 1 => Err(VmError::InvalidPointerIndex {
            line: line_num,
            file: filename.to_string(),
            index,
        }),
        Segment::Temp if index > 7 => Err(VmError::InvalidTempIndex {
            line: line_num,
            file: filename.to_string(),
            index,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Option<VmCommand>> {
        parse_line(line, 1, "Test.vm")
    }

    #[test]
    fn parses_all_arithmetic_ops() {
        for (text, op) in [
            ("add", ArithmeticOp::Add),
            ("sub", ArithmeticOp::Sub),
            ("neg", ArithmeticOp::Neg),
            ("eq", ArithmeticOp::Eq),
            ("gt", ArithmeticOp::Gt),
            ("lt", ArithmeticOp::Lt),
            ("and", ArithmeticOp::And),
            ("or", ArithmeticOp::Or),
            ("not", ArithmeticOp::Not),
        ] {
            assert_eq!(parse(text).unwrap(), Some(VmCommand::Arithmetic(op)));
        }
    }

    #[test]
    fn parses_push_and_pop() {
        assert_eq!(
            parse("push constant 7").unwrap(),
            Some(VmCommand::Push {
                segment: Segment::Constant,
                index: 7
            })
        );
        assert_eq!(
            parse("pop local 2").unwrap(),
            Some(VmCommand::Pop {
                segment: Segment::Local,
                index: 2
            })
        );
    }

    #[test]
    fn rejects_pop_to_constant() {
        assert!(matches!(
            parse("pop constant 5").unwrap_err(),
            VmError::PopToConstant { .. }
        ));
    }

    #[test]
    fn rejects_unknown_segment() {
        assert!(matches!(
            parse("push heap 0").unwrap_err(),
            VmError::InvalidSegment { .. }
        ));
    }

    #[test]
    fn validates_pointer_and_temp_ranges() {
        assert!(parse("push pointer 1").is_ok());
        assert!(parse("push pointer 2").is_err());
        assert!(parse("push temp 7").is_ok());
        assert!(parse("push temp 8").is_err());
    }

    #[test]
    fn parses_branching_commands() {
        assert_eq!(
            parse("label LOOP").unwrap(),
            Some(VmCommand::Label {
                name: "LOOP".to_string()
            })
        );
        assert_eq!(
            parse("goto END").unwrap(),
            Some(VmCommand::Goto {
                label: "END".to_string()
            })
        );
        assert_eq!(
            parse("if-goto LOOP").unwrap(),
            Some(VmCommand::IfGoto {
                label: "LOOP".to_string()
            })
        );
    }

    #[test]
    fn label_names_follow_the_grammar() {
        assert!(parse("label loop.start:2").is_ok());
        assert!(parse("label _L2").is_ok());
        // Single-character names fail the two-character minimum.
        assert!(matches!(
            parse("label L").unwrap_err(),
            VmError::InvalidLabelName { .. }
        ));
        assert!(parse("label 2L").is_err());
        assert!(parse("label BAD-NAME").is_err());
    }

    #[test]
    fn parses_function_commands() {
        assert_eq!(
            parse("function Foo.bar 3").unwrap(),
            Some(VmCommand::Function {
                name: "Foo.bar".to_string(),
                num_locals: 3
            })
        );
        assert_eq!(
            parse("call Foo.bar 2").unwrap(),
            Some(VmCommand::Call {
                name: "Foo.bar".to_string(),
                num_args: 2
            })
        );
        assert_eq!(parse("return").unwrap(), Some(VmCommand::Return));
    }

    #[test]
    fn missing_arguments_are_errors() {
        assert!(matches!(
            parse("push constant").unwrap_err(),
            VmError::MissingArgument { .. }
        ));
        assert!(matches!(
            parse("goto").unwrap_err(),
            VmError::MissingArgument { .. }
        ));
        assert!(matches!(
            parse("function Foo.bar").unwrap_err(),
            VmError::MissingArgument { .. }
        ));
    }

    #[test]
    fn unknown_opcode_is_an_error() {
        assert!(matches!(
            parse("mul").unwrap_err(),
            VmError::InvalidCommand { .. }
        ));
    }

    #[test]
    fn comments_and_blanks_yield_nothing() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   ").unwrap(), None);
        assert_eq!(parse("// comment").unwrap(), None);
        assert_eq!(
            parse("add // inline").unwrap(),
            Some(VmCommand::Arithmetic(ArithmeticOp::Add))
        );
    }

    #[test]
    fn display_round_trips() {
        for text in [
            "add",
            "not",
            "push constant 7",
            "pop static 3",
            "label LOOP",
            "goto END",
            "if-goto LOOP",
            "function Foo.bar 3",
            "call Foo.bar 2",
            "return",
        ] {
            let cmd = parse(text).unwrap().unwrap();
            assert_eq!(cmd.to_string(), text);
        }
    }
}
