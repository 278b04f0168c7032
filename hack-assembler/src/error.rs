use thiserror::Error;

#[derive(Error, Debug)]
pub enum AsmError {
    #[error("line {line}: invalid A-instruction value: {value}")]
    InvalidAValue { line: usize, value: String },

    #[error("line {line}: duplicate label: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("line {line}: malformed instruction: {text}")]
    InvalidSyntax { line: usize, text: String },

    #[error("line {line}: unknown comp mnemonic: {comp}")]
    InvalidComp { line: usize, comp: String },

    #[error("line {line}: unknown jump mnemonic: {jump}")]
    InvalidJump { line: usize, jump: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AsmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_line_numbers() {
        let err = AsmError::InvalidComp {
            line: 12,
            comp: "D+D".to_string(),
        };
        assert_eq!(err.to_string(), "line 12: unknown comp mnemonic: D+D");
    }
}
