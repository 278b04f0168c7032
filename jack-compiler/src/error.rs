//! Error types for Jack compilation.

use jack_analyzer::error::JackError;
use jack_analyzer::token::Span;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    /// Name used but declared in neither scope.
    #[error("undefined variable '{name}' at {span}")]
    UndefinedVariable { name: String, span: Span },

    /// Name declared twice in the same scope.
    #[error("duplicate definition of '{name}' at {span}")]
    DuplicateDefinition { name: String, span: Span },

    /// Lexical or syntax error from the front-end.
    #[error("parse error: {0}")]
    Parse(#[from] JackError),

    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn undefined_variable(name: impl Into<String>, span: Span) -> Self {
        Self::UndefinedVariable {
            name: name.into(),
            span,
        }
    }

    pub fn duplicate_definition(name: impl Into<String>, span: Span) -> Self {
        Self::DuplicateDefinition {
            name: name.into(),
            span,
        }
    }
}
