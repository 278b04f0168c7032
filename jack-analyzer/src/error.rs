//! Error types and diagnostics for the Jack front-end.

use crate::token::Span;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JackError {
    #[error("lexical error at {span}: {message}")]
    Lexical { span: Span, message: String },

    #[error("syntax error at {span}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },

    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl JackError {
    pub fn lexical(span: Span, message: impl Into<String>) -> Self {
        JackError::Lexical {
            span,
            message: message.into(),
        }
    }

    pub fn syntax(span: Span, message: impl Into<String>) -> Self {
        JackError::Syntax {
            span,
            message: message.into(),
            expected: Vec::new(),
        }
    }

    pub fn syntax_expected(span: Span, message: impl Into<String>, expected: Vec<String>) -> Self {
        JackError::Syntax {
            span,
            message: message.into(),
            expected,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        JackError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn span(&self) -> Option<&Span> {
        match self {
            JackError::Lexical { span, .. } => Some(span),
            JackError::Syntax { span, .. } => Some(span),
            JackError::Io { .. } => None,
        }
    }
}

/// Bounded error collection; parsing continues after an error until the
/// limit is hit.
#[derive(Debug)]
pub struct ErrorAccumulator {
    errors: Vec<JackError>,
    max_errors: usize,
}

impl ErrorAccumulator {
    pub fn new() -> Self {
        Self::with_max(20)
    }

    pub fn with_max(max_errors: usize) -> Self {
        Self {
            errors: Vec::new(),
            max_errors,
        }
    }

    pub fn push(&mut self, error: JackError) {
        if self.errors.len() < self.max_errors {
            self.errors.push(error);
        }
    }

    pub fn is_full(&self) -> bool {
        self.errors.len() >= self.max_errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<JackError> {
        self.errors
    }
}

/// Renders an error with the offending source line and a caret.
pub struct Diagnostic<'a> {
    error: &'a JackError,
    source: Option<&'a str>,
    filename: Option<&'a str>,
}

impl<'a> Diagnostic<'a> {
    pub fn new(error: &'a JackError) -> Self {
        Self {
            error,
            source: None,
            filename: None,
        }
    }

    pub fn with_source(mut self, source: &'a str) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_filename(mut self, filename: &'a str) -> Self {
        self.filename = Some(filename);
        self
    }

    fn write_snippet(&self, f: &mut fmt::Formatter<'_>, span: &Span) -> fmt::Result {
        if let Some(source) = self.source
            && let Some(line) = source.lines().nth(span.line.saturating_sub(1))
        {
            writeln!(f, "   |")?;
            writeln!(f, "{:3} | {}", span.line, line)?;
            writeln!(f, "   | {:>width$}^", "", width = span.column.saturating_sub(1))?;
        }
        Ok(())
    }
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filename = self.filename.unwrap_or("<input>");

        match self.error {
            JackError::Lexical { span, message } => {
                writeln!(f, "error: {}", message)?;
                writeln!(f, "  --> {}:{}:{}", filename, span.line, span.column)?;
                self.write_snippet(f, span)?;
            }
            JackError::Syntax {
                span,
                message,
                expected,
            } => {
                writeln!(f, "error: {}", message)?;
                writeln!(f, "  --> {}:{}:{}", filename, span.line, span.column)?;
                self.write_snippet(f, span)?;
                if !expected.is_empty() {
                    writeln!(f, "   = expected: {}", expected.join(", "))?;
                }
            }
            JackError::Io { path, source } => {
                writeln!(f, "error: IO error for {}: {}", path.display(), source)?;
            }
        }

        Ok(())
    }
}

/// Format multiple errors with source context.
pub fn format_errors(errors: &[JackError], source: &str, filename: &str) -> String {
    let mut output = String::new();
    let total = errors.len();

    for (i, error) in errors.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&format!("Error {} of {}:\n", i + 1, total));
        output.push_str(
            &Diagnostic::new(error)
                .with_source(source)
                .with_filename(filename)
                .to_string(),
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_caps_at_limit() {
        let mut acc = ErrorAccumulator::with_max(2);
        assert!(!acc.has_errors());

        acc.push(JackError::lexical(Span::new(0, 1, 1, 1), "one"));
        assert!(!acc.is_full());

        acc.push(JackError::lexical(Span::new(0, 1, 1, 1), "two"));
        assert!(acc.is_full());

        acc.push(JackError::lexical(Span::new(0, 1, 1, 1), "three"));
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn diagnostic_points_at_the_column() {
        let source = "class Main {\n    let = 5;\n}";
        let err = JackError::syntax(Span::new(17, 18, 2, 9), "expected identifier");
        let rendered = Diagnostic::new(&err)
            .with_source(source)
            .with_filename("Main.jack")
            .to_string();

        assert!(rendered.contains("Main.jack:2:9"));
        assert!(rendered.contains("let = 5;"));
        assert!(rendered.contains("^"));
    }

    #[test]
    fn format_errors_numbers_them() {
        let errors = vec![
            JackError::lexical(Span::new(0, 1, 1, 1), "bad byte"),
            JackError::syntax(Span::new(2, 3, 1, 3), "bad token"),
        ];
        let out = format_errors(&errors, "~~ x", "T.jack");
        assert!(out.contains("Error 1 of 2"));
        assert!(out.contains("Error 2 of 2"));
    }
}
