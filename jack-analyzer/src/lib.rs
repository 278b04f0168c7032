//! Jack syntax analyzer: tokenizing, parsing and XML emission.
//!
//! This crate is the front half of the Jack compiler. It owns the token and
//! AST definitions; the `jack-compiler` crate consumes them to generate VM
//! code, and the analyzer binary renders them as XML.

pub mod ast;
pub mod error;
pub mod parser;
pub mod token;
pub mod tokenizer;
pub mod xml;

use error::JackError;
use parser::Parser;
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tokenizer::JackTokenizer;

/// Result of analyzing one Jack source file.
#[derive(Debug)]
pub struct AnalysisResult {
    pub filename: String,
    /// Original source, retained for diagnostic rendering.
    pub source: String,
    /// `XT.xml` content (token stream).
    pub token_xml: String,
    /// `X.xml` content (parse tree).
    pub parse_xml: String,
    pub errors: Vec<JackError>,
}

impl AnalysisResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Analyze in-memory Jack source.
pub fn analyze_source(source: &str, filename: &str) -> AnalysisResult {
    let tokens = match JackTokenizer::new(source).tokenize() {
        Ok(tokens) => tokens,
        Err(errors) => {
            return AnalysisResult {
                filename: filename.to_string(),
                source: source.to_string(),
                token_xml: String::new(),
                parse_xml: String::new(),
                errors,
            };
        }
    };

    let token_xml = xml::tokens_to_xml(&tokens);

    let class = match Parser::new(&tokens).parse() {
        Ok(class) => class,
        Err(errors) => {
            return AnalysisResult {
                filename: filename.to_string(),
                source: source.to_string(),
                token_xml,
                parse_xml: String::new(),
                errors,
            };
        }
    };

    let parse_xml = xml::XmlWriter::new().write_class(&class, &tokens);

    AnalysisResult {
        filename: filename.to_string(),
        source: source.to_string(),
        token_xml,
        parse_xml,
        errors: Vec::new(),
    }
}

/// Analyze a single `.jack` file.
pub fn analyze_file(path: &Path) -> AnalysisResult {
    let filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string();

    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            return AnalysisResult {
                filename,
                source: String::new(),
                token_xml: String::new(),
                parse_xml: String::new(),
                errors: vec![JackError::io(path, e)],
            };
        }
    };

    analyze_source(&source, &filename)
}

/// Analyze every `.jack` file in a directory, in parallel.
pub fn analyze_directory(dir: &Path) -> Vec<AnalysisResult> {
    let jack_files: Vec<_> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "jack"))
            .collect(),
        Err(e) => {
            return vec![AnalysisResult {
                filename: dir.to_string_lossy().to_string(),
                source: String::new(),
                token_xml: String::new(),
                parse_xml: String::new(),
                errors: vec![JackError::io(dir, e)],
            }];
        }
    };

    if jack_files.is_empty() {
        return Vec::new();
    }

    jack_files.par_iter().map(|path| analyze_file(path)).collect()
}

/// Write `XT.xml` and `X.xml` for one analysis result.
pub fn write_results(result: &AnalysisResult, output_dir: &Path) -> Result<(), JackError> {
    let stem = result
        .filename
        .strip_suffix(".jack")
        .unwrap_or(&result.filename);

    let token_path = output_dir.join(format!("{}T.xml", stem));
    fs::write(&token_path, &result.token_xml).map_err(|e| JackError::io(&token_path, e))?;

    let parse_path = output_dir.join(format!("{}.xml", stem));
    fs::write(&parse_path, &result.parse_xml).map_err(|e| JackError::io(&parse_path, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_well_formed_source() {
        let result = analyze_source(
            "class Main { function void main() { return; } }",
            "Main.jack",
        );
        assert!(result.is_ok());
        assert!(result.token_xml.contains("<tokens>"));
        assert!(result.parse_xml.contains("<class>"));
    }

    #[test]
    fn lexical_failure_yields_no_xml() {
        let result = analyze_source("class Main { # }", "Main.jack");
        assert!(!result.is_ok());
        assert!(result.token_xml.is_empty());
    }

    #[test]
    fn syntax_failure_keeps_token_xml() {
        let result = analyze_source(
            "class Main { function void main() { let = 5; return; } }",
            "Main.jack",
        );
        assert!(!result.is_ok());
        assert!(!result.token_xml.is_empty());
        assert!(result.parse_xml.is_empty());
    }
}
