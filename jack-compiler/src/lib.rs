//! Jack compiler: Jack source to VM code.
//!
//! The front half (tokenizer, parser, AST) lives in the `jack-analyzer`
//! crate; this crate adds the scoped symbol table and the VM code generator,
//! and drives whole files and directories.

pub mod codegen;
pub mod error;
pub mod symbol_table;
pub mod vm_writer;

use rayon::prelude::*;
use std::fs;
use std::path::Path;

pub use codegen::CodeGenerator;
pub use error::CompileError;
pub use symbol_table::{Symbol, SymbolKind, SymbolTable};
pub use vm_writer::VmWriter;

/// Result of compiling one Jack file.
#[derive(Debug)]
pub struct CompileResult {
    pub filename: String,
    /// Generated VM code; empty when errors occurred.
    pub vm_code: String,
    pub errors: Vec<CompileError>,
}

impl CompileResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Compile in-memory Jack source.
pub fn compile_source(source: &str, filename: &str) -> CompileResult {
    let tokens = match jack_analyzer::tokenizer::JackTokenizer::new(source).tokenize() {
        Ok(tokens) => tokens,
        Err(errors) => {
            return CompileResult {
                filename: filename.to_string(),
                vm_code: String::new(),
                errors: errors.into_iter().map(CompileError::from).collect(),
            };
        }
    };

    let class = match jack_analyzer::parser::Parser::new(&tokens).parse() {
        Ok(class) => class,
        Err(errors) => {
            return CompileResult {
                filename: filename.to_string(),
                vm_code: String::new(),
                errors: errors.into_iter().map(CompileError::from).collect(),
            };
        }
    };

    match CodeGenerator::compile(&class) {
        Ok(vm_code) => CompileResult {
            filename: filename.to_string(),
            vm_code,
            errors: Vec::new(),
        },
        Err(errors) => CompileResult {
            filename: filename.to_string(),
            vm_code: String::new(),
            errors,
        },
    }
}

/// Compile a single `.jack` file.
pub fn compile_file(path: &Path) -> CompileResult {
    let filename = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string();

    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            return CompileResult {
                filename,
                vm_code: String::new(),
                errors: vec![CompileError::io(path, e)],
            };
        }
    };

    compile_source(&source, &filename)
}

/// Compile every `.jack` file in a directory, in parallel.
pub fn compile_directory(dir: &Path) -> Vec<CompileResult> {
    let jack_files: Vec<_> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "jack"))
            .collect(),
        Err(e) => {
            return vec![CompileResult {
                filename: dir.to_string_lossy().to_string(),
                vm_code: String::new(),
                errors: vec![CompileError::io(dir, e)],
            }];
        }
    };

    if jack_files.is_empty() {
        return Vec::new();
    }

    jack_files
        .par_iter()
        .map(|path| compile_file(path))
        .collect()
}

/// Write a compile result to `<output_dir>/<name>.vm`.
pub fn write_result(result: &CompileResult, output_dir: &Path) -> Result<(), CompileError> {
    let vm_path = output_dir.join(format!("{}.vm", result.filename));
    fs::write(&vm_path, &result.vm_code).map_err(|e| CompileError::io(&vm_path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_minimal_class() {
        let result = compile_source(
            "class Main { function void main() { return; } }",
            "Main",
        );
        assert!(result.is_ok());
        assert!(result.vm_code.contains("function Main.main 0"));
    }

    #[test]
    fn lexical_errors_surface_as_parse_errors() {
        let result = compile_source("class Main { # }", "Main");
        assert!(!result.is_ok());
        assert!(
            result
                .errors
                .iter()
                .any(|e| matches!(e, CompileError::Parse(_)))
        );
    }

    #[test]
    fn semantic_errors_surface_from_codegen() {
        let result = compile_source(
            "class Main { function void main() { let x = 5; return; } }",
            "Main",
        );
        assert!(!result.is_ok());
        assert!(result.vm_code.is_empty());
    }
}
