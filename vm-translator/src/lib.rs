//! VM translator: stack-machine bytecode (`.vm`) to Hack assembly (`.asm`).
//!
//! Single-file mode translates one source with no bootstrap. Directory mode
//! concatenates every `.vm` file into one output, prefixed by the bootstrap
//! (`SP = 256; call Sys.init 0`), with one [`CodeWriter`] threaded through
//! all files so generated labels never collide.

pub mod codegen;
pub mod error;
pub mod memory;
pub mod parser;

use std::fs;
use std::path::{Path, PathBuf};

use crate::codegen::CodeWriter;
pub use crate::error::{Result, VmError};
use crate::parser::parse_line;

/// Translate one source through a caller-owned writer. The writer carries
/// the label counter, so passing the same writer for several sources keeps
/// their labels disjoint.
pub fn translate_source(
    source: &str,
    filename: &str,
    codegen: &mut CodeWriter,
) -> Result<String> {
    codegen.set_filename(filename);

    let mut output = String::with_capacity(source.lines().count() * 50);

    for (line_num, line) in source.lines().enumerate() {
        if let Some(cmd) = parse_line(line, line_num + 1, filename)? {
            codegen.translate(&cmd, &mut output);
        }
    }

    Ok(output)
}

/// Translate a single VM source string (no bootstrap).
pub fn translate(source: &str, filename: &str) -> Result<String> {
    let mut codegen = CodeWriter::new();
    translate_source(source, filename, &mut codegen)
}

/// Translate a single `.vm` file (no bootstrap).
pub fn translate_file(path: &Path) -> Result<String> {
    let filename = file_stem(path);

    let source = fs::read_to_string(path).map_err(|e| VmError::FileRead {
        path: path.display().to_string(),
        source: e,
    })?;

    translate(&source, filename)
}

/// Translate every `.vm` file in a directory into one assembly listing,
/// bootstrap first, files in name order.
pub fn translate_directory(dir_path: &Path) -> Result<String> {
    let mut vm_files: Vec<PathBuf> = fs::read_dir(dir_path)
        .map_err(|e| VmError::FileRead {
            path: dir_path.display().to_string(),
            source: e,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "vm"))
        .collect();

    if vm_files.is_empty() {
        return Err(VmError::NoVmFiles {
            path: dir_path.display().to_string(),
        });
    }

    vm_files.sort();

    let mut codegen = CodeWriter::new();
    let mut output = String::with_capacity(4096);

    codegen.write_bootstrap(&mut output);

    for vm_file in &vm_files {
        let source = fs::read_to_string(vm_file).map_err(|e| VmError::FileRead {
            path: vm_file.display().to_string(),
            source: e,
        })?;
        let asm = translate_source(&source, file_stem(vm_file), &mut codegen)?;
        output.push_str(&asm);
    }

    Ok(output)
}

/// Output file for an input: `X.vm` -> `X.asm`, directory `D` -> `D/D.asm`.
pub fn output_path(input: &Path) -> PathBuf {
    if input.is_dir() {
        let dir_name = input
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        input.join(format!("{}.asm", dir_name))
    } else {
        input.with_extension("asm")
    }
}

fn file_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("Unknown")
}
