//! JackCompiler CLI - compiles `.jack` files to `.vm` files.

use clap::Parser as ClapParser;
use jack_compiler::{compile_directory, compile_file, write_result};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(ClapParser, Debug)]
#[command(name = "JackCompiler")]
#[command(version)]
#[command(about = "Jack to VM code compiler")]
struct Args {
    /// Input file (.jack) or directory containing .jack files
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output directory (defaults to the input's directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the XT.xml token file for each input
    #[arg(long = "emit-tokens")]
    emit_tokens: bool,
}

fn emit_token_xml(input: &PathBuf, output_dir: &PathBuf) {
    let Ok(source) = fs::read_to_string(input) else {
        return;
    };
    let Ok(tokens) = jack_analyzer::tokenizer::JackTokenizer::new(&source).tokenize() else {
        return;
    };

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    let token_path = output_dir.join(format!("{}T.xml", stem));
    if let Err(e) = fs::write(&token_path, jack_analyzer::xml::tokens_to_xml(&tokens)) {
        eprintln!("Error writing {}: {}", token_path.display(), e);
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let (results, inputs, output_dir) = if args.input.is_file() {
        let result = compile_file(&args.input);
        let output_dir = args.output.clone().unwrap_or_else(|| {
            args.input
                .parent()
                .unwrap_or(&PathBuf::from("."))
                .to_path_buf()
        });
        (vec![result], vec![args.input.clone()], output_dir)
    } else if args.input.is_dir() {
        let results = compile_directory(&args.input);
        let inputs = results
            .iter()
            .map(|r| args.input.join(format!("{}.jack", r.filename)))
            .collect();
        let output_dir = args.output.clone().unwrap_or_else(|| args.input.clone());
        (results, inputs, output_dir)
    } else {
        eprintln!("Error: input not found: {}", args.input.display());
        return ExitCode::from(2);
    };

    if results.is_empty() {
        eprintln!("Error: no .jack files found in {}", args.input.display());
        return ExitCode::from(2);
    }

    let mut has_errors = false;

    for (result, input) in results.iter().zip(&inputs) {
        if result.is_ok() {
            match write_result(result, &output_dir) {
                Ok(()) => {
                    if args.emit_tokens {
                        emit_token_xml(input, &output_dir);
                    }
                    println!("Compiled {}.jack -> {}.vm", result.filename, result.filename);
                }
                Err(e) => {
                    eprintln!("Error writing {}.vm: {}", result.filename, e);
                    has_errors = true;
                }
            }
        } else {
            has_errors = true;
            for err in &result.errors {
                eprintln!("{}: {}", result.filename, err);
            }
        }
    }

    if has_errors {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
