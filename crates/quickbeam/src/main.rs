use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use quickbeam::{check_source, parse_program, render_named, run, tokenize, EvalContext, Value};

/// quickbeam runs scripts written in a small move-by-default language.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a script.
    Run {
        /// Script to run
        file: PathBuf,

        /// Maximum call depth before reporting a stack overflow
        #[arg(long, default_value_t = 1000)]
        max_depth: usize,

        /// Print the program's final value when it is not nil
        #[arg(short, long)]
        print_result: bool,
    },

    /// Lex, parse and resolve a script without running it.
    Check {
        /// Script to check
        file: PathBuf,
    },

    /// Print the tokens of a script.
    Tokens {
        /// Script to lex
        file: PathBuf,
    },

    /// Print the statements of a script as parsed.
    Ast {
        /// Script to parse
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    quickbeam::init_tracing();
    let args = Args::parse();

    match execute(args.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read `{}`", path.display()))
}

/// Report a pipeline error on stderr.
fn report(error: &quickbeam::Error, source: &str, path: &Path) -> ExitCode {
    eprint!("{}", render_named(error, source, &path.display().to_string()));
    ExitCode::FAILURE
}

fn execute(command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Run {
            file,
            max_depth,
            print_result,
        } => {
            let source = read_source(&file)?;
            let ctx = EvalContext::new().with_max_call_depth(max_depth);
            let result = check_source(&source).and_then(|program| run(&program, &ctx));
            match result {
                Ok(value) => {
                    if print_result && !matches!(value, Value::Nil) {
                        println!("{}", value);
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => Ok(report(&e, &source, &file)),
            }
        }
        Command::Check { file } => {
            let source = read_source(&file)?;
            match check_source(&source) {
                Ok(program) => {
                    println!(
                        "{}: ok ({} statements, {} bindings)",
                        file.display(),
                        program.program.stmts.len(),
                        program.binding_count
                    );
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => Ok(report(&e, &source, &file)),
            }
        }
        Command::Tokens { file } => {
            let source = read_source(&file)?;
            match tokenize(&source) {
                Ok(tokens) => {
                    for token in tokens {
                        println!("{}", token);
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => Ok(report(&quickbeam::Error::from(e), &source, &file)),
            }
        }
        Command::Ast { file } => {
            let source = read_source(&file)?;
            match parse_program(&source) {
                Ok(program) => {
                    for stmt in &program.stmts {
                        println!("{:#?}", stmt);
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => Ok(report(&e, &source, &file)),
            }
        }
    }
}
