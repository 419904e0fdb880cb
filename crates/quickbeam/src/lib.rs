//! # Quickbeam
//!
//! A tree-walking interpreter for a small scripting language with
//! JavaScript-like syntax and move-by-default variables.
//!
//! Reading a variable in an expression moves its value out; `copy` reads
//! without moving. Declarations come in grades: `let` bindings are fixed,
//! `var` bindings may be reassigned with `set`, and `mut` bindings may be
//! mutated in place.
//!
//! ## Architecture
//!
//! - **Lexer**: source text to tokens, newlines included
//! - **Parser**: tokens to an AST; nested operators need parentheses
//! - **Resolver**: static scope, move and mutability checks
//! - **Evaluator**: runs the checked AST
//! - **Diagnostics**: Rust-style rendering of any phase's error
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//! use quickbeam::{run_source, CaptureSink, EvalContext};
//!
//! let sink = Rc::new(CaptureSink::new());
//! let ctx = EvalContext::new().with_output(sink.clone());
//! run_source("let x = 5\nprint (copy x) + 1", &ctx).unwrap();
//! assert_eq!(sink.lines(), vec!["6".to_string()]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod context;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod resolver;
pub mod span;
pub mod stack;
pub mod value;

use std::sync::Once;

// Re-export main types
pub use ast::{Expr, Grade, Program, Stmt};
pub use context::EvalContext;
pub use diagnostics::{render, render_named, Diagnostic};
pub use environment::{Binding, Environment, Scope, ScopeGuard};
pub use error::{EnvironmentError, Error, EvalError, LexError, ParseError, ResolveError, Result};
pub use eval::{eval_block, eval_expr, evaluate, ControlFlow, Evaluate};
pub use lexer::{tokenize, Token, TokenKind};
pub use output::{CaptureSink, PrintSink, StdoutSink};
pub use resolver::{resolve, ResolvedProgram};
pub use span::Span;
pub use value::{ClassValue, FunctionValue, ListValue, ObjectValue, Value};

/// Quickbeam version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    });
}

// ═══════════════════════════════════════════════════════════════════════
// Pipeline
// ═══════════════════════════════════════════════════════════════════════

/// Lex and parse `source`.
pub fn parse_program(source: &str) -> Result<Program> {
    let tokens = tokenize(source)?;
    Ok(parser::parse(&tokens)?)
}

/// Lex, parse and resolve `source` without running it.
pub fn check_source(source: &str) -> Result<ResolvedProgram> {
    let program = parse_program(source)?;
    Ok(resolve(program)?)
}

/// Run a resolved program in a fresh environment.
pub fn run(program: &ResolvedProgram, ctx: &EvalContext) -> Result<Value> {
    let mut env = Environment::with_max_call_depth(ctx.max_call_depth);
    Ok(evaluate(program, &mut env, ctx)?)
}

/// Run `source` through every phase.
pub fn run_source(source: &str, ctx: &EvalContext) -> Result<Value> {
    let program = check_source(source)?;
    run(&program, ctx)
}
