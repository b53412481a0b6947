//! jsxlite Code Generator
//!
//! Last stage of the pipeline and the crate most callers depend on. Turns a
//! parsed [`Program`](jsxlite_parser::Program) into plain script code and
//! exposes [`compile`], which runs all four stages:
//!
//! ```text
//! source → strip → Scanner → Parser → generate → post-process rules → code
//! ```
//!
//! ```
//! use jsxlite_codegen::{compile, CompileOptions};
//!
//! let options = CompileOptions::new().with_strict_mode(false);
//! let code = compile("<A><B>x</B></A>", &options).unwrap();
//! assert_eq!(code, "React.createElement(A, null, React.createElement(B, null, \"x\"))");
//! ```

pub mod detect;
pub mod entities;
pub mod js;
pub mod options;

pub use detect::looks_already_compiled;
pub use entities::decode_entities;
pub use options::{CompileOptions, PostProcessRule, DEFAULT_FACTORY_NAME, DEFAULT_FRAGMENT_NAME};

use jsxlite_lexer::{strip, LexerError, Location, Scanner};
use jsxlite_parser::{ParseError, Parser};

/// Code generation error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Codegen error at line {line}, column {column}: {message}\n  | {snippet}")]
pub struct CodegenError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub snippet: String,
}

impl CodegenError {
    /// Build an error positioned at character `offset` of `source`.
    pub fn at(message: impl Into<String>, source: &str, offset: usize) -> Self {
        let Location {
            line,
            column,
            snippet,
        } = Location::locate(source, offset);
        Self {
            message: message.into(),
            line,
            column,
            snippet,
        }
    }
}

/// Any failure of a [`compile`] call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl CompileError {
    /// 1-based line of the failure.
    pub fn line(&self) -> usize {
        match self {
            Self::Lexer(e) => e.line,
            Self::Parse(e) => e.line,
            Self::Codegen(e) => e.line,
        }
    }

    /// 0-based column of the failure.
    pub fn column(&self) -> usize {
        match self {
            Self::Lexer(e) => e.column,
            Self::Parse(e) => e.column,
            Self::Codegen(e) => e.column,
        }
    }
}

/// Compile markup-extended script into plain script.
///
/// Each stage either produces complete output or fails; there is no partial
/// result.
pub fn compile(source: &str, options: &CompileOptions) -> Result<String, CompileError> {
    let stripped = strip(source);
    log::debug!("stripped {} characters of source", stripped.chars().count());

    let tokens = Scanner::new(&stripped, source)
        .with_max_recursive_calls(options.max_recursive_calls)
        .scan()?;
    log::debug!("scanned {} tokens", tokens.len());

    let program = Parser::new(tokens, source)
        .with_max_recursive_calls(options.max_recursive_calls)
        .parse_program()?;
    log::debug!("parsed {} top-level nodes", program.nodes.len());

    let mut code = js::generate(&program, source, options)?;

    for rule in &options.post_process_rules {
        log::trace!("applying post-process rule /{}/", rule.pattern());
        code = rule.apply(&code);
    }

    log::debug!("generated {} bytes of code", code.len());
    Ok(code)
}
