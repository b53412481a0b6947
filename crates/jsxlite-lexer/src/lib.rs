//! jsxlite Lexer
//!
//! First two stages of the jsxlite pipeline: the comment stripper and the
//! tokenizer. Script code is passed through as opaque `Raw` text; only markup
//! (`<Widget attr="x">child</Widget>`) is broken into tokens.
//!
//! # Example
//!
//! ```
//! use jsxlite_lexer::{Scanner, TokenKind};
//!
//! let tokens = Scanner::tokenize("const a = <b/>;").unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::Raw("const a = ".into()));
//! assert_eq!(tokens[1].kind, TokenKind::ElementStart("b".into()));
//! ```

pub mod markup;
pub mod scanner;
pub mod stripper;
pub mod token;

pub use markup::{is_markup_start, MarkupContext};
pub use scanner::{Scanner, DEFAULT_MAX_RECURSIVE_CALLS};
pub use stripper::strip;
pub use token::{AttrValue, Location, Span, Token, TokenKind};

/// Broad class of a compile failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed markup: unterminated tags, mismatched closing tags and the like.
    Syntax,
    /// A scanning loop ran more iterations than the input has characters.
    LoopLimit,
    /// Element nesting went deeper than `max_recursive_calls`.
    RecursionLimit,
}

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Lexer error at line {line}, column {column}: {message}\n  | {snippet}")]
pub struct LexerError {
    pub kind: ErrorKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub snippet: String,
}

impl LexerError {
    /// Build an error positioned at character `offset` of `source`.
    pub fn at(kind: ErrorKind, message: impl Into<String>, source: &str, offset: usize) -> Self {
        let Location {
            line,
            column,
            snippet,
        } = Location::locate(source, offset);
        Self {
            kind,
            message: message.into(),
            line,
            column,
            snippet,
        }
    }
}
