//! jsxlite Parser
//!
//! Builds a [`Program`] tree from the lexer's flat token stream. Script text
//! stays opaque; markup becomes [`Element`] nodes with properties and
//! children. Also resolves `@jsx` / `@jsxFrag` pragmas from the source.
//!
//! ```
//! use jsxlite_parser::{Node, Parser};
//!
//! let program = Parser::parse("x = <A><B/></A>;").unwrap();
//! assert_eq!(program.nodes.len(), 3);
//! assert!(matches!(&program.nodes[1], Node::Element(el) if el.tag == "A"));
//! ```

pub mod ast;
pub mod parser;
pub mod pragma;

pub use ast::{Child, Element, Node, Pragmas, Program, PropValue, Property};
pub use jsxlite_lexer::ErrorKind;
pub use parser::Parser;

use jsxlite_lexer::{LexerError, Location};

/// Parser error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Parse error at line {line}, column {column}: {message}\n  | {snippet}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub snippet: String,
}

impl ParseError {
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

impl From<LexerError> for ParseError {
    fn from(e: LexerError) -> Self {
        Self {
            kind: e.kind,
            message: e.message,
            line: e.line,
            column: e.column,
            snippet: e.snippet,
        }
    }
}
