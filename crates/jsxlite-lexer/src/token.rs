/// A range of source text, in character offsets.
///
/// Offsets always address the original source: the comment stripper keeps
/// character count intact, so positions found in stripped text are valid
/// in the text the user wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A human-oriented position: 1-based line, 0-based column and the trimmed
/// text of the line, for error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub snippet: String,
}

impl Location {
    /// Resolve a character offset against `source`. Offsets past the end
    /// resolve to the end of the last line.
    pub fn locate(source: &str, offset: usize) -> Self {
        let mut line = 1;
        let mut column = 0;
        let mut line_start = 0;

        for (i, ch) in source.chars().enumerate() {
            if i == offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 0;
                line_start = i + 1;
            } else {
                column += 1;
            }
        }

        let snippet: String = source
            .chars()
            .skip(line_start)
            .take_while(|&c| c != '\n')
            .collect();

        Self {
            line,
            column,
            snippet: snippet.trim().to_string(),
        }
    }
}

/// The value half of an attribute name/value pair.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// `name="text"` or `name='text'`; holds the text between the quotes.
    Quoted(String),
    /// `name={expr}` or `{...expr}` without nested markup; holds the text
    /// between the braces (or after the spread dots).
    Expression(String),
    /// Bare `name`, meaning boolean `true`.
    Implicit,
}

/// Token classification.
///
/// Data-carrying variants embed the literal substring they were scanned from.
/// The stream is flat: nesting is recovered by the parser from
/// `ElementStart`/`ElementEnd` pairing and the `ChildExpressionOpen`/
/// `ChildExpressionClose` brackets around expressions that contain markup.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Script text outside any markup.
    Raw(String),
    /// `<name` (empty name for a fragment `<>`).
    ElementStart(String),
    /// `</name>`, `</>` or the `/>` of a self-closing tag (carrying the
    /// name of the element it closes).
    ElementEnd(String),
    /// An attribute name. Spread attributes use the name `...`.
    AttributeName(String),
    /// The value paired with the preceding `AttributeName`. Values that
    /// contain markup are emitted as an `ElementStart` or a
    /// `ChildExpressionOpen` group instead.
    AttributeValue(AttrValue),
    /// Literal text between tags.
    ChildText(String),
    /// A `{expr}` child with no nested markup, braces stripped.
    ChildExpression(String),
    /// Whitespace-only text between tags.
    ChildWhitespace(String),
    /// The script text from `{` up to the first nested element.
    ChildExpressionOpen(String),
    /// The script text from the last nested element up to `}`.
    ChildExpressionClose(String),
}

/// A token produced by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_locate_first_line() {
        let loc = Location::locate("let a = <A/>;", 8);
        assert_eq!(loc.line, 1);
        assert_eq!(loc.column, 8);
        assert_eq!(loc.snippet, "let a = <A/>;");
    }

    #[test]
    fn test_locate_later_line() {
        let loc = Location::locate("one\n  two three\nfour", 10);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 6);
        assert_eq!(loc.snippet, "two three");
    }

    #[test]
    fn test_locate_past_end() {
        let loc = Location::locate("ab\ncd", 99);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 2);
        assert_eq!(loc.snippet, "cd");
    }

    #[test]
    fn test_locate_counts_characters_not_bytes() {
        let loc = Location::locate("é <b>", 2);
        assert_eq!(loc.column, 2);
    }
}
