//! Comment stripper.
//!
//! Blanks out `//` line comments, `/* */` block comments and `{/* */}`
//! markup comments, keeping everything else (string and template literal
//! contents included) untouched. Each blanked character becomes one space;
//! newlines survive so later diagnostics keep their line numbers. The output
//! has exactly as many characters as the input.
//!
//! Inside markup text `//` and `/*` are literal characters (`<a>http://x</a>`),
//! so the stripper tracks where markup begins and ends with a context stack.
//! This is a heuristic, not a parse: exotic operator sequences and regex
//! literals can fool it.

use crate::markup::{is_closing_tag_start, is_markup_start, MarkupContext};

/// Syntactic region the stripper is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Script code: top level, or inside `{ }` (including markup expression
    /// containers, where `{/* */}` markup comments live).
    Script,
    /// Inside a template literal, outside any `${ }`.
    Template,
    /// Between `<` and `>` of a tag.
    Tag { closing: bool },
    /// Between an opening and a closing tag.
    Children,
}

/// Lexeme currently being skipped over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    LineComment,
    BlockComment,
    Quoted(char),
}

/// Replace every comment in `source` with whitespace of identical length.
pub fn strip(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out: Vec<char> = Vec::with_capacity(chars.len());
    let mut stack = vec![Context::Script];
    let mut mode = Mode::Code;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match mode {
            Mode::LineComment => {
                if c == '\n' || c == '\r' {
                    mode = Mode::Code;
                }
                out.push(blank(c));
                i += 1;
                continue;
            }
            Mode::BlockComment => {
                if c == '*' && next == Some('/') {
                    out.extend([' ', ' ']);
                    mode = Mode::Code;
                    i += 2;
                } else {
                    out.push(blank(c));
                    i += 1;
                }
                continue;
            }
            Mode::Quoted(quote) => {
                out.push(c);
                if c == '\\' {
                    if let Some(escaped) = next {
                        out.push(escaped);
                        i += 1;
                    }
                } else if c == quote {
                    mode = Mode::Code;
                }
                i += 1;
                continue;
            }
            Mode::Code => {}
        }

        let context = *stack.last().unwrap_or(&Context::Script);
        match context {
            Context::Script => match c {
                '/' if next == Some('/') => {
                    mode = Mode::LineComment;
                    out.extend([' ', ' ']);
                    i += 2;
                    continue;
                }
                '/' if next == Some('*') => {
                    mode = Mode::BlockComment;
                    out.extend([' ', ' ']);
                    i += 2;
                    continue;
                }
                '\'' | '"' => mode = Mode::Quoted(c),
                '`' => stack.push(Context::Template),
                '{' => stack.push(Context::Script),
                '}' => {
                    if stack.len() > 1 {
                        stack.pop();
                    }
                }
                '<' if is_markup_start(&out, &chars[i..], MarkupContext::Script) => {
                    stack.push(Context::Tag { closing: false });
                }
                _ => {}
            },
            Context::Template => match c {
                '\\' => {
                    if let Some(escaped) = next {
                        out.extend([c, escaped]);
                        i += 2;
                        continue;
                    }
                }
                '`' => {
                    stack.pop();
                }
                '$' if next == Some('{') => {
                    out.extend([c, '{']);
                    stack.push(Context::Script);
                    i += 2;
                    continue;
                }
                _ => {}
            },
            Context::Tag { closing } => match c {
                '"' | '\'' => mode = Mode::Quoted(c),
                '{' => stack.push(Context::Script),
                '/' if next == Some('>') => {
                    stack.pop();
                    out.extend([c, '>']);
                    i += 2;
                    continue;
                }
                '>' => {
                    stack.pop();
                    if closing {
                        if stack.last() == Some(&Context::Children) {
                            stack.pop();
                        }
                    } else {
                        stack.push(Context::Children);
                    }
                }
                '<' if is_markup_start(&out, &chars[i..], MarkupContext::Script) => {
                    stack.push(Context::Tag { closing: false });
                }
                _ => {}
            },
            Context::Children => match c {
                '{' => stack.push(Context::Script),
                '<' if is_closing_tag_start(&chars[i..]) => {
                    stack.push(Context::Tag { closing: true });
                }
                '<' if is_markup_start(&out, &chars[i..], MarkupContext::Children) => {
                    stack.push(Context::Tag { closing: false });
                }
                _ => {}
            },
        }

        out.push(c);
        i += 1;
    }

    out.into_iter().collect()
}

fn blank(c: char) -> char {
    if c == '\n' || c == '\r' {
        c
    } else {
        ' '
    }
}
