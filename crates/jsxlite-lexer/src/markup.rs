//! Deciding whether a `<` opens markup.
//!
//! Both the comment stripper and the scanner need to know where markup
//! begins, and they must agree or the two passes disagree on element
//! boundaries. This module is the single place that decision is made.

/// Where the `<` was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupContext {
    /// Ordinary script code, where `<` is usually a comparison.
    Script,
    /// Between an element's tags, where `<` can only be markup.
    Children,
}

/// Keywords after which an expression (and therefore markup) may begin.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "yield", "await", "case", "default", "else", "typeof", "in", "of", "do", "void",
    "delete", "throw", "new",
];

/// First character of a tag or attribute name.
pub fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

/// Subsequent characters of a tag or attribute name. Covers member
/// expressions (`UI.Button`), namespaces (`svg:rect`) and custom elements
/// (`my-element`).
pub fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '.' | ':' | '-')
}

/// Is `rest` (which starts at a `<`) the beginning of an opening tag or a
/// fragment? `before` is the text preceding it.
///
/// In script context the `<` must not follow an operand (`a<b`, `f()<x`),
/// and scanning forward from the tag name must reach the tag's `>` before
/// any of `)`, `&`, `|`, `?` or `;`. Quoted attribute values
/// and `{...}` attribute expressions are skipped while scanning.
pub fn is_markup_start(before: &[char], rest: &[char], context: MarkupContext) -> bool {
    if rest.first() != Some(&'<') {
        return false;
    }

    match rest.get(1) {
        Some('>') => return context == MarkupContext::Children || !follows_operand(before),
        Some(&c) if is_name_start(c) => {}
        _ => return false,
    }

    match context {
        MarkupContext::Children => true,
        MarkupContext::Script => !follows_operand(before) && reaches_tag_end(rest),
    }
}

/// Is `rest` the beginning of a closing tag (`</name` or `</>`)?
pub fn is_closing_tag_start(rest: &[char]) -> bool {
    rest.first() == Some(&'<')
        && rest.get(1) == Some(&'/')
        && rest.get(2).is_some_and(|&c| c == '>' || is_name_start(c))
}

fn follows_operand(before: &[char]) -> bool {
    let Some(end) = before.iter().rposition(|c| !c.is_whitespace()) else {
        return false;
    };

    match before[end] {
        ')' | ']' | '"' | '\'' | '`' => true,
        c if c.is_alphanumeric() || c == '_' || c == '$' => {
            let start = before[..=end]
                .iter()
                .rposition(|&c| !(c.is_alphanumeric() || c == '_' || c == '$'))
                .map_or(0, |i| i + 1);
            let word: String = before[start..=end].iter().collect();
            !EXPRESSION_KEYWORDS.contains(&word.as_str())
        }
        _ => false,
    }
}

fn reaches_tag_end(rest: &[char]) -> bool {
    let mut i = 1;
    while i < rest.len() && is_name_char(rest[i]) {
        i += 1;
    }

    while i < rest.len() {
        match rest[i] {
            '>' => return true,
            ')' | '&' | '|' | '?' | ';' => return false,
            quote @ ('"' | '\'') => match rest[i + 1..].iter().position(|&c| c == quote) {
                Some(offset) => i += offset + 2,
                None => return false,
            },
            '{' => match skip_braces(rest, i) {
                Some(next) => i = next,
                None => return false,
            },
            _ => i += 1,
        }
    }

    false
}

/// Given `rest[open] == '{'`, return the index just past the matching `}`.
fn skip_braces(rest: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < rest.len() {
        match rest[i] {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            quote @ ('"' | '\'' | '`') => {
                i += 1;
                while i < rest.len() && rest[i] != quote {
                    if rest[i] == '\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}
