//! Source pragmas.
//!
//! A comment such as `/** @jsx h */` or `// @jsxFrag Fragment` overrides the
//! element factory or fragment name for the file it appears in. The first
//! occurrence of each directive wins. Only comments count: `"@jsx h"` in a
//! string literal is ordinary text.

use crate::ast::Pragmas;
use jsxlite_lexer::strip;
use regex::Regex;
use std::sync::LazyLock;

static FACTORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@jsx\s+([A-Za-z_$][\w$.]*)").expect("factory pragma pattern is valid")
});

static FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@jsxFrag\s+([A-Za-z_$][\w$.]*)").expect("fragment pragma pattern is valid")
});

impl Pragmas {
    /// Scan the original (unstripped) source for pragma comments.
    pub fn resolve(source: &str) -> Self {
        if !source.contains("@jsx") {
            return Self::default();
        }

        let stripped: Vec<char> = strip(source).chars().collect();
        let pragmas = Self {
            factory: find_in_comment(&FACTORY, source, &stripped),
            fragment: find_in_comment(&FRAGMENT, source, &stripped),
        };
        if pragmas != Self::default() {
            log::trace!("pragma overrides: {pragmas:?}");
        }
        pragmas
    }
}

/// First match of `pattern` whose `@` the stripper blanked, i.e. one that
/// sits inside a comment.
fn find_in_comment(pattern: &Regex, source: &str, stripped: &[char]) -> Option<String> {
    pattern.captures_iter(source).find_map(|caps| {
        let at = caps.get(0)?;
        let offset = source[..at.start()].chars().count();
        let name = caps.get(1)?;
        (stripped.get(offset) != Some(&'@')).then(|| name.as_str().to_string())
    })
}
