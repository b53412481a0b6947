/// Substrings that show up in compiled or bundled script output.
const COMPILED_MARKERS: &[&str] = &[
    "createElement(",
    "\"use strict\"",
    "'use strict'",
    "__esModule",
    "sourceMappingURL=",
];

/// Guess whether `source` is already compiled, minified output that should
/// be passed through untouched: a single line carrying a compiled-code marker.
pub fn looks_already_compiled(source: &str) -> bool {
    let source = source.trim();
    !source.is_empty()
        && !source.contains('\n')
        && COMPILED_MARKERS.iter().any(|marker| source.contains(marker))
}
