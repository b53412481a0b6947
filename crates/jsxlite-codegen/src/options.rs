//! Compiler configuration.
//!
//! Options are read-only during a compile and may be changed between calls.
//! They deserialize from camelCase JSON so a host can pass them straight
//! through:
//!
//! ```json
//! {
//!   "factoryName": "h",
//!   "fragmentName": "Fragment",
//!   "maxRecursiveCalls": 500,
//!   "injectStrictMode": false,
//!   "postProcessRules": [{ "find": "^export default ", "replace": "" }]
//! }
//! ```

use jsxlite_lexer::DEFAULT_MAX_RECURSIVE_CALLS;
use regex::Regex;
use serde::Deserialize;

pub const DEFAULT_FACTORY_NAME: &str = "React.createElement";
pub const DEFAULT_FRAGMENT_NAME: &str = "React.Fragment";

/// Everything a caller can tune about a compile.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    /// Function called to create each element.
    pub factory_name: String,
    /// Identifier passed as the tag of a fragment (`<>...</>`).
    pub fragment_name: String,
    /// Bound on element nesting depth.
    pub max_recursive_calls: usize,
    /// Prefix the output with a `"use strict"` directive when it has none.
    pub inject_strict_mode: bool,
    /// Text substitutions applied, in order, to the generated code.
    pub post_process_rules: Vec<PostProcessRule>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            factory_name: DEFAULT_FACTORY_NAME.into(),
            fragment_name: DEFAULT_FRAGMENT_NAME.into(),
            max_recursive_calls: DEFAULT_MAX_RECURSIVE_CALLS,
            inject_strict_mode: true,
            post_process_rules: Vec::new(),
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factory_name(mut self, name: impl Into<String>) -> Self {
        self.factory_name = name.into();
        self
    }

    pub fn with_fragment_name(mut self, name: impl Into<String>) -> Self {
        self.fragment_name = name.into();
        self
    }

    pub fn with_max_recursive_calls(mut self, max: usize) -> Self {
        self.max_recursive_calls = max;
        self
    }

    pub fn with_strict_mode(mut self, inject: bool) -> Self {
        self.inject_strict_mode = inject;
        self
    }

    pub fn with_rule(mut self, rule: PostProcessRule) -> Self {
        self.post_process_rules.push(rule);
        self
    }
}

/// A regex substitution run over the generated code.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct PostProcessRule {
    find: Regex,
    replace: String,
}

/// Serialized form of a rule, before its pattern is compiled.
#[derive(Deserialize)]
struct RawRule {
    find: String,
    #[serde(default)]
    replace: String,
}

impl TryFrom<RawRule> for PostProcessRule {
    type Error = regex::Error;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        Self::new(&raw.find, raw.replace)
    }
}

impl PostProcessRule {
    /// Build a rule; `replace` may use `$1`-style capture references.
    pub fn new(find: &str, replace: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            find: Regex::new(find)?,
            replace: replace.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.find.as_str()
    }

    /// Replace every match in `code`.
    pub fn apply(&self, code: &str) -> String {
        self.find
            .replace_all(code, self.replace.as_str())
            .into_owned()
    }

    /// Rules that remove ES module syntax, for code that will be inlined
    /// into a page as a classic script: `import` lines are dropped and
    /// `export` / `export default` prefixes removed.
    pub fn strip_module_syntax() -> Vec<Self> {
        const RULES: &[(&str, &str)] = &[
            (
                r#"(?m)^[ \t]*import\s+[^;'"]*?\s+from\s+['"][^'"]+['"][ \t]*;?[ \t]*\r?\n?"#,
                "",
            ),
            (r#"(?m)^[ \t]*import\s+['"][^'"]+['"][ \t]*;?[ \t]*\r?\n?"#, ""),
            (r"(?m)^([ \t]*)export\s+default\s+", "$1"),
            (
                r"(?m)^([ \t]*)export\s+(const|let|var|function|class|async)\b",
                "$1$2",
            ),
        ];

        RULES
            .iter()
            .map(|(find, replace)| {
                Self::new(find, *replace).expect("module syntax pattern is valid")
            })
            .collect()
    }
}
