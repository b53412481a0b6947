//! JavaScript code generator.
//!
//! Walks the program tree and writes script text in which every element is
//! replaced by a nested factory call:
//!
//! ```text
//! <a href="/">Home</a>   →   React.createElement("a", {href: "/"}, "Home")
//! ```
//!
//! Raw script text is copied through unchanged. The walk keeps its own task
//! and value stacks, so deeply nested markup does not grow the call stack.

use crate::entities::decode_entities;
use crate::options::CompileOptions;
use crate::CodegenError;
use jsxlite_lexer::Span;
use jsxlite_parser::ast::{Child, Element, Node, Program, PropValue, Property};

const STRICT_DIRECTIVE: &str = "\"use strict\";\n";

/// Property lists longer than this are broken across lines.
const MAX_INLINE_PROPS: usize = 80;

/// Generate script code for a program.
///
/// `source` is the original text, used to position diagnostics. Pragmas
/// recorded on the program take precedence over the factory and fragment
/// names in `options`.
pub fn generate(
    program: &Program,
    source: &str,
    options: &CompileOptions,
) -> Result<String, CodegenError> {
    let generator = Generator {
        source,
        factory: program
            .pragmas
            .factory
            .as_deref()
            .unwrap_or(&options.factory_name),
        fragment: program
            .pragmas
            .fragment
            .as_deref()
            .unwrap_or(&options.fragment_name),
    };

    let mut code = generator.render(Task::Nodes(&program.nodes))?;

    if options.inject_strict_mode && !has_strict_directive(&code) {
        code.insert_str(0, STRICT_DIRECTIVE);
    }

    Ok(code)
}

fn has_strict_directive(code: &str) -> bool {
    code.contains("\"use strict\"") || code.contains("'use strict'")
}

/// A unit of generation work. Rendering an element or a node list first
/// renders everything nested in it, leaving one string per nested piece on
/// the value stack, then assembles the result from those strings.
enum Task<'t> {
    Element(&'t Element),
    Nodes(&'t [Node]),
    FinishElement(&'t Element),
    FinishNodes(&'t [Node]),
}

struct Generator<'a> {
    source: &'a str,
    factory: &'a str,
    fragment: &'a str,
}

impl Generator<'_> {
    fn render(&self, root: Task<'_>) -> Result<String, CodegenError> {
        let mut tasks = vec![root];
        let mut values: Vec<String> = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                Task::Element(el) => {
                    tasks.push(Task::FinishElement(el));
                    tasks.extend(nested_tasks(el).rev());
                }
                Task::Nodes(nodes) => {
                    tasks.push(Task::FinishNodes(nodes));
                    tasks.extend(node_tasks(nodes).rev());
                }
                Task::FinishElement(el) => {
                    let count = nested_tasks(el).count();
                    let rendered = values.split_off(values.len().saturating_sub(count));
                    values.push(self.element(el, rendered)?);
                }
                Task::FinishNodes(nodes) => {
                    let count = node_tasks(nodes).count();
                    let rendered = values.split_off(values.len().saturating_sub(count));
                    values.push(concat_nodes(nodes, rendered));
                }
            }
        }

        Ok(values.pop().unwrap_or_default())
    }

    /// Assemble an element call from its already rendered nested pieces,
    /// given in property-then-child order.
    fn element(&self, el: &Element, rendered: Vec<String>) -> Result<String, CodegenError> {
        let mut rendered = rendered.into_iter();

        let tag = if el.is_fragment() {
            self.fragment.to_string()
        } else if el.is_component_reference {
            el.tag.clone()
        } else {
            quote(&el.tag)
        };

        let mut out = format!("{}({tag}, {}", self.factory, self.properties(el, &mut rendered)?);
        for child in children(el, &mut rendered) {
            out.push_str(", ");
            out.push_str(&child);
        }
        out.push(')');
        Ok(out)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    fn properties(
        &self,
        el: &Element,
        rendered: &mut impl Iterator<Item = String>,
    ) -> Result<String, CodegenError> {
        if el.properties.is_empty() {
            return Ok("null".into());
        }

        let mut entries = Vec::with_capacity(el.properties.len());
        for property in &el.properties {
            entries.push(match property {
                Property::Attribute { name, value, span } => {
                    let value = match value {
                        Some(value) => self.value(value, *span, rendered)?,
                        None => "true".into(),
                    };
                    format!("{}: {value}", property_key(name))
                }
                Property::Spread { value, span } => {
                    format!("...{}", self.value(value, *span, rendered)?)
                }
            });
        }

        let inline = format!("{{{}}}", entries.join(", "));
        if inline.chars().count() <= MAX_INLINE_PROPS {
            return Ok(inline);
        }

        let inner = "  ".repeat(el.depth + 1);
        let outer = "  ".repeat(el.depth);
        let lines: Vec<String> = entries.iter().map(|e| format!("{inner}{e}")).collect();
        Ok(format!("{{\n{}\n{outer}}}", lines.join(",\n")))
    }

    fn value(
        &self,
        value: &PropValue,
        span: Span,
        rendered: &mut impl Iterator<Item = String>,
    ) -> Result<String, CodegenError> {
        match value {
            PropValue::String(text) => Ok(quote(&decode_entities(text))),
            PropValue::Expression(code) => {
                let code = code.trim();
                if code.is_empty() {
                    return Err(CodegenError::at(
                        "Attribute expressions must not be empty",
                        self.source,
                        span.start,
                    ));
                }
                Ok(code.to_string())
            }
            PropValue::Element(_) => Ok(rendered.next().unwrap_or_default()),
            PropValue::Fragments(_) => Ok(rendered.next().unwrap_or_default().trim().to_string()),
        }
    }
}

/// Work for the pieces of `el` that need rendering, in property-then-child
/// order: element and markup-expression property values, element children
/// and expression children.
fn nested_tasks(el: &Element) -> impl DoubleEndedIterator<Item = Task<'_>> {
    let properties = el.properties.iter().filter_map(|property| {
        let value = match property {
            Property::Attribute { value, .. } => value.as_ref()?,
            Property::Spread { value, .. } => value,
        };
        match value {
            PropValue::Element(el) => Some(Task::Element(el)),
            PropValue::Fragments(nodes) => Some(Task::Nodes(nodes)),
            PropValue::String(_) | PropValue::Expression(_) => None,
        }
    });
    let children = el.children.iter().filter_map(|child| match child {
        Child::Element(el) => Some(Task::Element(el)),
        Child::Expression(nodes) => Some(Task::Nodes(nodes)),
        Child::Text(_) | Child::Whitespace(_) => None,
    });
    properties.chain(children)
}

fn node_tasks(nodes: &[Node]) -> impl DoubleEndedIterator<Item = Task<'_>> {
    nodes.iter().filter_map(|node| match node {
        Node::Element(el) => Some(Task::Element(el)),
        Node::Raw(_) => None,
    })
}

/// Concatenate script text with the rendered elements between it.
fn concat_nodes(nodes: &[Node], rendered: Vec<String>) -> String {
    let mut rendered = rendered.into_iter();
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Raw(text) => out.push_str(text),
            Node::Element(_) => out.push_str(&rendered.next().unwrap_or_default()),
        }
    }
    out
}

// =========================================================================
// Children
// =========================================================================

/// Render children as call arguments.
///
/// - empty expressions (`{}` or a lone `{/* comment */}`) are dropped;
/// - whitespace-only runs at either end are dropped;
/// - interior whitespace-only runs are kept as a `" "`-style argument
///   unless they contain a line break;
/// - the first text child loses leading whitespace, the last loses
///   trailing whitespace; interior text is kept exactly as written;
/// - an expression that embeds markup is a single argument.
fn children(el: &Element, rendered: &mut impl Iterator<Item = String>) -> Vec<String> {
    let mut kept: Vec<(&Child, String)> = Vec::with_capacity(el.children.len());
    for child in &el.children {
        let value = match child {
            Child::Element(_) | Child::Expression(_) => rendered.next().unwrap_or_default(),
            Child::Text(_) | Child::Whitespace(_) => String::new(),
        };
        if !is_empty_expression(child) {
            kept.push((child, value));
        }
    }

    while matches!(kept.last(), Some((Child::Whitespace(_), _))) {
        kept.pop();
    }
    let leading = kept
        .iter()
        .take_while(|(child, _)| matches!(child, Child::Whitespace(_)))
        .count();
    let kept = kept.split_off(leading);

    let last = kept.len().saturating_sub(1);
    let mut args = Vec::with_capacity(kept.len());

    for (i, (child, value)) in kept.into_iter().enumerate() {
        match child {
            Child::Text(text) => {
                let mut text = text.as_str();
                if i == 0 {
                    text = text.trim_start();
                }
                if i == last {
                    text = text.trim_end();
                }
                if !text.is_empty() {
                    args.push(quote(&decode_entities(text)));
                }
            }
            Child::Whitespace(space) => {
                if !space.contains('\n') {
                    args.push(quote(space));
                }
            }
            Child::Expression(_) => {
                let code = value.trim();
                if !code.is_empty() {
                    args.push(code.to_string());
                }
            }
            Child::Element(_) => args.push(value),
        }
    }

    args
}

fn is_empty_expression(child: &Child) -> bool {
    match child {
        Child::Expression(nodes) => nodes
            .iter()
            .all(|n| matches!(n, Node::Raw(text) if text.trim().is_empty())),
        _ => false,
    }
}

/// Object key for a property: bare when it is a plain identifier, quoted
/// otherwise (`"aria-label"`, `"xlink:href"`).
fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');

    if is_identifier {
        name.to_string()
    } else {
        quote(name)
    }
}

/// Double-quoted string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
