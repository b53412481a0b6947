//! Syntax tree for script text with embedded markup.
//!
//! Script code is never parsed: it is carried as opaque `Raw` text. Only
//! markup has structure. The tree is built once by the parser and only read
//! afterwards.

use jsxlite_lexer::Span;

/// A whole compiled unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub nodes: Vec<Node>,
    pub pragmas: Pragmas,
}

/// Factory/fragment overrides found in source comments (`@jsx h`,
/// `@jsxFrag Fragment`). They apply to one compile only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pragmas {
    pub factory: Option<String>,
    pub fragment: Option<String>,
}

/// A top-level node, or one fragment of an expression that embeds markup.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Script text, emitted verbatim.
    Raw(String),
    /// A markup element, emitted as a factory call.
    Element(Element),
}

/// A markup element or fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name as written; empty for a fragment (`<>...</>`).
    pub tag: String,
    /// True when the tag names a variable rather than an intrinsic element:
    /// it starts with an uppercase letter or is a member expression.
    pub is_component_reference: bool,
    pub properties: Vec<Property>,
    pub children: Vec<Child>,
    /// Distance from the outermost element. Only used for indentation.
    pub depth: usize,
    pub span: Span,
}

impl Element {
    pub fn is_fragment(&self) -> bool {
        self.tag.is_empty()
    }
}

/// Decide whether a tag name is a component reference.
pub fn is_component_reference(tag: &str) -> bool {
    tag.chars().next().is_some_and(char::is_uppercase) || tag.contains('.')
}

/// An entry in an element's property list.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// `name`, `name="text"`, `name={expr}` or `name=<El/>`.
    /// A `None` value is the boolean shorthand.
    Attribute {
        name: String,
        value: Option<PropValue>,
        span: Span,
    },
    /// `{...expr}`
    Spread { value: PropValue, span: Span },
}

/// The value of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// Text between quotes, entities not yet decoded.
    String(String),
    /// Script expression text.
    Expression(String),
    /// An element used directly as a value.
    Element(Box<Element>),
    /// An expression with markup inside it, as alternating script text and
    /// elements.
    Fragments(Vec<Node>),
}

/// A child of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Text(String),
    /// Text made only of whitespace.
    Whitespace(String),
    /// A `{...}` expression, as alternating script text and elements. Plain
    /// expressions are a single `Node::Raw`.
    Expression(Vec<Node>),
    Element(Element),
}
