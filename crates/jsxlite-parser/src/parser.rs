//! Markup parser.
//!
//! Consumes the flat token stream from `jsxlite-lexer` in a single forward
//! pass and rebuilds element nesting from `ElementStart`/`ElementEnd` pairs.
//! Unfinished elements and expression containers live on an explicit frame
//! stack, so nesting depth is bounded by `max_recursive_calls` alone.

use crate::ast::{
    is_component_reference, Child, Element, Node, Pragmas, Program, PropValue, Property,
};
use crate::{ErrorKind, ParseError};
use jsxlite_lexer::{AttrValue, Scanner, Span, Token, TokenKind, DEFAULT_MAX_RECURSIVE_CALLS};

/// Markup parser.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
    max_recursive_calls: usize,
}

/// One unfinished construct on the parser's frame stack.
enum Frame {
    Element(OpenElement),
    /// An expression container that embeds markup.
    Fragments(OpenFragments),
}

struct OpenElement {
    tag: String,
    start: usize,
    depth: usize,
    properties: Vec<Property>,
    children: Vec<Child>,
    /// Attribute name and offset still waiting for its value.
    pending: Option<(String, usize)>,
}

impl OpenElement {
    fn finish(self, end: usize) -> Element {
        Element {
            is_component_reference: is_component_reference(&self.tag),
            tag: self.tag,
            properties: self.properties,
            children: self.children,
            depth: self.depth,
            span: Span::new(self.start, end),
        }
    }
}

struct OpenFragments {
    open: usize,
    depth: usize,
    nodes: Vec<Node>,
}

/// What the innermost frame asks the walk to do next.
enum Step {
    Continue,
    Push(Frame),
    /// The frame is complete; for elements, `end` is the closing offset.
    Close(usize),
}

impl<'a> Parser<'a> {
    /// Create a parser for tokens scanned from `source`.
    pub fn new(tokens: Vec<Token>, source: &'a str) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            max_recursive_calls: DEFAULT_MAX_RECURSIVE_CALLS,
        }
    }

    /// Override the nesting bound.
    pub fn with_max_recursive_calls(mut self, max: usize) -> Self {
        self.max_recursive_calls = max;
        self
    }

    /// Tokenize and parse `source` with default limits.
    pub fn parse(source: &str) -> Result<Program, ParseError> {
        let tokens = Scanner::tokenize(source)?;
        Parser::new(tokens, source).parse_program()
    }

    /// Parse the whole token stream.
    pub fn parse_program(mut self) -> Result<Program, ParseError> {
        let pragmas = Pragmas::resolve(self.source);
        let mut nodes = Vec::new();

        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Raw(text) => {
                    let text = text.clone();
                    self.advance();
                    nodes.push(Node::Raw(text));
                }
                TokenKind::ElementStart(_) => {
                    nodes.push(Node::Element(self.parse_markup()?));
                }
                other => {
                    let message = format!("Unexpected {} outside of markup", describe(other));
                    return Err(self.syntax_error(message, token.span.start));
                }
            }
        }

        self.check_balance()?;

        Ok(Program { nodes, pragmas })
    }

    // =========================================================================
    // Markup walk
    // =========================================================================

    /// Parse a top-level element from its `ElementStart` through its
    /// `ElementEnd`, including everything nested inside it.
    fn parse_markup(&mut self) -> Result<Element, ParseError> {
        let mut frames = vec![Frame::Element(self.open_element(0)?)];

        loop {
            let step = match frames.last_mut() {
                Some(Frame::Element(el)) => self.step_element(el)?,
                Some(Frame::Fragments(fragments)) => self.step_fragments(fragments)?,
                None => return Err(self.syntax_error("Expected an element", self.offset())),
            };

            match step {
                Step::Continue => {}
                Step::Push(frame) => frames.push(frame),
                Step::Close(end) => match (frames.pop(), frames.last_mut()) {
                    (Some(Frame::Element(el)), None) => return Ok(el.finish(end)),
                    (Some(Frame::Element(el)), Some(Frame::Element(parent))) => {
                        let el = el.finish(end);
                        match parent.pending.take() {
                            Some((name, start)) => {
                                let value = PropValue::Element(Box::new(el));
                                parent.properties.push(self.property(name, start, Some(value))?);
                            }
                            None => parent.children.push(Child::Element(el)),
                        }
                    }
                    (Some(Frame::Element(el)), Some(Frame::Fragments(parent))) => {
                        parent.nodes.push(Node::Element(el.finish(end)));
                    }
                    (Some(Frame::Fragments(fragments)), Some(Frame::Element(parent))) => {
                        match parent.pending.take() {
                            Some((name, start)) => {
                                let value = PropValue::Fragments(fragments.nodes);
                                parent.properties.push(self.property(name, start, Some(value))?);
                            }
                            None => parent.children.push(Child::Expression(fragments.nodes)),
                        }
                    }
                    (_, _) => {
                        return Err(self.syntax_error(
                            "Expression container outside of an element",
                            self.offset(),
                        ));
                    }
                },
            }
        }
    }

    /// Consume an `ElementStart` at nesting `depth`.
    fn open_element(&mut self, depth: usize) -> Result<OpenElement, ParseError> {
        let (tag, start) = match self.peek() {
            Some(Token {
                kind: TokenKind::ElementStart(tag),
                span,
            }) => (tag.clone(), span.start),
            _ => return Err(self.syntax_error("Expected an element", self.offset())),
        };

        if depth >= self.max_recursive_calls {
            return Err(ParseError::at(
                ErrorKind::RecursionLimit,
                format!(
                    "Element nesting exceeds the limit of {} levels; raise `max_recursive_calls` if the input is legitimately this deep",
                    self.max_recursive_calls
                ),
                self.source,
                start,
            ));
        }
        self.advance();

        Ok(OpenElement {
            tag,
            start,
            depth,
            properties: Vec::new(),
            children: Vec::new(),
            pending: None,
        })
    }

    /// Consume an optional `ChildExpressionOpen` and start collecting the
    /// pieces of an expression that embeds markup.
    fn open_fragments(&mut self, depth: usize) -> OpenFragments {
        let open = self.offset();
        let mut nodes = Vec::new();

        if let Some(TokenKind::ChildExpressionOpen(text)) = self.peek().map(|t| &t.kind) {
            nodes.push(Node::Raw(text.clone()));
            self.advance();
        }

        OpenFragments { open, depth, nodes }
    }

    /// Consume one token inside an element.
    fn step_element(&mut self, el: &mut OpenElement) -> Result<Step, ParseError> {
        if let Some((name, start)) = el.pending.take() {
            return self.step_attribute_value(el, name, start);
        }

        let Some(token) = self.peek() else {
            return Err(self.syntax_error(format!("Unclosed element <{}>", el.tag), el.start));
        };

        match &token.kind {
            TokenKind::ElementEnd(name) => {
                if *name != el.tag {
                    let message =
                        format!("Expected closing tag </{}> but found </{name}>", el.tag);
                    return Err(self.syntax_error(message, token.span.start));
                }
                let end = token.span.end;
                self.advance();
                Ok(Step::Close(end))
            }
            TokenKind::AttributeName(name) => {
                el.pending = Some((name.clone(), token.span.start));
                self.advance();
                Ok(Step::Continue)
            }
            TokenKind::ChildText(text) => {
                el.children.push(Child::Text(text.clone()));
                self.advance();
                Ok(Step::Continue)
            }
            TokenKind::ChildWhitespace(text) => {
                el.children.push(Child::Whitespace(text.clone()));
                self.advance();
                Ok(Step::Continue)
            }
            TokenKind::ChildExpression(text) => {
                el.children.push(Child::Expression(vec![Node::Raw(text.clone())]));
                self.advance();
                Ok(Step::Continue)
            }
            TokenKind::ChildExpressionOpen(_) => Ok(Step::Push(Frame::Fragments(
                self.open_fragments(el.depth + 1),
            ))),
            TokenKind::ElementStart(_) => Ok(Step::Push(Frame::Element(
                self.open_element(el.depth + 1)?,
            ))),
            other => {
                let message = format!("Unexpected {} inside <{}>", describe(other), el.tag);
                Err(self.syntax_error(message, token.span.start))
            }
        }
    }

    /// Consume the value that follows an `AttributeName` token. Markup values
    /// push a frame and leave the attribute pending until that frame closes.
    fn step_attribute_value(
        &mut self,
        el: &mut OpenElement,
        name: String,
        start: usize,
    ) -> Result<Step, ParseError> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::AttributeValue(value)) => {
                let value = match value {
                    AttrValue::Quoted(text) => Some(PropValue::String(text.clone())),
                    AttrValue::Expression(text) => Some(PropValue::Expression(text.clone())),
                    AttrValue::Implicit => None,
                };
                self.advance();
                el.properties.push(self.property(name, start, value)?);
                Ok(Step::Continue)
            }
            Some(TokenKind::ChildExpressionOpen(_)) => {
                el.pending = Some((name, start));
                Ok(Step::Push(Frame::Fragments(
                    self.open_fragments(el.depth + 1),
                )))
            }
            Some(TokenKind::ElementStart(_)) => {
                el.pending = Some((name, start));
                Ok(Step::Push(Frame::Element(
                    self.open_element(el.depth + 1)?,
                )))
            }
            _ => Err(self.syntax_error(
                format!("Expected a value for attribute '{name}'"),
                start,
            )),
        }
    }

    /// Build a property whose value has just been consumed.
    fn property(
        &self,
        name: String,
        start: usize,
        value: Option<PropValue>,
    ) -> Result<Property, ParseError> {
        let span = Span::new(start, self.previous_end());

        if name == "..." {
            match value {
                Some(value) => Ok(Property::Spread { value, span }),
                None => Err(self.syntax_error("Spread attribute needs an expression", start)),
            }
        } else {
            Ok(Property::Attribute { name, value, span })
        }
    }

    /// Consume one token of an expression that embeds markup:
    /// `ChildExpressionOpen`, then elements interleaved with `ChildExpression`
    /// text, then `ChildExpressionClose`.
    fn step_fragments(&mut self, fragments: &mut OpenFragments) -> Result<Step, ParseError> {
        let Some(token) = self.peek() else {
            return Err(self.syntax_error("Unterminated expression container", fragments.open));
        };

        match &token.kind {
            TokenKind::ElementStart(_) => Ok(Step::Push(Frame::Element(
                self.open_element(fragments.depth)?,
            ))),
            TokenKind::ChildExpression(text) => {
                fragments.nodes.push(Node::Raw(text.clone()));
                self.advance();
                Ok(Step::Continue)
            }
            TokenKind::ChildExpressionClose(text) => {
                fragments.nodes.push(Node::Raw(text.clone()));
                let end = token.span.end;
                self.advance();
                Ok(Step::Close(end))
            }
            other => {
                let message = format!("Unexpected {} inside an expression", describe(other));
                Err(self.syntax_error(message, token.span.start))
            }
        }
    }

    /// Every element start must have an end. Mismatches are normally caught
    /// while walking; this catches anything the walk let through.
    fn check_balance(&self) -> Result<(), ParseError> {
        let starts = self
            .tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::ElementStart(_)))
            .count();
        let ends = self
            .tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::ElementEnd(_)))
            .count();

        if starts != ends {
            return Err(self.syntax_error(
                format!("Unbalanced markup: {starts} opening tags but {ends} closing tags"),
                self.source.chars().count(),
            ));
        }
        Ok(())
    }

    // =========================================================================
    // Token navigation helpers
    // =========================================================================

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Offset of the current token, or end of input.
    fn offset(&self) -> usize {
        self.peek()
            .map_or_else(|| self.source.chars().count(), |t| t.span.start)
    }

    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.span.end)
    }

    fn syntax_error(&self, message: impl Into<String>, offset: usize) -> ParseError {
        ParseError::at(ErrorKind::Syntax, message, self.source, offset)
    }
}

/// Short human description of a token for error messages.
fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Raw(_) => "script text".into(),
        TokenKind::ElementStart(name) => format!("tag <{name}>"),
        TokenKind::ElementEnd(name) => format!("closing tag </{name}>"),
        TokenKind::AttributeName(name) => format!("attribute '{name}'"),
        TokenKind::AttributeValue(_) => "attribute value".into(),
        TokenKind::ChildText(_) | TokenKind::ChildWhitespace(_) => "text".into(),
        TokenKind::ChildExpression(_)
        | TokenKind::ChildExpressionOpen(_)
        | TokenKind::ChildExpressionClose(_) => "expression".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Program {
        Parser::parse(source).unwrap()
    }

    fn first_element(program: &Program) -> &Element {
        program
            .nodes
            .iter()
            .find_map(|n| match n {
                Node::Element(el) => Some(el),
                Node::Raw(_) => None,
            })
            .expect("program has an element")
    }

    fn token(kind: TokenKind) -> Token {
        Token::new(kind, Span::new(0, 0))
    }

    // =========================================================================
    // Script passthrough
    // =========================================================================

    #[test]
    fn test_empty_program() {
        let program = parse("");
        assert!(program.nodes.is_empty());
        assert_eq!(program.pragmas, Pragmas::default());
    }

    #[test]
    fn test_plain_script() {
        let program = parse("let a = 1 < 2;");
        assert_eq!(program.nodes, vec![Node::Raw("let a = 1 < 2;".into())]);
    }

    // =========================================================================
    // Elements
    // =========================================================================

    #[test]
    fn test_self_closing_element() {
        let program = parse("<div/>");
        let el = first_element(&program);
        assert_eq!(el.tag, "div");
        assert!(!el.is_component_reference);
        assert!(el.properties.is_empty());
        assert!(el.children.is_empty());
        assert_eq!(el.depth, 0);
        assert_eq!(el.span, Span::new(0, 6));
    }

    #[test]
    fn test_component_reference() {
        let program = parse("x = <Foo.Bar></Foo.Bar>");
        let el = first_element(&program);
        assert_eq!(el.tag, "Foo.Bar");
        assert!(el.is_component_reference);
    }

    #[test]
    fn test_nested_depths() {
        let program = parse("<A><B><C/></B></A>");
        let a = first_element(&program);
        let Child::Element(b) = &a.children[0] else {
            panic!("expected element child");
        };
        let Child::Element(c) = &b.children[0] else {
            panic!("expected element child");
        };
        assert_eq!((a.depth, b.depth, c.depth), (0, 1, 2));
    }

    #[test]
    fn test_fragment() {
        let program = parse("<>x</>");
        let el = first_element(&program);
        assert!(el.is_fragment());
        assert_eq!(el.children, vec![Child::Text("x".into())]);
    }

    // =========================================================================
    // Properties
    // =========================================================================

    #[test]
    fn test_property_kinds() {
        let program = parse("<a href=\"/x\" n={1} hidden {...rest}/>");
        let el = first_element(&program);
        let values: Vec<_> = el
            .properties
            .iter()
            .map(|p| match p {
                Property::Attribute { name, value, .. } => (name.clone(), value.clone()),
                Property::Spread { value, .. } => ("...".to_string(), Some(value.clone())),
            })
            .collect();
        assert_eq!(
            values,
            vec![
                ("href".to_string(), Some(PropValue::String("/x".into()))),
                ("n".to_string(), Some(PropValue::Expression("1".into()))),
                ("hidden".to_string(), None),
                ("...".to_string(), Some(PropValue::Expression("rest".into()))),
            ]
        );
        assert!(matches!(el.properties[3], Property::Spread { .. }));
    }

    #[test]
    fn test_element_property_value() {
        let program = parse("<A icon=<B/> />");
        let el = first_element(&program);
        let Property::Attribute {
            value: Some(PropValue::Element(inner)),
            ..
        } = &el.properties[0]
        else {
            panic!("expected element value");
        };
        assert_eq!(inner.tag, "B");
        assert_eq!(inner.depth, 1);
    }

    #[test]
    fn test_markup_in_property_expression() {
        let program = parse("<A render={() => <B/>} />");
        let el = first_element(&program);
        let Property::Attribute {
            value: Some(PropValue::Fragments(nodes)),
            ..
        } = &el.properties[0]
        else {
            panic!("expected fragments value");
        };
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0], Node::Raw("() => ".into()));
        assert!(matches!(&nodes[1], Node::Element(b) if b.tag == "B"));
        assert_eq!(nodes[2], Node::Raw(String::new()));
    }

    // =========================================================================
    // Children
    // =========================================================================

    #[test]
    fn test_children_in_order() {
        let program = parse("<p>Hi {name} <b>!</b></p>");
        let el = first_element(&program);
        assert_eq!(el.children.len(), 4);
        assert_eq!(el.children[0], Child::Text("Hi ".into()));
        assert_eq!(
            el.children[1],
            Child::Expression(vec![Node::Raw("name".into())])
        );
        assert_eq!(el.children[2], Child::Whitespace(" ".into()));
        assert!(matches!(&el.children[3], Child::Element(b) if b.tag == "b"));
    }

    #[test]
    fn test_guarded_child_is_one_expression() {
        let program = parse("<A>{cond && <B/>}</A>");
        let el = first_element(&program);
        assert_eq!(el.children.len(), 1);
        let Child::Expression(nodes) = &el.children[0] else {
            panic!("expected expression child");
        };
        assert_eq!(nodes[0], Node::Raw("cond && ".into()));
        assert!(matches!(&nodes[1], Node::Element(b) if b.tag == "B" && b.depth == 1));
    }

    // =========================================================================
    // Pragmas
    // =========================================================================

    #[test]
    fn test_pragmas_resolved_from_source() {
        let program = parse("/** @jsx h */\nx = <a/>;");
        assert_eq!(program.pragmas.factory.as_deref(), Some("h"));
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn test_mismatched_closing_tag() {
        let err = Parser::parse("<A><B></A>").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.message, "Expected closing tag </B> but found </A>");
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 6);
        assert_eq!(err.snippet, "<A><B></A>");
    }

    #[test]
    fn test_mismatch_on_later_line() {
        let err = Parser::parse("x = (\n  <div>\n    <span>\n  </div>\n);").unwrap_err();
        assert_eq!(err.line, 4);
        assert_eq!(err.column, 2);
        assert_eq!(err.snippet, "</div>");
    }

    #[test]
    fn test_unclosed_element() {
        let err = Parser::parse("x = <A>text").unwrap_err();
        assert_eq!(err.message, "Unclosed element <A>");
        assert_eq!(err.column, 4);
    }

    #[test]
    fn test_lexer_errors_pass_through() {
        let err = Parser::parse("<A><B").unwrap_err();
        assert!(err.message.contains("Unterminated tag"));
    }

    #[test]
    fn test_recursion_limit() {
        let source = "<a><a><a></a></a></a>";
        let tokens = Scanner::tokenize(source).unwrap();
        let err = Parser::new(tokens, source)
            .with_max_recursive_calls(2)
            .parse_program()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::RecursionLimit);
        assert_eq!(err.column, 6);
    }

    #[test]
    fn test_missing_attribute_value() {
        let tokens = vec![
            token(TokenKind::ElementStart("A".into())),
            token(TokenKind::AttributeName("x".into())),
        ];
        let err = Parser::new(tokens, "<A x").parse_program().unwrap_err();
        assert_eq!(err.message, "Expected a value for attribute 'x'");
    }

    #[test]
    fn test_deep_nesting_uses_no_call_stack() {
        let depth = 20_000;
        let source = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        let deepest = std::thread::spawn(move || {
            let stripped = jsxlite_lexer::strip(&source);
            let tokens = Scanner::new(&stripped, &source)
                .with_max_recursive_calls(depth)
                .scan()
                .unwrap();
            let program = Parser::new(tokens, &source)
                .with_max_recursive_calls(depth)
                .parse_program()
                .unwrap();

            let Some(Node::Element(mut el)) = program.nodes.into_iter().next() else {
                panic!("expected an element");
            };
            // Unwind by hand so dropping the tree stays shallow too.
            while let Some(Child::Element(child)) = el.children.pop() {
                el = child;
            }
            el.depth
        })
        .join()
        .unwrap();
        assert_eq!(deepest, depth - 1);
    }

    #[test]
    fn test_stray_closing_token() {
        let tokens = vec![token(TokenKind::ElementEnd("A".into()))];
        let err = Parser::new(tokens, "</A>").parse_program().unwrap_err();
        assert!(err.message.contains("Unexpected closing tag </A>"));
    }

    #[test]
    fn test_unbalanced_stream_rejected() {
        let tokens = vec![
            token(TokenKind::ElementStart("A".into())),
            token(TokenKind::ElementEnd("A".into())),
            token(TokenKind::ElementEnd("A".into())),
        ];
        let err = Parser::new(tokens, "<A></A></A>").parse_program().unwrap_err();
        assert!(err.message.contains("closing tag"));
    }
}
