use crate::markup::{
    is_closing_tag_start, is_markup_start, is_name_char, is_name_start, MarkupContext,
};
use crate::stripper::strip;
use crate::token::{AttrValue, Span, Token, TokenKind};
use crate::{ErrorKind, LexerError};

/// Default bound on element nesting depth.
pub const DEFAULT_MAX_RECURSIVE_CALLS: usize = 1000;

/// Why a run of script text ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// At a `<` that opens markup.
    Markup,
    /// At the `}` closing the enclosing expression container.
    Brace,
    /// At end of input.
    End,
}

/// Where an expression container appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Site {
    Attribute,
    Child,
}

/// An unclosed `{` in script text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brace {
    /// Block, object literal or any other plain brace.
    Block,
    /// Template literal `${`; its `}` resumes the template text.
    Substitution,
}

/// One unfinished piece of markup on the scanner's frame stack.
#[derive(Debug)]
enum Frame {
    /// Inside an opening tag, before its `>` or `/>`.
    Tag { name: String, start: usize },
    /// Between an element's `>` and its closing tag.
    Children,
    /// Inside a `{...}` expression container.
    Expression(ExpressionFrame),
}

#[derive(Debug)]
struct ExpressionFrame {
    /// Offset of the `{`.
    open: usize,
    site: Site,
    /// Unclosed braces inside the container.
    braces: Vec<Brace>,
    /// Start of the pending script segment; `None` right after nested
    /// markup, until scanning resumes.
    segment_start: Option<usize>,
    /// Whether nested markup has already split the container.
    split: bool,
}

impl ExpressionFrame {
    fn new(open: usize, site: Site, body_start: usize) -> Self {
        Self {
            open,
            site,
            braces: Vec::new(),
            segment_start: Some(body_start),
            split: false,
        }
    }
}

/// Markup tokenizer.
///
/// Works on comment-free text (see [`strip`]) and produces a flat token
/// stream in source order. Script text between markup becomes `Raw` tokens.
/// Markup is scanned with an explicit stack of frames (open tag, children,
/// expression container) instead of recursion, so nesting depth never
/// touches the call stack.
///
/// Two safety limits make pathological input fail loudly instead of hanging:
/// - every scanning loop has an iteration budget proportional to the input;
/// - the stack of open elements may not grow past `max_recursive_calls`.
pub struct Scanner<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
    open: Vec<String>,
    max_recursive_calls: usize,
}

impl<'a> Scanner<'a> {
    /// Create a scanner over `stripped`, the comment-free copy of `source`.
    /// `source` is only used to render diagnostics.
    pub fn new(stripped: &str, source: &'a str) -> Self {
        Self {
            source,
            chars: stripped.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
            open: Vec::new(),
            max_recursive_calls: DEFAULT_MAX_RECURSIVE_CALLS,
        }
    }

    /// Override the nesting bound.
    pub fn with_max_recursive_calls(mut self, max: usize) -> Self {
        self.max_recursive_calls = max;
        self
    }

    /// Strip comments from `source` and tokenize it with default limits.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
        let stripped = strip(source);
        Scanner::new(&stripped, source).scan()
    }

    /// Scan the whole input.
    pub fn scan(mut self) -> Result<Vec<Token>, LexerError> {
        let mut iterations = 0;
        let mut braces = Vec::new();

        while !self.is_at_end() {
            self.tick(&mut iterations)?;

            let start = self.pos;
            let stop = self.scan_script(&mut braces, false)?;
            if self.pos > start {
                let text = self.slice(start, self.pos);
                self.push(TokenKind::Raw(text), start);
            }

            if stop == Stop::Markup {
                self.scan_markup()?;
            }
        }

        log::trace!("scanned {} tokens", self.tokens.len());
        Ok(self.tokens)
    }

    // =========================================================================
    // Script text
    // =========================================================================

    /// Advance over script text until markup begins, the enclosing
    /// expression container closes (only when `in_braces`), or input ends.
    /// `braces` holds unclosed `{` and `${` and persists across calls, so an
    /// expression split by nested markup keeps its balance and markup inside
    /// a template substitution is found.
    fn scan_script(&mut self, braces: &mut Vec<Brace>, in_braces: bool) -> Result<Stop, LexerError> {
        let mut iterations = 0;

        while let Some(c) = self.peek() {
            self.tick(&mut iterations)?;

            match c {
                '\'' | '"' => self.skip_string(c),
                '`' => {
                    self.advance();
                    self.skip_template_text(braces);
                }
                '{' => {
                    braces.push(Brace::Block);
                    self.advance();
                }
                '}' => match braces.pop() {
                    Some(Brace::Substitution) => {
                        self.advance();
                        self.skip_template_text(braces);
                    }
                    Some(Brace::Block) => self.advance(),
                    None if in_braces => return Ok(Stop::Brace),
                    None => self.advance(),
                },
                '<' if is_markup_start(
                    &self.chars[..self.pos],
                    &self.chars[self.pos..],
                    MarkupContext::Script,
                ) =>
                {
                    return Ok(Stop::Markup);
                }
                _ => self.advance(),
            }
        }

        Ok(Stop::End)
    }

    fn skip_string(&mut self, quote: char) {
        self.advance();
        while let Some(c) = self.peek() {
            self.advance();
            if c == '\\' {
                self.advance();
            } else if c == quote || c == '\n' {
                return;
            }
        }
    }

    /// Skip template literal text up to its closing backtick, or up to a
    /// `${`, which is pushed onto `braces` so the substitution is scanned as
    /// script.
    fn skip_template_text(&mut self, braces: &mut Vec<Brace>) {
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    self.advance();
                    self.advance();
                }
                '`' => {
                    self.advance();
                    return;
                }
                '$' if self.peek_next() == Some('{') => {
                    self.advance();
                    self.advance();
                    braces.push(Brace::Substitution);
                    return;
                }
                _ => self.advance(),
            }
        }
    }

    // =========================================================================
    // Markup
    // =========================================================================

    /// Scan one element starting at its `<`, with everything nested inside
    /// it, by driving the frame stack until it is empty.
    fn scan_markup(&mut self) -> Result<(), LexerError> {
        let mut frames = Vec::new();
        let mut iterations = 0;
        // Every step consumes input except closing an element at end of
        // input, and each element takes at least two characters.
        let limit = 2 * (self.chars.len() + 1);

        self.open_element(&mut frames)?;

        while let Some(frame) = frames.pop() {
            self.tick_within(&mut iterations, limit)?;

            match frame {
                Frame::Tag { name, start } => self.step_tag(name, start, &mut frames)?,
                Frame::Children => self.step_children(&mut frames)?,
                Frame::Expression(expr) => self.step_expression(expr, &mut frames)?,
            }
        }

        Ok(())
    }

    /// Consume `<name`, emit `ElementStart` and push the opening-tag frame.
    fn open_element(&mut self, frames: &mut Vec<Frame>) -> Result<(), LexerError> {
        let start = self.pos;

        if self.open.len() >= self.max_recursive_calls {
            return Err(LexerError::at(
                ErrorKind::RecursionLimit,
                format!(
                    "Element nesting exceeds the limit of {} levels; raise `max_recursive_calls` if the input is legitimately this deep",
                    self.max_recursive_calls
                ),
                self.source,
                start,
            ));
        }

        self.advance(); // consume `<`
        let name = self.read_name();
        self.push(TokenKind::ElementStart(name.clone()), start);
        self.open.push(name.clone());
        frames.push(Frame::Tag { name, start });
        Ok(())
    }

    /// Emit `ElementEnd` for the innermost open element.
    fn close_element(&mut self, name: String, start: usize) {
        self.push(TokenKind::ElementEnd(name), start);
        self.open.pop();
    }

    /// One attribute, or the end of the opening tag.
    fn step_tag(
        &mut self,
        name: String,
        start: usize,
        frames: &mut Vec<Frame>,
    ) -> Result<(), LexerError> {
        self.skip_whitespace();

        match self.peek() {
            None => Err(self.syntax_error(format!("Unterminated tag <{name}>"), start)),
            Some('/') if self.peek_next() == Some('>') => {
                let end_start = self.pos;
                self.advance();
                self.advance();
                self.close_element(name, end_start);
                Ok(())
            }
            Some('>') => {
                self.advance();
                frames.push(Frame::Children);
                Ok(())
            }
            Some('{') => {
                let attr_start = self.pos;
                self.advance();
                self.skip_whitespace();
                if !self.starts_with("...") {
                    return Err(self.syntax_error(
                        format!("Expected '...' in spread attribute of <{name}>"),
                        self.pos,
                    ));
                }
                self.pos += 3;
                self.push(TokenKind::AttributeName("...".into()), attr_start);
                frames.push(Frame::Tag { name, start });
                frames.push(Frame::Expression(ExpressionFrame::new(
                    attr_start,
                    Site::Attribute,
                    self.pos,
                )));
                Ok(())
            }
            Some(c) if is_name_start(c) => {
                let attr_start = self.pos;
                let attr = self.read_name();
                self.push(TokenKind::AttributeName(attr.clone()), attr_start);
                frames.push(Frame::Tag { name, start });

                self.skip_whitespace();
                if self.peek() == Some('=') {
                    self.advance();
                    self.skip_whitespace();
                    self.scan_attribute_value(&attr, frames)
                } else {
                    self.push(TokenKind::AttributeValue(AttrValue::Implicit), self.pos);
                    Ok(())
                }
            }
            Some(c) => Err(self.syntax_error(
                format!("Unexpected character '{c}' in <{name}> tag"),
                self.pos,
            )),
        }
    }

    fn scan_attribute_value(
        &mut self,
        attr: &str,
        frames: &mut Vec<Frame>,
    ) -> Result<(), LexerError> {
        let start = self.pos;

        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                let value_start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.advance();
                }
                if self.is_at_end() {
                    return Err(self.syntax_error(
                        format!("Unterminated value for attribute '{attr}'"),
                        start,
                    ));
                }
                let text = self.slice(value_start, self.pos);
                self.advance(); // consume closing quote
                self.push(TokenKind::AttributeValue(AttrValue::Quoted(text)), start);
                Ok(())
            }
            Some('{') => {
                self.advance();
                frames.push(Frame::Expression(ExpressionFrame::new(
                    start,
                    Site::Attribute,
                    self.pos,
                )));
                Ok(())
            }
            Some('<')
                if is_markup_start(
                    &self.chars[..self.pos],
                    &self.chars[self.pos..],
                    MarkupContext::Children,
                ) =>
            {
                self.open_element(frames)
            }
            _ => Err(self.syntax_error(
                format!("Expected a value after '=' for attribute '{attr}'"),
                start,
            )),
        }
    }

    /// Scan an expression container body up to its `}` or to nested markup.
    /// Without nested markup the container yields one token. With nested
    /// markup it yields `ChildExpressionOpen`, then the nested elements
    /// interleaved with `ChildExpression` text, then `ChildExpressionClose`.
    fn step_expression(
        &mut self,
        mut expr: ExpressionFrame,
        frames: &mut Vec<Frame>,
    ) -> Result<(), LexerError> {
        let segment_start = expr.segment_start.unwrap_or(self.pos);
        let stop = self.scan_script(&mut expr.braces, true)?;
        let text = self.slice(segment_start, self.pos);

        match stop {
            Stop::Brace => {
                self.advance(); // consume `}`
                if expr.split {
                    self.push(TokenKind::ChildExpressionClose(text), segment_start);
                } else {
                    let kind = match expr.site {
                        Site::Attribute => TokenKind::AttributeValue(AttrValue::Expression(text)),
                        Site::Child => TokenKind::ChildExpression(text),
                    };
                    self.push(kind, expr.open);
                }
                Ok(())
            }
            Stop::Markup => {
                if expr.split {
                    self.push(TokenKind::ChildExpression(text), segment_start);
                } else {
                    self.push(TokenKind::ChildExpressionOpen(text), expr.open);
                    expr.split = true;
                }
                expr.segment_start = None;
                frames.push(Frame::Expression(expr));
                self.open_element(frames)
            }
            Stop::End => Err(self.syntax_error("Unterminated expression container", expr.open)),
        }
    }

    /// One child: text, an expression container, a nested element or the
    /// closing tag. Reaching end of input with the element still open is not
    /// an error here; the parser reports it against the opening tag.
    fn step_children(&mut self, frames: &mut Vec<Frame>) -> Result<(), LexerError> {
        match self.peek() {
            None => {
                self.open.pop();
                Ok(())
            }
            Some('<') if is_closing_tag_start(&self.chars[self.pos..]) => {
                let start = self.pos;
                self.advance();
                self.advance();
                self.skip_whitespace();
                let name = self.read_name();
                self.skip_whitespace();
                if self.peek() != Some('>') {
                    return Err(self.syntax_error(
                        format!("Expected '>' to end closing tag </{name}>"),
                        self.pos,
                    ));
                }
                self.advance();
                self.close_element(name, start);
                Ok(())
            }
            Some('{') => {
                let open = self.pos;
                self.advance();
                frames.push(Frame::Children);
                frames.push(Frame::Expression(ExpressionFrame::new(
                    open,
                    Site::Child,
                    self.pos,
                )));
                Ok(())
            }
            Some('<') if self.at_child_markup() => {
                frames.push(Frame::Children);
                self.open_element(frames)
            }
            Some(_) => {
                let start = self.pos;
                self.advance();
                while let Some(c) = self.peek() {
                    if c == '{' || (c == '<' && self.at_child_markup()) {
                        break;
                    }
                    self.advance();
                }
                let text = self.slice(start, self.pos);
                let kind = if text.trim().is_empty() {
                    TokenKind::ChildWhitespace(text)
                } else {
                    TokenKind::ChildText(text)
                };
                self.push(kind, start);
                frames.push(Frame::Children);
                Ok(())
            }
        }
    }

    /// Is the `<` at the current position a nested or closing tag?
    fn at_child_markup(&self) -> bool {
        let rest = &self.chars[self.pos..];
        is_closing_tag_start(rest)
            || is_markup_start(&self.chars[..self.pos], rest, MarkupContext::Children)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.advance();
        }
        self.slice(start, self.pos)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.chars.get(self.pos + i) == Some(&c))
    }

    /// Push a token spanning from `start` to the current position.
    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens
            .push(Token::new(kind, Span::new(start, self.pos.max(start))));
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    /// Count one loop iteration against the default budget of one per input
    /// character.
    fn tick(&self, iterations: &mut usize) -> Result<(), LexerError> {
        self.tick_within(iterations, self.chars.len() + 1)
    }

    /// Count one loop iteration; fail once the loop has run more than
    /// `limit` times, which only a scanner bug can cause.
    fn tick_within(&self, iterations: &mut usize, limit: usize) -> Result<(), LexerError> {
        *iterations += 1;
        if *iterations > limit {
            return Err(LexerError::at(
                ErrorKind::LoopLimit,
                format!(
                    "Scanner loop exceeded {limit} iterations without finishing; the input could not be tokenized"
                ),
                self.source,
                self.pos,
            ));
        }
        Ok(())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn syntax_error(&self, message: impl Into<String>, offset: usize) -> LexerError {
        LexerError::at(ErrorKind::Syntax, message, self.source, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Helper: tokenize and return token kinds (ignoring spans).
    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn start(name: &str) -> TokenKind {
        TokenKind::ElementStart(name.into())
    }

    fn end(name: &str) -> TokenKind {
        TokenKind::ElementEnd(name.into())
    }

    fn attr(name: &str) -> TokenKind {
        TokenKind::AttributeName(name.into())
    }

    // =========================================================================
    // Script passthrough
    // =========================================================================

    #[test]
    fn test_empty_source() {
        assert!(kinds("").is_empty());
    }

    #[test]
    fn test_plain_script_is_one_raw_token() {
        assert_eq!(
            kinds("const a = b < c;"),
            vec![TokenKind::Raw("const a = b < c;".into())]
        );
    }

    #[test]
    fn test_markup_in_string_is_raw() {
        assert_eq!(
            kinds("const s = \"<div>\";"),
            vec![TokenKind::Raw("const s = \"<div>\";".into())]
        );
    }

    #[test]
    fn test_markup_in_template_literal_is_raw() {
        let source = "const s = `<b>${ {a: 1}.a }</b>`;";
        assert_eq!(kinds(source), vec![TokenKind::Raw(source.into())]);
    }

    #[test]
    fn test_markup_in_template_substitution() {
        assert_eq!(
            kinds("x = `${<b/>}`;"),
            vec![
                TokenKind::Raw("x = `${".into()),
                start("b"),
                end("b"),
                TokenKind::Raw("}`;".into()),
            ]
        );
    }

    #[test]
    fn test_nested_template_literals() {
        let source = "const s = `a ${`b ${c} <i>`} <p>`;";
        assert_eq!(kinds(source), vec![TokenKind::Raw(source.into())]);
    }

    #[test]
    fn test_markup_in_template_inside_expression() {
        assert_eq!(
            kinds("<A>{`${<b/>}`}</A>"),
            vec![
                start("A"),
                TokenKind::ChildExpressionOpen("`${".into()),
                start("b"),
                end("b"),
                TokenKind::ChildExpressionClose("}`".into()),
                end("A"),
            ]
        );
    }

    // =========================================================================
    // Elements and attributes
    // =========================================================================

    #[test]
    fn test_self_closing() {
        assert_eq!(
            kinds("x = <Foo/>;"),
            vec![
                TokenKind::Raw("x = ".into()),
                start("Foo"),
                end("Foo"),
                TokenKind::Raw(";".into()),
            ]
        );
    }

    #[test]
    fn test_text_child() {
        assert_eq!(
            kinds("<p>hello</p>"),
            vec![start("p"), TokenKind::ChildText("hello".into()), end("p")]
        );
    }

    #[test]
    fn test_quoted_attributes() {
        assert_eq!(
            kinds("<a href=\"/x\" title='t'/>"),
            vec![
                start("a"),
                attr("href"),
                TokenKind::AttributeValue(AttrValue::Quoted("/x".into())),
                attr("title"),
                TokenKind::AttributeValue(AttrValue::Quoted("t".into())),
                end("a"),
            ]
        );
    }

    #[test]
    fn test_expression_and_boolean_attributes() {
        assert_eq!(
            kinds("<input value={v} disabled data-x = \"1\"/>"),
            vec![
                start("input"),
                attr("value"),
                TokenKind::AttributeValue(AttrValue::Expression("v".into())),
                attr("disabled"),
                TokenKind::AttributeValue(AttrValue::Implicit),
                attr("data-x"),
                TokenKind::AttributeValue(AttrValue::Quoted("1".into())),
                end("input"),
            ]
        );
    }

    #[test]
    fn test_spread_attribute() {
        assert_eq!(
            kinds("<A {...props} />"),
            vec![
                start("A"),
                attr("..."),
                TokenKind::AttributeValue(AttrValue::Expression("props".into())),
                end("A"),
            ]
        );
    }

    #[test]
    fn test_attribute_expression_with_braces() {
        assert_eq!(
            kinds("<A style={{color: 'red'}}/>"),
            vec![
                start("A"),
                attr("style"),
                TokenKind::AttributeValue(AttrValue::Expression("{color: 'red'}".into())),
                end("A"),
            ]
        );
    }

    #[test]
    fn test_element_as_attribute_value() {
        assert_eq!(
            kinds("<A icon=<B/> />"),
            vec![start("A"), attr("icon"), start("B"), end("B"), end("A")]
        );
    }

    #[test]
    fn test_attribute_expression_with_markup() {
        assert_eq!(
            kinds("<A render={() => <B/>}/>"),
            vec![
                start("A"),
                attr("render"),
                TokenKind::ChildExpressionOpen("() => ".into()),
                start("B"),
                end("B"),
                TokenKind::ChildExpressionClose(String::new()),
                end("A"),
            ]
        );
    }

    #[test]
    fn test_fragment() {
        assert_eq!(
            kinds("<>x</>"),
            vec![start(""), TokenKind::ChildText("x".into()), end("")]
        );
    }

    #[test]
    fn test_member_tag_name() {
        assert_eq!(kinds("<UI.Button/>"), vec![start("UI.Button"), end("UI.Button")]);
    }

    // =========================================================================
    // Children
    // =========================================================================

    #[test]
    fn test_nested_elements() {
        assert_eq!(
            kinds("<A><B>x</B></A>"),
            vec![
                start("A"),
                start("B"),
                TokenKind::ChildText("x".into()),
                end("B"),
                end("A"),
            ]
        );
    }

    #[test]
    fn test_whitespace_child() {
        assert_eq!(
            kinds("<A>\n  <B/>\n</A>"),
            vec![
                start("A"),
                TokenKind::ChildWhitespace("\n  ".into()),
                start("B"),
                end("B"),
                TokenKind::ChildWhitespace("\n".into()),
                end("A"),
            ]
        );
    }

    #[test]
    fn test_expression_child() {
        assert_eq!(
            kinds("<p>Hi {name}!</p>"),
            vec![
                start("p"),
                TokenKind::ChildText("Hi ".into()),
                TokenKind::ChildExpression("name".into()),
                TokenKind::ChildText("!".into()),
                end("p"),
            ]
        );
    }

    #[test]
    fn test_guarded_child_is_split_around_markup() {
        assert_eq!(
            kinds("<A>{cond && <B/>}</A>"),
            vec![
                start("A"),
                TokenKind::ChildExpressionOpen("cond && ".into()),
                start("B"),
                end("B"),
                TokenKind::ChildExpressionClose(String::new()),
                end("A"),
            ]
        );
    }

    #[test]
    fn test_ternary_child_has_middle_segment() {
        assert_eq!(
            kinds("<A>{ok ? <B/> : <C/>}</A>"),
            vec![
                start("A"),
                TokenKind::ChildExpressionOpen("ok ? ".into()),
                start("B"),
                end("B"),
                TokenKind::ChildExpression(" : ".into()),
                start("C"),
                end("C"),
                TokenKind::ChildExpressionClose(String::new()),
                end("A"),
            ]
        );
    }

    #[test]
    fn test_map_with_block_body() {
        assert_eq!(
            kinds("<ul>{xs.map(x => { return <li>{x}</li>; })}</ul>"),
            vec![
                start("ul"),
                TokenKind::ChildExpressionOpen("xs.map(x => { return ".into()),
                start("li"),
                TokenKind::ChildExpression("x".into()),
                end("li"),
                TokenKind::ChildExpressionClose("; })".into()),
                end("ul"),
            ]
        );
    }

    #[test]
    fn test_markup_comment_leaves_empty_expression() {
        assert_eq!(
            kinds("<A>{/* c */}</A>"),
            vec![
                start("A"),
                TokenKind::ChildExpression("       ".into()),
                end("A"),
            ]
        );
    }

    #[test]
    fn test_less_than_in_text() {
        assert_eq!(
            kinds("<p>a < b</p>"),
            vec![start("p"), TokenKind::ChildText("a < b".into()), end("p")]
        );
    }

    #[test]
    fn test_mismatched_close_is_left_to_parser() {
        assert_eq!(
            kinds("<A><B></A>"),
            vec![start("A"), start("B"), end("A")]
        );
    }

    // =========================================================================
    // Spans
    // =========================================================================

    #[test]
    fn test_spans_are_character_offsets() {
        let tokens = Scanner::tokenize("é = <b/>").unwrap();
        assert_eq!(tokens[0].span, Span::new(0, 4));
        assert_eq!(tokens[1].span, Span::new(4, 6));
        assert_eq!(tokens[2].span, Span::new(6, 8));
    }

    // =========================================================================
    // Errors and limits
    // =========================================================================

    #[test]
    fn test_unterminated_tag() {
        let err = Scanner::tokenize("<A><B").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert!(err.message.contains("Unterminated tag <B>"));
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 3);
    }

    #[test]
    fn test_unterminated_expression() {
        let err = Scanner::tokenize("<A>{a + </A>").unwrap_err();
        assert!(err.message.contains("Unterminated expression"));
        assert_eq!(err.column, 3);
    }

    #[test]
    fn test_unexpected_character_in_tag() {
        let err = Scanner::tokenize("<A # />").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert!(err.message.contains("'#'"));
    }

    #[test]
    fn test_recursion_limit() {
        let source = "<a><a><a><a></a></a></a></a>";
        let stripped = strip(source);
        let err = Scanner::new(&stripped, source)
            .with_max_recursive_calls(3)
            .scan()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::RecursionLimit);
        assert!(err.message.contains("max_recursive_calls"));
        assert_eq!(err.column, 9);
    }

    #[test]
    fn test_recursion_limit_allows_exact_depth() {
        let source = "<a><a><a></a></a></a>";
        let stripped = strip(source);
        let tokens = Scanner::new(&stripped, source)
            .with_max_recursive_calls(3)
            .scan()
            .unwrap();
        assert_eq!(tokens.len(), 6);
    }

    #[test]
    fn test_loop_limit() {
        let source = "ab";
        let scanner = Scanner::new(source, source);
        let mut iterations = 0;
        for _ in 0..3 {
            scanner.tick(&mut iterations).unwrap();
        }
        let err = scanner.tick(&mut iterations).unwrap_err();
        assert_eq!(err.kind, ErrorKind::LoopLimit);
        assert_eq!(
            err.message,
            "Scanner loop exceeded 3 iterations without finishing; the input could not be tokenized"
        );
        assert_eq!((err.line, err.column), (1, 0));
    }

    #[test]
    fn test_fragment_chain_within_markup_budget() {
        // Unclosed fragments close at end of input without consuming text.
        let tokens = Scanner::tokenize("<><><><>").unwrap();
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn test_deep_nesting_uses_no_call_stack() {
        let depth = 20_000;
        let source = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        let tokens = std::thread::spawn(move || {
            let stripped = strip(&source);
            Scanner::new(&stripped, &source)
                .with_max_recursive_calls(depth)
                .scan()
                .map(|tokens| tokens.len())
        })
        .join()
        .unwrap()
        .unwrap();
        assert_eq!(tokens, 2 * depth);
    }

    #[test]
    fn test_start_and_end_counts_balance() {
        let tokens = Scanner::tokenize("f(<A x={<B/>}><C>{y && <D/>}</C></A>, <E/>)").unwrap();
        let starts = tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::ElementStart(_)))
            .count();
        let ends = tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::ElementEnd(_)))
            .count();
        assert_eq!(starts, 5);
        assert_eq!(ends, 5);
    }
}
