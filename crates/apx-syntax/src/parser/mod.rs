mod attribute;
mod signature;

pub use attribute::{parse_literal, parse_port_attributes, parse_type_attributes};
pub use signature::parse_signature;

use crate::lexer::{Token, TokenKind};
use miette::SourceSpan;

/// Hand-rolled cursor over the token stream, shared by the signature and
/// attribute grammars.
pub(crate) struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self {
            src,
            tokens: crate::lexer::lex(src),
            pos: 0,
        }
    }

    pub(crate) fn src(&self) -> &'a str {
        self.src
    }

    /// Peek at the current token without consuming it.
    pub(crate) fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    pub(crate) fn peek_is(&self, kind: TokenKind) -> bool {
        matches!(self.peek(), Some(t) if t.kind == kind)
    }

    /// Consume and return the current token.
    pub(crate) fn next(&mut self) -> Option<Token<'a>> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Zero-length span just past the last character.
    pub(crate) fn end_span(&self) -> SourceSpan {
        SourceSpan::new(self.src.len().into(), 0)
    }

    /// Span from the start of `first` to the end of the previously consumed token.
    pub(crate) fn span_since(&self, first: Token<'a>) -> SourceSpan {
        let start = first.span.offset();
        let end = match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(last) => last.span.offset() + last.span.len(),
            None => start + first.span.len(),
        };
        SourceSpan::new(start.into(), end.saturating_sub(start))
    }

    /// Expect the next token to be of a specific kind. On mismatch the caller's
    /// error constructor receives a message and the offending span.
    pub(crate) fn expect<E>(
        &mut self,
        expected: TokenKind,
        what: &str,
        error: impl FnOnce(String, SourceSpan) -> E,
    ) -> Result<Token<'a>, E> {
        match self.next() {
            Some(t) if t.kind == expected => Ok(t),
            Some(t) => Err(error(format!("expected {}, found `{}`", what, t.lexeme), t.span)),
            None => Err(error(
                format!("unexpected end of input; expected {}", what),
                self.end_span(),
            )),
        }
    }
}
